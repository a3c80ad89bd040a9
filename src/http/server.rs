//! HTTP server lifecycle.
//!
//! # Responsibilities
//! - Serve an Axum router on a bound listener
//! - Stop accepting on shutdown and drain in-flight requests
//! - Expose the drain as [`GracefulServer::close`]

use async_trait::async_trait;
use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::lifecycle::{GracefulServer, Shutdown};

/// Handle to a running (or not yet started) server.
///
/// Created before the router so routes can hold it; started with [`Self::serve`].
#[derive(Default)]
pub struct ServerHandle {
    shutdown: Shutdown,
    task: Mutex<Option<JoinHandle<()>>>,
    local_addr: std::sync::OnceLock<SocketAddr>,
}

impl ServerHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr.get().copied()
    }

    /// Start serving `router` on `listener` in a background task.
    pub async fn serve(&self, listener: TcpListener, router: Router) -> std::io::Result<SocketAddr> {
        let addr = listener.local_addr()?;
        let _ = self.local_addr.set(addr);
        tracing::info!(address = %addr, "HTTP server starting");

        let mut shutdown_rx = self.shutdown.subscribe();
        let task = tokio::spawn(async move {
            let result = axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.recv().await;
                })
                .await;
            match result {
                Ok(()) => tracing::info!("HTTP server stopped"),
                Err(e) => tracing::error!(error = %e, "HTTP server failed"),
            }
        });

        *self.task.lock().await = Some(task);
        Ok(addr)
    }
}

#[async_trait]
impl GracefulServer for ServerHandle {
    async fn close(&self) {
        self.shutdown.trigger();
        let task = self.task.lock().await.take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "HTTP server task panicked");
            }
        }
    }
}
