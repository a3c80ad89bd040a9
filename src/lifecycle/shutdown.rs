//! Shutdown coordination.
//!
//! # Responsibilities
//! - Broadcast a shutdown signal to long-running tasks ([`Shutdown`])
//! - Notify the lifecycle manager that this instance is stopping
//! - Race a soft close against a hard deadline ([`Terminator`])
//!
//! ```text
//! NotifyingStopping → Racing { soft timer → server.close() , hard timer } → Done(reason)
//! ```
//!
//! The loser of the race is not cancelled; the [`CompletionLatch`] makes
//! sure only the winner is reported.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, oneshot};

use crate::config::schema::ShutdownConfig;
use crate::observability::metrics;
use crate::registration::Registrar;

/// Coordinator for graceful shutdown.
///
/// Provides a broadcast channel that all long-running tasks can subscribe to.
#[derive(Debug)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Number of tasks still listening.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// A server that can stop accepting work and drain what is in flight.
#[async_trait]
pub trait GracefulServer: Send + Sync {
    /// Resolves once the server has closed.
    async fn close(&self);
}

/// Which path ended the shutdown race.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    Soft,
    Forced,
}

impl ShutdownReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShutdownReason::Soft => "Soft shutdown",
            ShutdownReason::Forced => "Forced shutdown",
        }
    }
}

impl std::fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("hard shutdown deadline {hard:?} must exceed soft deadline {soft:?}")]
pub struct DeadlineError {
    pub soft: Duration,
    pub hard: Duration,
}

/// Soft and hard shutdown delays, `hard > soft`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownDeadlines {
    soft: Duration,
    hard: Duration,
}

impl ShutdownDeadlines {
    pub fn new(soft: Duration, hard: Duration) -> Result<Self, DeadlineError> {
        if hard <= soft {
            return Err(DeadlineError { soft, hard });
        }
        Ok(Self { soft, hard })
    }

    pub fn from_config(config: &ShutdownConfig) -> Result<Self, DeadlineError> {
        Self::new(
            Duration::from_millis(config.soft_deadline_ms),
            Duration::from_millis(config.hard_deadline_ms),
        )
    }

    pub fn soft(&self) -> Duration {
        self.soft
    }

    pub fn hard(&self) -> Duration {
        self.hard
    }
}

impl Default for ShutdownDeadlines {
    fn default() -> Self {
        Self {
            soft: Duration::from_millis(2000),
            hard: Duration::from_millis(4000),
        }
    }
}

type Completion<T> = Box<dyn FnOnce(T) + Send>;

/// Runs a completion callback at most once, for whichever caller gets there first.
pub struct CompletionLatch<T> {
    done: Mutex<Option<Completion<T>>>,
}

impl<T> CompletionLatch<T> {
    pub fn new<F>(on_done: F) -> Self
    where
        F: FnOnce(T) + Send + 'static,
    {
        Self {
            done: Mutex::new(Some(Box::new(on_done))),
        }
    }

    /// Complete with `value`. Returns false if already completed.
    pub fn complete(&self, value: T) -> bool {
        let callback = match self.done.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        match callback {
            Some(callback) => {
                callback(value);
                true
            }
            None => false,
        }
    }

    pub fn is_completed(&self) -> bool {
        match self.done.lock() {
            Ok(guard) => guard.is_none(),
            Err(poisoned) => poisoned.into_inner().is_none(),
        }
    }
}

/// Graceful terminator: stopping notification, then the soft/hard race.
#[derive(Clone)]
pub struct Terminator {
    registrar: Registrar,
    deadlines: ShutdownDeadlines,
}

impl Terminator {
    pub fn new(registrar: Registrar, deadlines: ShutdownDeadlines) -> Self {
        Self {
            registrar,
            deadlines,
        }
    }

    pub fn deadlines(&self) -> ShutdownDeadlines {
        self.deadlines
    }

    /// Notify stopping, arm both timers, and call `on_done` exactly once.
    ///
    /// Returns as soon as the timers are armed. `deadlines` overrides the
    /// configured ones for this call.
    pub async fn terminate_with<F>(
        &self,
        server: Arc<dyn GracefulServer>,
        deadlines: Option<ShutdownDeadlines>,
        on_done: F,
    ) where
        F: FnOnce(ShutdownReason) + Send + 'static,
    {
        let deadlines = deadlines.unwrap_or(self.deadlines);

        // Outcome already logged by the registrar.
        let _ = self.registrar.notify_stopping().await;

        let latch = Arc::new(CompletionLatch::new(move |reason: ShutdownReason| {
            tracing::info!(reason = %reason, "Shutdown complete");
            metrics::record_shutdown(reason.as_str());
            on_done(reason);
        }));

        tracing::info!(
            soft_ms = deadlines.soft.as_millis() as u64,
            hard_ms = deadlines.hard.as_millis() as u64,
            "Shutdown timers armed"
        );

        let soft_latch = latch.clone();
        tokio::spawn(async move {
            tokio::time::sleep(deadlines.soft).await;
            tracing::info!("Soft deadline reached, closing server");
            server.close().await;
            if !soft_latch.complete(ShutdownReason::Soft) {
                tracing::debug!("Server closed after forced shutdown");
            }
        });

        tokio::spawn(async move {
            tokio::time::sleep(deadlines.hard).await;
            if latch.complete(ShutdownReason::Forced) {
                tracing::warn!("Hard deadline reached before server closed");
            }
        });
    }

    /// [`Self::terminate_with`], awaiting the winning reason.
    pub async fn terminate(
        &self,
        server: Arc<dyn GracefulServer>,
        deadlines: Option<ShutdownDeadlines>,
    ) -> ShutdownReason {
        let (tx, rx) = oneshot::channel();
        self.terminate_with(server, deadlines, move |reason| {
            let _ = tx.send(reason);
        })
        .await;
        // The hard timer always completes the latch; a dropped sender means the runtime is going away.
        rx.await.unwrap_or(ShutdownReason::Forced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_deadlines_order() {
        assert!(ShutdownDeadlines::new(Duration::from_millis(50), Duration::from_millis(1000)).is_ok());
        let err = ShutdownDeadlines::new(Duration::from_millis(100), Duration::from_millis(100)).unwrap_err();
        assert_eq!(err.soft, Duration::from_millis(100));

        let defaults = ShutdownDeadlines::default();
        assert_eq!(defaults.soft(), Duration::from_millis(2000));
        assert_eq!(defaults.hard(), Duration::from_millis(4000));
        assert_eq!(
            ShutdownDeadlines::from_config(&ShutdownConfig::default()).unwrap(),
            defaults
        );
    }

    #[test]
    fn test_latch_completes_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let latch = CompletionLatch::new(move |v: u32| {
            c.fetch_add(v as usize, Ordering::SeqCst);
        });

        assert!(!latch.is_completed());
        assert!(latch.complete(5));
        assert!(!latch.complete(7));
        assert!(latch.is_completed());
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_shutdown_broadcast() {
        let shutdown = Shutdown::new();
        let mut rx = shutdown.subscribe();
        assert_eq!(shutdown.receiver_count(), 1);
        shutdown.trigger();
        assert!(rx.recv().await.is_ok());
    }

    #[test]
    fn test_reason_strings() {
        assert_eq!(ShutdownReason::Soft.to_string(), "Soft shutdown");
        assert_eq!(ShutdownReason::Forced.as_str(), "Forced shutdown");
    }
}
