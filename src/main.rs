//! Discovery agent
//!
//! Runs the agent as a standalone process.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌──────────────────────────────────────────────────────┐
//!                  │                   DISCOVERY AGENT                    │
//!                  │                                                      │
//!   /test          │  ┌─────────┐   ┌──────────────────────────────────┐  │
//!   /manual*  ─────┼─▶│  http   │──▶│              Agent               │  │
//!   /terminate     │  │ routes  │   │  resolver · checker · registrar  │  │
//!                  │  └─────────┘   │  initializer · terminator        │  │
//!                  │                └───────────────┬──────────────────┘  │
//!                  │                                │                     │
//!                  │                  ┌─────────────▼──────────────┐      │
//!                  │                  │  DirectoryClient (reqwest) │──────┼──▶ Lifecycle
//!                  │                  └────────────────────────────┘      │     Manager
//!                  │                                                      │
//!                  │  config · context · lifecycle · observability        │
//!                  └──────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use agent_discovery::config::{load_config, AgentConfig};
use agent_discovery::http::{router, AppState, ServerHandle};
use agent_discovery::lifecycle::{exit_on_fatal, signals};
use agent_discovery::observability::{logging, metrics};
use agent_discovery::{Agent, RuntimeData};

#[derive(Parser)]
#[command(name = "agent-discovery")]
#[command(about = "Service discovery and lifecycle agent", long_about = None)]
struct Cli {
    /// Agent settings file (TOML)
    #[arg(short, long, env = "AGENT_DISCOVERY_CONFIG")]
    config: Option<PathBuf>,

    /// Service type that must be discoverable before registering (repeatable)
    #[arg(short, long = "require")]
    require: Vec<String>,

    /// Override the listener bind address
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                logging::init_logging(&AgentConfig::default().observability.log_filter);
                exit_on_fatal(&e);
            }
        },
        None => AgentConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability.log_filter);
    tracing::info!("agent-discovery v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        discover = ?config.directory.discover_coordinates(),
        register = ?config.directory.register_coordinates(),
        cache_enabled = config.discovery.cache_enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let agent = match Agent::new(&config) {
        Ok(agent) => agent,
        Err(e) => exit_on_fatal(&e),
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = Arc::new(ServerHandle::new());
    let state = AppState::new(agent.clone(), server.clone());
    let terminated = state.terminated.clone();
    let local_addr = server.serve(listener, router(state)).await?;

    let mut runtime_data = RuntimeData::with_port(local_addr.port());
    if !cli.require.is_empty() {
        runtime_data.insert("requiredAgents", cli.require);
    }
    let report = agent.initialize_or_exit(runtime_data).await;
    tracing::info!(found = report.found.len(), "Agent initialized");

    tokio::select! {
        _ = terminated.notified() => {
            // Let the /terminate response reach the caller.
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        _ = signals::wait_for_signal() => {
            let reason = agent.terminate(server, None).await;
            tracing::info!(reason = %reason, "Terminated by signal");
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
