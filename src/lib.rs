//! Service discovery and lifecycle agent.
//!
//! Resolves service types to endpoints through a lifecycle-manager directory,
//! registers this instance with it, verifies required dependencies at startup
//! and terminates gracefully on request.

// Core subsystems
pub mod agent;
pub mod config;
pub mod context;
pub mod directory;
pub mod discovery;
pub mod registration;

// Process surface
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use agent::{Agent, AgentError};
pub use config::schema::AgentConfig;
pub use context::DiscoveryContext;
pub use discovery::{DiscoveryError, ServiceEndpoint};
pub use lifecycle::{Shutdown, ShutdownReason};
pub use registration::RuntimeData;
