//! HTTP surface of the agent.
//!
//! # Data Flow
//! ```text
//! Inbound:
//!     TCP listener
//!         → server.rs (Axum serve, graceful drain on close)
//!         → routes.rs (/test, /manualRegister, /manualUnregister, /terminate)
//!
//! Outbound:
//!     client.rs: service type → resolver → endpoint.url(path) → envelope-unwrapped JSON
//! ```

pub mod client;
pub mod routes;
pub mod server;

pub use client::{ServiceCallError, ServiceClient};
pub use routes::{router, AppState};
pub use server::ServerHandle;
