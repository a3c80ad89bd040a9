//! Registration subsystem.
//!
//! # Data Flow
//! ```text
//! register(runtime) / unregister(runtime?) / notify_stopping()
//!     → registrar.rs (remember last runtime data)
//!     → payload.rs (static < env < runtime < derived)
//!     → DiscoveryContext (resolved coordinates persisted)
//!     → DirectoryClient::post_action(register | unregister | stopping)
//! ```
//!
//! # Design Decisions
//! - One primitive, parameterized by the action's path suffix
//! - Payload rebuilt on every action; only runtime data is remembered

pub mod payload;
pub mod registrar;
pub mod types;

pub use payload::RegistrationDataBuilder;
pub use registrar::Registrar;
pub use types::{RegistrationAction, RegistrationError, RegistrationPayload, RuntimeData};
