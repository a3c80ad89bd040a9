//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! agent settings (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AgentConfig (validated, immutable)
//!
//! static registration data (JSON: appSettings.json, package.json)
//!     → sources.rs (primary, then secondary `register` section)
//!     → registration::payload (merged with env overlay and runtime data)
//!
//! process environment (+ .env)
//!     → env.rs (Environment snapshot)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Environment is snapshotted once; nothing else reads `std::env`

pub mod env;
pub mod loader;
pub mod schema;
pub mod sources;
pub mod validation;

pub use env::Environment;
pub use loader::{load_config, ConfigError};
pub use schema::{AgentConfig, DirectoryCoordinates, SelectionPolicy};
pub use sources::{InlineSource, JsonFileSource, JsonObject, RegistrationSource, StaticSources};
