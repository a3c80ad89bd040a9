//! Discovery subsystem.
//!
//! # Data Flow
//! ```text
//! resolve(service_type)
//!     → cache.rs (hit? return without a network call)
//!     → DirectoryClient::query(discover coordinates, service_type)
//!     → selection.rs (first-match / round-robin / random)
//!     → ServiceEndpoint (cached when enabled)
//!
//! check_all(required)
//!     → resolve each concurrently (dependencies.rs)
//!     → DependencyReport { missing, found } once all have settled
//! ```
//!
//! # Design Decisions
//! - First-match is the default selection; other policies are opt-in
//! - Cache is off by default and never expires unless a TTL is configured
//! - Any resolution failure counts as "missing" for dependency checks

pub mod cache;
pub mod dependencies;
pub mod resolver;
pub mod selection;
pub mod types;

pub use cache::EndpointCache;
pub use dependencies::{DependencyChecker, DependencyReport};
pub use resolver::EndpointResolver;
pub use selection::{FirstMatch, Random, RoundRobin, SelectionStrategy};
pub use types::{DiscoveryError, DiscoveryResult, ServiceEndpoint};
