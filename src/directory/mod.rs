//! Lifecycle-manager directory transport.
//!
//! # Data Flow
//! ```text
//! discovery::resolver ──query──▶ DirectoryClient ──GET /query/?serviceType=..&status=responsive──▶ LCM
//! registration::registrar ──post_action──▶ DirectoryClient ──POST /{register|unregister|stopping}──▶ LCM
//! ```
//!
//! # Design Decisions
//! - Transport is a trait so the core runs against in-memory directories in tests
//! - Envelope unwrapping happens once, here; callers see plain JSON results
//! - Requests carry a timeout so a silent directory still settles

pub mod client;
pub mod http;
pub mod types;

pub use client::DirectoryClient;
pub use http::HttpDirectory;
pub use types::{AgentRecord, DirectoryError, DirectoryResult};
