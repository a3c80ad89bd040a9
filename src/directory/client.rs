//! The directory client seam.

use async_trait::async_trait;
use serde_json::Value;

use crate::config::schema::DirectoryCoordinates;
use crate::directory::types::{AgentRecord, DirectoryResult};

/// Operations the agent needs from a lifecycle manager.
///
/// [`crate::directory::HttpDirectory`] speaks HTTP; tests substitute
/// in-memory implementations.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// Responsive instances of `service_type`, in directory order.
    async fn query(
        &self,
        directory: &DirectoryCoordinates,
        service_type: &str,
    ) -> DirectoryResult<Vec<AgentRecord>>;

    /// POST `payload` to `/{action}` (`register`, `unregister`, `stopping`).
    async fn post_action(
        &self,
        directory: &DirectoryCoordinates,
        action: &str,
        payload: &Value,
    ) -> DirectoryResult<Value>;
}
