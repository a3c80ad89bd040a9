//! Discovery types and error definitions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::directory::types::AgentRecord;

/// A connectable address of one service instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceEndpoint {
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl ServiceEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            path: String::new(),
        }
    }

    /// `http://host:port` followed by `path`, which should start with `/`.
    pub fn url(&self, path: &str) -> String {
        let mut url = format!("http://{}", self.host);
        if self.port != 0 {
            url.push_str(&format!(":{}", self.port));
        }
        url.push_str(path);
        url
    }
}

impl From<&AgentRecord> for ServiceEndpoint {
    fn from(record: &AgentRecord) -> Self {
        Self::new(record.host.clone(), record.port)
    }
}

impl std::fmt::Display for ServiceEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}{}", self.host, self.port, self.path)
    }
}

/// Errors from resolving a service type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscoveryError {
    /// The directory knows no responsive instance of the type.
    #[error("could not find agent matching criteria (serviceType = {service_type})")]
    NotFound { service_type: String },

    /// The directory was unreachable or answered with garbage.
    #[error("invalid response from lifecycle manager: {0}")]
    Directory(String),

    /// No discovery coordinates have been configured yet.
    #[error("lifecycle manager discover coordinates are not set")]
    NoDirectory,
}

/// Result type for discovery operations.
pub type DiscoveryResult<T> = Result<T, DiscoveryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url() {
        let ep = ServiceEndpoint::new("10.0.0.1", 4100);
        assert_eq!(ep.url("/items?id=3"), "http://10.0.0.1:4100/items?id=3");
        assert_eq!(ep.url(""), "http://10.0.0.1:4100");
        assert!(ep.path.is_empty());
    }

    #[test]
    fn test_error_display() {
        let err = DiscoveryError::NotFound {
            service_type: "db".into(),
        };
        assert_eq!(
            err.to_string(),
            "could not find agent matching criteria (serviceType = db)"
        );
    }
}
