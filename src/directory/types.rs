//! Directory wire types and error definitions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::sources::JsonObject;

/// Status a directory query filters on.
pub const STATUS_RESPONSIVE: &str = "responsive";

/// One instance record returned by a directory query.
///
/// Only `host` and `port` are interpreted; everything else the lifecycle
/// manager reports is kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRecord {
    pub host: String,

    #[serde(deserialize_with = "crate::config::schema::deserialize_port")]
    pub port: u16,

    #[serde(flatten)]
    pub extra: JsonObject,
}

impl AgentRecord {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            extra: JsonObject::new(),
        }
    }
}

/// Errors raised by the directory transport.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Connection failed, timed out, or the request could not be sent.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The peer answered with a 4xx/5xx status.
    #[error("status code {status}: {body}")]
    Status { status: u16, body: String },

    /// A response envelope reported failure.
    #[error("request failed: {0}")]
    Envelope(String),

    /// The body did not have the expected shape.
    #[error("malformed response: {0}")]
    Decode(String),

    /// The request URL could not be built.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}

/// Result type for directory operations.
pub type DirectoryResult<T> = Result<T, DirectoryError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_keeps_extra_fields() {
        let record: AgentRecord = serde_json::from_value(json!({
            "host": "10.0.0.5",
            "port": "4100",
            "serviceType": "db",
            "status": "responsive"
        }))
        .unwrap();
        assert_eq!(record.host, "10.0.0.5");
        assert_eq!(record.port, 4100);
        assert_eq!(record.extra.get("serviceType"), Some(&json!("db")));
    }

    #[test]
    fn test_error_display() {
        let err = DirectoryError::Status {
            status: 503,
            body: "down".into(),
        };
        assert_eq!(err.to_string(), "status code 503: down");
    }
}
