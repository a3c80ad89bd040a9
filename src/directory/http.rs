//! HTTP transport for the lifecycle-manager protocol.
//!
//! # Responsibilities
//! - Issue GET/POST/PUT/DELETE requests with JSON bodies
//! - Treat 4xx/5xx statuses as failures
//! - Unwrap "rest-quick" envelopes (`kitVersion` / `status` / `result`)
//! - Implement [`DirectoryClient`] on top of the above

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::config::schema::DirectoryCoordinates;
use crate::directory::client::DirectoryClient;
use crate::directory::types::{AgentRecord, DirectoryError, DirectoryResult, STATUS_RESPONSIVE};

/// reqwest-backed directory and service transport.
#[derive(Debug, Clone)]
pub struct HttpDirectory {
    client: Client,
}

impl HttpDirectory {
    /// Create a transport whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> DirectoryResult<Self> {
        let client = Client::builder().timeout(timeout).no_proxy().build()?;
        Ok(Self { client })
    }

    /// Issue `method` on `url`, returning the unwrapped JSON result.
    pub async fn request(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
    ) -> DirectoryResult<Value> {
        tracing::trace!(method = %method, url = %url, "Directory request");

        let mut builder = self.client.request(method, url);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_client_error() || status.is_server_error() {
            let body = if text.is_empty() {
                format!("Status code {}", status.as_u16())
            } else {
                text
            };
            return Err(DirectoryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        unwrap_envelope(parse_body(&text))
    }

    pub fn query_url(directory: &DirectoryCoordinates, service_type: &str) -> DirectoryResult<Url> {
        let mut url = Url::parse(&format!("{}/query/", directory.base_url()))?;
        url.query_pairs_mut()
            .append_pair("serviceType", service_type)
            .append_pair("status", STATUS_RESPONSIVE);
        Ok(url)
    }

    pub fn action_url(directory: &DirectoryCoordinates, action: &str) -> DirectoryResult<Url> {
        Ok(Url::parse(&format!("{}/{}", directory.base_url(), action))?)
    }
}

#[async_trait]
impl DirectoryClient for HttpDirectory {
    async fn query(
        &self,
        directory: &DirectoryCoordinates,
        service_type: &str,
    ) -> DirectoryResult<Vec<AgentRecord>> {
        let url = Self::query_url(directory, service_type)?;
        let body = self.request(Method::GET, url, None).await?;
        serde_json::from_value(body).map_err(|e| DirectoryError::Decode(e.to_string()))
    }

    async fn post_action(
        &self,
        directory: &DirectoryCoordinates,
        action: &str,
        payload: &Value,
    ) -> DirectoryResult<Value> {
        let url = Self::action_url(directory, action)?;
        self.request(Method::POST, url, Some(payload)).await
    }
}

/// Empty bodies become `null`, non-JSON bodies a JSON string.
fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Strip a rest-quick envelope, failing when it reports `status: failed`.
///
/// Documents without `kitVersion` pass through untouched.
pub fn unwrap_envelope(doc: Value) -> DirectoryResult<Value> {
    let Value::Object(mut map) = doc else {
        return Ok(doc);
    };
    if !map.contains_key("kitVersion") {
        return Ok(Value::Object(map));
    }

    let failed = map
        .get("status")
        .and_then(Value::as_str)
        .is_some_and(|s| s.eq_ignore_ascii_case("failed"));
    if failed {
        let explanation = map
            .get("explanation")
            .and_then(Value::as_str)
            .unwrap_or("unknown failure")
            .to_string();
        return Err(DirectoryError::Envelope(explanation));
    }

    Ok(map.remove("result").unwrap_or(Value::Null))
}
