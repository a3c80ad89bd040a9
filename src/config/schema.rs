//! Configuration schema definitions.
//!
//! This module defines the agent's own settings (how it talks to the
//! lifecycle manager, caches, shuts down). The registration identity itself
//! lives in the static JSON sources, see [`crate::config::sources`].

use serde::{Deserialize, Deserializer, Serialize};

/// Root configuration for a discovery agent.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AgentConfig {
    /// Default lifecycle-manager coordinates.
    pub directory: DirectoryConfig,

    /// Endpoint resolution settings.
    pub discovery: DiscoveryConfig,

    /// Where static registration data is read from.
    pub registration: RegistrationConfig,

    /// Graceful shutdown deadlines.
    pub shutdown: ShutdownConfig,

    /// Listener for the agent's own routes.
    pub listener: ListenerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Host and port of a lifecycle-manager directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DirectoryCoordinates {
    pub host: String,

    /// Accepts both `3000` and `"3000"`; manual routes hand ports over as strings.
    #[serde(deserialize_with = "deserialize_port")]
    pub port: u16,
}

impl DirectoryCoordinates {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Base URL without a trailing slash, e.g. `http://lcm:3000`.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl std::fmt::Display for DirectoryCoordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

pub(crate) fn deserialize_port<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(u16),
        Text(String),
    }

    match Port::deserialize(deserializer)? {
        Port::Number(port) => Ok(port),
        Port::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Default directory coordinates, used when static registration data names none.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// Shared coordinates used for both discovery and registration.
    pub lc_manager: Option<DirectoryCoordinates>,

    /// Discovery directory; takes precedence over `lc_manager`.
    pub discover: Option<DirectoryCoordinates>,

    /// Registration directory; takes precedence over `lc_manager`.
    pub register: Option<DirectoryCoordinates>,
}

impl DirectoryConfig {
    pub fn discover_coordinates(&self) -> Option<DirectoryCoordinates> {
        self.discover.clone().or_else(|| self.lc_manager.clone())
    }

    pub fn register_coordinates(&self) -> Option<DirectoryCoordinates> {
        self.register.clone().or_else(|| self.lc_manager.clone())
    }
}

/// Instance selection policy applied to a directory query result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    #[default]
    FirstMatch,
    RoundRobin,
    Random,
}

/// Endpoint resolution configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Cache resolved endpoints per service type.
    pub cache_enabled: bool,

    /// Optional lifetime of a cache entry. `None` keeps entries forever.
    pub cache_ttl_secs: Option<u64>,

    /// Which responsive instance to pick.
    pub selection: SelectionPolicy,

    /// Timeout for a single directory request.
    pub request_timeout_secs: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            cache_enabled: false,
            cache_ttl_secs: None,
            selection: SelectionPolicy::FirstMatch,
            request_timeout_secs: 10,
        }
    }
}

/// Static registration source configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RegistrationConfig {
    /// Primary JSON file, relative to the launch directory.
    pub primary_source: String,

    /// Fallback JSON file when the primary is absent or empty.
    pub secondary_source: String,

    /// Object key holding the registration data inside each file.
    pub section: String,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            primary_source: "appSettings.json".to_string(),
            secondary_source: "package.json".to_string(),
            section: "register".to_string(),
        }
    }
}

/// Shutdown deadlines.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Delay before the server is asked to drain and close.
    pub soft_deadline_ms: u64,

    /// Delay after which shutdown is forced regardless of the soft path.
    pub hard_deadline_ms: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            soft_deadline_ms: 2000,
            hard_deadline_ms: 4000,
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_filter: String,

    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "agent_discovery=info,tower_http=info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AgentConfig::default();
        assert!(!config.discovery.cache_enabled);
        assert_eq!(config.discovery.selection, SelectionPolicy::FirstMatch);
        assert_eq!(config.shutdown.soft_deadline_ms, 2000);
        assert_eq!(config.shutdown.hard_deadline_ms, 4000);
        assert_eq!(config.registration.primary_source, "appSettings.json");
        assert!(config.directory.discover_coordinates().is_none());
    }

    #[test]
    fn test_port_accepts_string() {
        let coords: DirectoryCoordinates =
            serde_json::from_str(r#"{"host":"lcm","port":"3000"}"#).unwrap();
        assert_eq!(coords, DirectoryCoordinates::new("lcm", 3000));
        assert_eq!(coords.base_url(), "http://lcm:3000");
    }

    #[test]
    fn test_lc_manager_fallback() {
        let toml_str = r#"
            [directory.lc_manager]
            host = "shared"
            port = 3000

            [directory.register]
            host = "reg"
            port = 3100

            [discovery]
            selection = "round_robin"
        "#;
        let config: AgentConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.directory.discover_coordinates(),
            Some(DirectoryCoordinates::new("shared", 3000))
        );
        assert_eq!(
            config.directory.register_coordinates(),
            Some(DirectoryCoordinates::new("reg", 3100))
        );
        assert_eq!(config.discovery.selection, SelectionPolicy::RoundRobin);
    }
}
