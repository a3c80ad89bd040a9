//! Registration types and error definitions.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::config::loader::ConfigError;
use crate::config::schema::DirectoryCoordinates;
use crate::config::sources::{string_list, JsonObject, REQUIRED_AGENTS};
use crate::directory::types::DirectoryError;

pub const LC_MANAGER: &str = "lcManager";
pub const LC_MANAGER_DISCOVER: &str = "lcManagerDiscover";
pub const LC_MANAGER_REGISTER: &str = "lcManagerRegister";

/// Per-call data supplied by the embedding application, e.g. its port.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuntimeData(JsonObject);

impl RuntimeData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_port(port: u16) -> Self {
        Self::new().with("port", port)
    }

    /// Builder-style insert.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// `port` as a number, accepting numeric strings.
    pub fn port(&self) -> Option<u16> {
        match self.0.get("port")? {
            Value::Number(n) => n.as_u64().and_then(|p| u16::try_from(p).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// `requiredAgents`, when the application supplied one.
    pub fn required_agents(&self) -> Option<Vec<String>> {
        self.0.get(REQUIRED_AGENTS).map(string_list)
    }

    /// Attach a coordinate override for this call only.
    pub fn with_register_coordinates(self, coords: &DirectoryCoordinates) -> Self {
        self.with(LC_MANAGER_REGISTER, serde_json::json!({"host": coords.host, "port": coords.port}))
    }

    pub fn as_object(&self) -> &JsonObject {
        &self.0
    }
}

impl From<JsonObject> for RuntimeData {
    fn from(map: JsonObject) -> Self {
        Self(map)
    }
}

/// The merged record posted to the lifecycle manager.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistrationPayload(JsonObject);

impl RegistrationPayload {
    pub(crate) fn from_object(map: JsonObject) -> Self {
        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_object(&self) -> &JsonObject {
        &self.0
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    /// Parsed `lcManagerDiscover` field.
    pub fn discover_coordinates(&self) -> Option<DirectoryCoordinates> {
        self.coordinates(LC_MANAGER_DISCOVER).and_then(Result::ok)
    }

    /// Parsed `lcManagerRegister` field.
    pub fn register_coordinates(&self) -> Option<DirectoryCoordinates> {
        self.coordinates(LC_MANAGER_REGISTER).and_then(Result::ok)
    }

    pub(crate) fn coordinates(
        &self,
        key: &str,
    ) -> Option<Result<DirectoryCoordinates, serde_json::Error>> {
        self.0
            .get(key)
            .filter(|v| !v.is_null())
            .map(|v| serde_json::from_value(v.clone()))
    }
}

/// The three registration notifications, distinguished only by path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistrationAction {
    Register,
    Unregister,
    Stopping,
}

impl RegistrationAction {
    /// Path suffix on the registration directory.
    pub fn path(&self) -> &'static str {
        match self {
            RegistrationAction::Register => "register",
            RegistrationAction::Unregister => "unregister",
            RegistrationAction::Stopping => "stopping",
        }
    }
}

impl std::fmt::Display for RegistrationAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// Errors from a registration action.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// The post failed. Logged; callers may ignore it.
    #[error("post {action} failed: {source}")]
    Transport {
        action: RegistrationAction,
        #[source]
        source: DirectoryError,
    },

    /// Static registration data is unusable. Fatal.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl RegistrationError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, RegistrationError::Config(_))
    }
}
