//! Static registration sources.
//!
//! # Responsibilities
//! - Read the `register` section of a JSON settings file
//! - Try the primary source, fall back to the secondary one
//! - Extract the `requiredAgents` list
//!
//! A source distinguishes "absent" (`Ok(None)`, the file does not exist) from
//! "empty" (`Ok(Some({}))`, the file exists but has no usable section).

use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::env::Environment;
use crate::config::loader::ConfigError;
use crate::config::schema::RegistrationConfig;

/// A JSON object, the unit every registration layer is expressed in.
pub type JsonObject = Map<String, Value>;

/// Key of the dependency list inside registration data.
pub const REQUIRED_AGENTS: &str = "requiredAgents";

/// Anything that can yield static registration data.
pub trait RegistrationSource: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Load the registration object. `Ok(None)` means the source is absent.
    fn load(&self) -> Result<Option<JsonObject>, ConfigError>;
}

/// A JSON file, optionally narrowed to one top-level section.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
    name: String,
    section: Option<String>,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>, section: Option<&str>) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        Self {
            path,
            name,
            section: section.map(str::to_string),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RegistrationSource for JsonFileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&self) -> Result<Option<JsonObject>, ConfigError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(file = %self.name, "Registration file not found");
                return Ok(None);
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: self.name.clone(),
                    source,
                })
            }
        };
        tracing::debug!(file = %self.name, "Registration file found");

        let doc: Value = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: self.name.clone(),
            source,
        })?;

        let data = match &self.section {
            Some(section) => doc.get(section).cloned(),
            None => Some(doc),
        };
        match data {
            Some(Value::Object(map)) => Ok(Some(map)),
            Some(_) | None => Ok(Some(JsonObject::new())),
        }
    }
}

/// An in-memory source, for embedding applications and tests.
#[derive(Debug, Clone)]
pub struct InlineSource {
    name: String,
    data: Option<JsonObject>,
}

impl InlineSource {
    pub fn new(name: impl Into<String>, data: JsonObject) -> Self {
        Self {
            name: name.into(),
            data: Some(data),
        }
    }

    /// A source that always reports itself absent.
    pub fn absent(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: None,
        }
    }
}

impl RegistrationSource for InlineSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&self) -> Result<Option<JsonObject>, ConfigError> {
        Ok(self.data.clone())
    }
}

/// Primary and secondary static registration sources.
#[derive(Clone)]
pub struct StaticSources {
    primary: Arc<dyn RegistrationSource>,
    secondary: Arc<dyn RegistrationSource>,
}

impl std::fmt::Debug for StaticSources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticSources")
            .field("primary", &self.primary.name())
            .field("secondary", &self.secondary.name())
            .finish()
    }
}

impl StaticSources {
    pub fn new(
        primary: Arc<dyn RegistrationSource>,
        secondary: Arc<dyn RegistrationSource>,
    ) -> Self {
        Self { primary, secondary }
    }

    /// JSON file sources resolved against the launch working directory.
    pub fn from_config(config: &RegistrationConfig, env: &Environment) -> Self {
        let dir = env.working_dir();
        let section = Some(config.section.as_str()).filter(|s| !s.is_empty());
        Self::new(
            Arc::new(JsonFileSource::new(dir.join(&config.primary_source), section)),
            Arc::new(JsonFileSource::new(dir.join(&config.secondary_source), section)),
        )
    }

    /// Load static registration data: primary if non-empty, else secondary.
    ///
    /// Only a secondary source that is absent altogether is an error; an
    /// existing secondary without a section yields an empty object.
    pub fn load(&self) -> Result<JsonObject, ConfigError> {
        if let Some(data) = self.primary.load()? {
            if !data.is_empty() {
                return Ok(data);
            }
        }

        match self.secondary.load()? {
            Some(data) => {
                tracing::info!(
                    source = self.secondary.name(),
                    "Getting registration information from secondary source"
                );
                Ok(data)
            }
            None => Err(ConfigError::NoStaticData {
                primary: self.primary.name().to_string(),
                secondary: self.secondary.name().to_string(),
            }),
        }
    }

    /// `requiredAgents` from the primary source, else from the secondary.
    pub fn required_agents(&self) -> Result<Vec<String>, ConfigError> {
        for source in [&self.primary, &self.secondary] {
            if let Some(data) = source.load()? {
                if let Some(agents) = data.get(REQUIRED_AGENTS) {
                    return Ok(string_list(agents));
                }
            }
        }
        Ok(Vec::new())
    }
}

/// Strings of a JSON array; anything else is an empty list.
pub fn string_list(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
