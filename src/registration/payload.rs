//! Registration payload assembly.
//!
//! # Responsibilities
//! - Load static registration data (primary, then secondary source)
//! - Resolve discovery and registration coordinates with fallbacks
//! - Apply environment host overrides
//! - Overlay runtime data and derived fields
//! - Persist the resolved coordinates into the shared context
//!
//! # Precedence
//! ```text
//! static config  <  environment overrides  <  runtime data  <  derived fields
//! lcManagerDiscover / lcManagerRegister:  own field  >  lcManager  >  context default
//! ```

use serde_json::Value;
use std::sync::Arc;

use crate::config::env::Environment;
use crate::config::loader::ConfigError;
use crate::config::schema::DirectoryCoordinates;
use crate::config::sources::{JsonObject, StaticSources};
use crate::context::DiscoveryContext;
use crate::lifecycle::hostname::os_hostname;
use crate::registration::types::{
    RegistrationPayload, RuntimeData, LC_MANAGER, LC_MANAGER_DISCOVER, LC_MANAGER_REGISTER,
};

/// Builds a fresh [`RegistrationPayload`] for every registration action.
#[derive(Debug, Clone)]
pub struct RegistrationDataBuilder {
    sources: StaticSources,
    env: Environment,
    context: Arc<DiscoveryContext>,
}

impl RegistrationDataBuilder {
    pub fn new(sources: StaticSources, env: Environment, context: Arc<DiscoveryContext>) -> Self {
        Self {
            sources,
            env,
            context,
        }
    }

    pub fn sources(&self) -> &StaticSources {
        &self.sources
    }

    /// Merge static config, environment and `runtime_data` into one payload.
    ///
    /// Every error is fatal for the process: without static data or
    /// directory coordinates there is no valid registration identity.
    pub fn build(&self, runtime_data: &RuntimeData) -> Result<RegistrationPayload, ConfigError> {
        let mut data = self.sources.load()?;

        if let Some(host) = &self.env.lc_manager_host {
            override_host(&mut data, LC_MANAGER, host);
        }

        let shared = present(&data, LC_MANAGER).cloned();
        fill_coordinates(
            &mut data,
            LC_MANAGER_DISCOVER,
            shared.clone(),
            self.context.discover_coordinates(),
        );
        fill_coordinates(
            &mut data,
            LC_MANAGER_REGISTER,
            shared,
            self.context.register_coordinates(),
        );

        if let Some(host) = &self.env.lc_manager_discover_host {
            override_host(&mut data, LC_MANAGER_DISCOVER, host);
        }
        if let Some(host) = &self.env.lc_manager_register_host {
            override_host(&mut data, LC_MANAGER_REGISTER, host);
        }

        for (key, value) in runtime_data.as_object() {
            data.insert(key.clone(), value.clone());
        }

        let host = self
            .context
            .hostname()
            .map(str::to_string)
            .unwrap_or_else(os_hostname);
        data.insert("host".into(), Value::String(host));
        data.insert("launchPath".into(), Value::String(self.env.launch_path()));
        data.insert("dockerized".into(), Value::Bool(self.env.dockerized()));
        data.insert("pid".into(), Value::from(std::process::id()));

        let payload = RegistrationPayload::from_object(data);

        let discover = match payload.coordinates(LC_MANAGER_DISCOVER) {
            Some(Ok(coords)) => coords,
            Some(Err(source)) => {
                return Err(ConfigError::InvalidCoordinates {
                    field: LC_MANAGER_DISCOVER,
                    source,
                })
            }
            None => return Err(ConfigError::MissingCoordinates("discover")),
        };
        let register = match payload.coordinates(LC_MANAGER_REGISTER) {
            Some(Ok(coords)) => coords,
            Some(Err(source)) => {
                return Err(ConfigError::InvalidCoordinates {
                    field: LC_MANAGER_REGISTER,
                    source,
                })
            }
            None => return Err(ConfigError::MissingCoordinates("register")),
        };

        self.context.set_discover_coordinates(discover);
        self.context.set_register_coordinates(register);

        tracing::debug!(payload = %payload.to_value(), "Registration data built");
        Ok(payload)
    }
}

/// Own field, else the shared `lcManager`, else the context's current value.
fn fill_coordinates(
    data: &mut JsonObject,
    key: &str,
    shared: Option<Value>,
    current: Option<DirectoryCoordinates>,
) {
    if present(data, key).is_some() {
        return;
    }
    let fallback = shared.or_else(|| current.and_then(|c| serde_json::to_value(c).ok()));
    if let Some(value) = fallback {
        data.insert(key.to_string(), value);
    }
}

fn present<'a>(data: &'a JsonObject, key: &str) -> Option<&'a Value> {
    data.get(key).filter(|v| !v.is_null())
}

/// Replace only the host of coordinates stored under `key`, keeping the port.
fn override_host(data: &mut JsonObject, key: &str, host: &str) {
    if let Some(Value::Object(coords)) = data.get_mut(key) {
        coords.insert("host".into(), Value::String(host.to_string()));
    }
}
