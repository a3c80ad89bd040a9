//! Register / unregister / stopping notifications.
//!
//! # Responsibilities
//! - Remember the runtime data of the last `register`
//! - Build a fresh payload for every action
//! - POST it to the registration directory under the action's path
//!
//! # Design Decisions
//! - Best effort: transport failures are logged, never retried, and handed
//!   back as `Err` so callers can observe them or ignore them
//! - Config failures are fatal and always surface

use std::sync::Arc;

use crate::config::loader::ConfigError;
use crate::context::DiscoveryContext;
use crate::directory::DirectoryClient;
use crate::observability::metrics;
use crate::registration::payload::RegistrationDataBuilder;
use crate::registration::types::{RegistrationAction, RegistrationError, RuntimeData};

#[derive(Clone)]
pub struct Registrar {
    builder: RegistrationDataBuilder,
    directory: Arc<dyn DirectoryClient>,
    context: Arc<DiscoveryContext>,
}

impl Registrar {
    pub fn new(
        builder: RegistrationDataBuilder,
        directory: Arc<dyn DirectoryClient>,
        context: Arc<DiscoveryContext>,
    ) -> Self {
        Self {
            builder,
            directory,
            context,
        }
    }

    pub fn builder(&self) -> &RegistrationDataBuilder {
        &self.builder
    }

    /// Announce this instance. `runtime_data` is remembered for later actions.
    pub async fn register(&self, runtime_data: RuntimeData) -> Result<(), RegistrationError> {
        self.context.store_runtime_data(runtime_data.clone());
        self.register_action(RegistrationAction::Register, &runtime_data)
            .await
    }

    /// Retract this instance, reusing the last registered data when `None`.
    pub async fn unregister(
        &self,
        runtime_data: Option<RuntimeData>,
    ) -> Result<(), RegistrationError> {
        let data = runtime_data
            .or_else(|| self.context.last_runtime_data())
            .unwrap_or_default();
        self.register_action(RegistrationAction::Unregister, &data)
            .await
    }

    /// Tell the directory this instance is going away.
    pub async fn notify_stopping(&self) -> Result<(), RegistrationError> {
        tracing::info!("Now stopping");
        let data = self.context.last_runtime_data().unwrap_or_default();
        self.register_action(RegistrationAction::Stopping, &data)
            .await
    }

    /// The primitive shared by all three actions.
    pub async fn register_action(
        &self,
        action: RegistrationAction,
        runtime_data: &RuntimeData,
    ) -> Result<(), RegistrationError> {
        let payload = match self.builder.build(runtime_data) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(action = %action, error = %e, "Invalid registration data");
                metrics::record_registration(action.path(), "invalid");
                return Err(e.into());
            }
        };
        let directory = payload
            .register_coordinates()
            .ok_or(ConfigError::MissingCoordinates("register"))?;

        match self
            .directory
            .post_action(&directory, action.path(), &payload.to_value())
            .await
        {
            Ok(result) => {
                tracing::info!(action = %action, directory = %directory, "Registration action posted");
                tracing::debug!(action = %action, result = %result, "Post result");
                metrics::record_registration(action.path(), "success");
                Ok(())
            }
            Err(source) => {
                tracing::warn!(
                    action = %action,
                    directory = %directory,
                    error = %source,
                    "Registration action failed"
                );
                metrics::record_registration(action.path(), "failure");
                Err(RegistrationError::Transport { action, source })
            }
        }
    }
}
