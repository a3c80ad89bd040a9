//! Startup orchestration.
//!
//! # Responsibilities
//! - Resolve the local hostname (once per context)
//! - Compute the required agents from runtime data or static config
//! - Seed the directory coordinates from static data before any lookup
//! - Check that every required agent is discoverable
//! - Register only when all dependencies are satisfied
//!
//! # Design Decisions
//! - Fail fast: a missing dependency is fatal, not retried
//! - Registration itself is best effort; a failed post does not abort startup

use std::sync::Arc;
use thiserror::Error;

use crate::config::loader::ConfigError;
use crate::context::DiscoveryContext;
use crate::discovery::{DependencyChecker, DependencyReport};
use crate::lifecycle::exit_on_fatal;
use crate::lifecycle::hostname::resolve_hostname;
use crate::registration::{Registrar, RegistrationError, RuntimeData};

/// Phases of [`Initializer::initialize`], in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupPhase {
    ResolvingHostname,
    ComputingDependencies,
    CheckingDependencies,
    Registering,
    Aborting,
}

impl std::fmt::Display for StartupPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StartupPhase::ResolvingHostname => "resolving_hostname",
            StartupPhase::ComputingDependencies => "computing_dependencies",
            StartupPhase::CheckingDependencies => "checking_dependencies",
            StartupPhase::Registering => "registering",
            StartupPhase::Aborting => "aborting",
        };
        f.write_str(name)
    }
}

/// Fatal startup conditions.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("can't init agent, missing required agents: {}", .0.join(", "))]
    MissingDependencies(Vec<String>),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Clone)]
pub struct Initializer {
    context: Arc<DiscoveryContext>,
    checker: DependencyChecker,
    registrar: Registrar,
}

impl Initializer {
    pub fn new(
        context: Arc<DiscoveryContext>,
        checker: DependencyChecker,
        registrar: Registrar,
    ) -> Self {
        Self {
            context,
            checker,
            registrar,
        }
    }

    /// Check dependencies, then register.
    pub async fn initialize(
        &self,
        mut runtime_data: RuntimeData,
    ) -> Result<DependencyReport, StartupError> {
        enter(StartupPhase::ResolvingHostname);
        let hostname = self.context.hostname_or_init(resolve_hostname).await;
        runtime_data.insert("hostname", hostname);

        enter(StartupPhase::ComputingDependencies);
        let required = match runtime_data.required_agents() {
            Some(agents) => agents,
            None => self.registrar.builder().sources().required_agents()?,
        };
        tracing::debug!(required = ?required, "Required agents");

        // Seeds the context's directory coordinates from static data.
        self.registrar.builder().build(&runtime_data)?;

        enter(StartupPhase::CheckingDependencies);
        let report = self.checker.check_all(&required).await;
        if !report.is_satisfied() {
            enter(StartupPhase::Aborting);
            tracing::error!(missing = ?report.missing, "Can't init agent: missing required agents");
            return Err(StartupError::MissingDependencies(report.missing));
        }

        enter(StartupPhase::Registering);
        match self.registrar.register(runtime_data).await {
            Ok(()) | Err(RegistrationError::Transport { .. }) => Ok(report),
            Err(RegistrationError::Config(e)) => {
                enter(StartupPhase::Aborting);
                Err(e.into())
            }
        }
    }

    /// [`Self::initialize`], exiting the process with status 1 on failure.
    pub async fn initialize_or_exit(&self, runtime_data: RuntimeData) -> DependencyReport {
        match self.initialize(runtime_data).await {
            Ok(report) => report,
            Err(e) => exit_on_fatal(&e),
        }
    }
}

fn enter(phase: StartupPhase) {
    tracing::info!(phase = %phase, "Initializing discovery");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StartupError::MissingDependencies(vec!["db".into(), "queue".into()]);
        assert_eq!(
            err.to_string(),
            "can't init agent, missing required agents: db, queue"
        );
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(StartupPhase::CheckingDependencies.to_string(), "checking_dependencies");
    }
}
