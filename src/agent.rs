//! The discovery agent facade.
//!
//! Wires one [`DiscoveryContext`] through the resolver, dependency checker,
//! registrar, initializer and terminator, and exposes the public operations.

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::{AgentConfig, DirectoryCoordinates, Environment, StaticSources};
use crate::context::DiscoveryContext;
use crate::directory::{DirectoryClient, DirectoryError, HttpDirectory};
use crate::discovery::{DependencyChecker, DependencyReport, DiscoveryResult, EndpointResolver, ServiceEndpoint};
use crate::http::client::{ServiceCallResult, ServiceClient};
use crate::lifecycle::shutdown::DeadlineError;
use crate::lifecycle::{GracefulServer, Initializer, ShutdownDeadlines, ShutdownReason, StartupError, Terminator};
use crate::registration::{RegistrationDataBuilder, RegistrationError, Registrar, RuntimeData};

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("failed to build HTTP transport: {0}")]
    Transport(#[from] DirectoryError),

    #[error(transparent)]
    Deadlines(#[from] DeadlineError),
}

#[derive(Clone)]
pub struct Agent {
    context: Arc<DiscoveryContext>,
    resolver: EndpointResolver,
    checker: DependencyChecker,
    registrar: Registrar,
    initializer: Initializer,
    terminator: Terminator,
    services: ServiceClient,
}

impl Agent {
    /// Agent talking HTTP to the lifecycle manager, reading the process environment.
    pub fn new(config: &AgentConfig) -> Result<Self, AgentError> {
        let timeout = Duration::from_secs(config.discovery.request_timeout_secs);
        let directory: Arc<dyn DirectoryClient> = Arc::new(HttpDirectory::new(timeout)?);
        let env = Environment::from_process();
        let sources = StaticSources::from_config(&config.registration, &env);
        Self::with_parts(config, directory, sources, env)
    }

    /// Agent over an explicit directory, static sources and environment.
    pub fn with_parts(
        config: &AgentConfig,
        directory: Arc<dyn DirectoryClient>,
        sources: StaticSources,
        env: Environment,
    ) -> Result<Self, AgentError> {
        let context = Arc::new(DiscoveryContext::from_config(&config.directory));
        let resolver = EndpointResolver::from_config(directory.clone(), context.clone(), &config.discovery);
        let checker = DependencyChecker::new(resolver.clone());
        let builder = RegistrationDataBuilder::new(sources, env, context.clone());
        let registrar = Registrar::new(builder, directory, context.clone());
        let initializer = Initializer::new(context.clone(), checker.clone(), registrar.clone());
        let terminator = Terminator::new(
            registrar.clone(),
            ShutdownDeadlines::from_config(&config.shutdown)?,
        );
        let transport = HttpDirectory::new(Duration::from_secs(config.discovery.request_timeout_secs))?;
        let services = ServiceClient::new(resolver.clone(), transport);

        Ok(Self {
            context,
            resolver,
            checker,
            registrar,
            initializer,
            terminator,
            services,
        })
    }

    pub fn context(&self) -> &Arc<DiscoveryContext> {
        &self.context
    }

    pub fn resolver(&self) -> &EndpointResolver {
        &self.resolver
    }

    pub fn services(&self) -> &ServiceClient {
        &self.services
    }

    pub fn set_discover_coordinates(&self, coords: DirectoryCoordinates) {
        self.context.set_discover_coordinates(coords);
    }

    pub fn set_register_coordinates(&self, coords: DirectoryCoordinates) {
        self.context.set_register_coordinates(coords);
    }

    pub fn discover_coordinates(&self) -> Option<DirectoryCoordinates> {
        self.context.discover_coordinates()
    }

    pub fn register_coordinates(&self) -> Option<DirectoryCoordinates> {
        self.context.register_coordinates()
    }

    pub fn last_runtime_data(&self) -> Option<RuntimeData> {
        self.context.last_runtime_data()
    }

    pub async fn resolve(&self, service_type: &str) -> DiscoveryResult<ServiceEndpoint> {
        self.resolver.resolve(service_type).await
    }

    pub async fn check_all(&self, required: &[String]) -> DependencyReport {
        self.checker.check_all(required).await
    }

    pub async fn register(&self, runtime_data: RuntimeData) -> Result<(), RegistrationError> {
        self.registrar.register(runtime_data).await
    }

    pub async fn unregister(&self, runtime_data: Option<RuntimeData>) -> Result<(), RegistrationError> {
        self.registrar.unregister(runtime_data).await
    }

    pub async fn notify_stopping(&self) -> Result<(), RegistrationError> {
        self.registrar.notify_stopping().await
    }

    pub async fn initialize(&self, runtime_data: RuntimeData) -> Result<DependencyReport, StartupError> {
        self.initializer.initialize(runtime_data).await
    }

    pub async fn initialize_or_exit(&self, runtime_data: RuntimeData) -> DependencyReport {
        self.initializer.initialize_or_exit(runtime_data).await
    }

    pub async fn terminate(
        &self,
        server: Arc<dyn GracefulServer>,
        deadlines: Option<ShutdownDeadlines>,
    ) -> ShutdownReason {
        self.terminator.terminate(server, deadlines).await
    }

    pub async fn terminate_with<F>(
        &self,
        server: Arc<dyn GracefulServer>,
        deadlines: Option<ShutdownDeadlines>,
        on_done: F,
    ) where
        F: FnOnce(ShutdownReason) + Send + 'static,
    {
        self.terminator.terminate_with(server, deadlines, on_done).await
    }

    /// GET `path` on an instance of `service_type`.
    pub async fn get(&self, service_type: &str, path: &str) -> ServiceCallResult<Value> {
        self.services.get(service_type, path).await
    }

    pub async fn post(&self, service_type: &str, path: &str, body: &Value) -> ServiceCallResult<Value> {
        self.services.post(service_type, path, body).await
    }

    pub async fn put(&self, service_type: &str, path: &str, body: &Value) -> ServiceCallResult<Value> {
        self.services.put(service_type, path, body).await
    }

    pub async fn delete(&self, service_type: &str, path: &str) -> ServiceCallResult<Value> {
        self.services.delete(service_type, path).await
    }
}
