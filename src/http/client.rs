//! Calls to discovered services by type.
//!
//! # Responsibilities
//! - Resolve a service type to an endpoint
//! - Issue the HTTP verb against `endpoint.url(path)`
//! - Return the envelope-unwrapped JSON result

use reqwest::Method;
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::directory::{DirectoryError, HttpDirectory};
use crate::discovery::{DiscoveryError, EndpointResolver, ServiceEndpoint};

#[derive(Debug, Error)]
pub enum ServiceCallError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

pub type ServiceCallResult<T> = Result<T, ServiceCallError>;

#[derive(Clone)]
pub struct ServiceClient {
    resolver: EndpointResolver,
    transport: HttpDirectory,
}

impl ServiceClient {
    pub fn new(resolver: EndpointResolver, transport: HttpDirectory) -> Self {
        Self {
            resolver,
            transport,
        }
    }

    pub async fn get(&self, service_type: &str, path: &str) -> ServiceCallResult<Value> {
        self.call(Method::GET, service_type, path, None).await
    }

    pub async fn post(
        &self,
        service_type: &str,
        path: &str,
        body: &Value,
    ) -> ServiceCallResult<Value> {
        self.call(Method::POST, service_type, path, Some(body)).await
    }

    pub async fn put(
        &self,
        service_type: &str,
        path: &str,
        body: &Value,
    ) -> ServiceCallResult<Value> {
        self.call(Method::PUT, service_type, path, Some(body)).await
    }

    pub async fn delete(&self, service_type: &str, path: &str) -> ServiceCallResult<Value> {
        self.call(Method::DELETE, service_type, path, None).await
    }

    /// POST to an already known endpoint, skipping discovery.
    pub async fn post_to_endpoint(
        &self,
        endpoint: &ServiceEndpoint,
        path: &str,
        body: &Value,
    ) -> ServiceCallResult<Value> {
        self.call_endpoint(Method::POST, endpoint, path, Some(body))
            .await
    }

    /// Issue `method` against a known endpoint.
    pub async fn call_endpoint(
        &self,
        method: Method,
        endpoint: &ServiceEndpoint,
        path: &str,
        body: Option<&Value>,
    ) -> ServiceCallResult<Value> {
        let url = Url::parse(&endpoint.url(path)).map_err(DirectoryError::from)?;
        Ok(self.transport.request(method, url, body).await?)
    }

    async fn call(
        &self,
        method: Method,
        service_type: &str,
        path: &str,
        body: Option<&Value>,
    ) -> ServiceCallResult<Value> {
        let endpoint = self.resolver.resolve(service_type).await?;
        tracing::debug!(service_type, endpoint = %endpoint, method = %method, path, "Calling service");
        self.call_endpoint(method, &endpoint, path, body).await
    }
}
