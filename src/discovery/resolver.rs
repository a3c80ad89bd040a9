//! Service-type to endpoint resolution.
//!
//! # Responsibilities
//! - Query the discovery directory for responsive instances of a type
//! - Pick one instance through the configured selection strategy
//! - Optionally cache the result per service type

use std::sync::Arc;
use std::time::Duration;

use crate::config::schema::DiscoveryConfig;
use crate::context::DiscoveryContext;
use crate::directory::DirectoryClient;
use crate::discovery::cache::EndpointCache;
use crate::discovery::selection::{strategy_for, FirstMatch, SelectionStrategy};
use crate::discovery::types::{DiscoveryError, DiscoveryResult, ServiceEndpoint};
use crate::observability::metrics;

#[derive(Clone)]
pub struct EndpointResolver {
    directory: Arc<dyn DirectoryClient>,
    context: Arc<DiscoveryContext>,
    selector: Arc<dyn SelectionStrategy>,
    cache: Option<EndpointCache>,
}

impl EndpointResolver {
    /// First-match selection, no caching.
    pub fn new(directory: Arc<dyn DirectoryClient>, context: Arc<DiscoveryContext>) -> Self {
        Self {
            directory,
            context,
            selector: Arc::new(FirstMatch),
            cache: None,
        }
    }

    pub fn from_config(
        directory: Arc<dyn DirectoryClient>,
        context: Arc<DiscoveryContext>,
        config: &DiscoveryConfig,
    ) -> Self {
        let resolver = Self::new(directory, context).with_selector(strategy_for(config.selection));
        if config.cache_enabled {
            resolver.with_cache(EndpointCache::new(
                config.cache_ttl_secs.map(Duration::from_secs),
            ))
        } else {
            resolver
        }
    }

    pub fn with_selector(mut self, selector: Arc<dyn SelectionStrategy>) -> Self {
        self.selector = selector;
        self
    }

    pub fn with_cache(mut self, cache: EndpointCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn cache(&self) -> Option<&EndpointCache> {
        self.cache.as_ref()
    }

    /// Resolve `service_type`, serving from the cache when enabled.
    pub async fn resolve(&self, service_type: &str) -> DiscoveryResult<ServiceEndpoint> {
        if let Some(endpoint) = self.cache.as_ref().and_then(|c| c.get(service_type)) {
            tracing::trace!(service_type, endpoint = %endpoint, "Endpoint served from cache");
            metrics::record_cache_hit(service_type);
            return Ok(endpoint);
        }
        self.refresh(service_type).await
    }

    /// Always query the directory. A failure evicts any cached entry.
    pub async fn refresh(&self, service_type: &str) -> DiscoveryResult<ServiceEndpoint> {
        let result = self.query(service_type).await;

        match &result {
            Ok(endpoint) => {
                tracing::debug!(service_type, endpoint = %endpoint, "Resolved endpoint");
                metrics::record_resolution(service_type, "found");
                if let Some(cache) = &self.cache {
                    cache.insert(service_type, endpoint.clone());
                }
            }
            Err(e) => {
                tracing::debug!(service_type, error = %e, "Resolution failed");
                metrics::record_resolution(service_type, outcome(e));
                if let Some(cache) = &self.cache {
                    cache.invalidate(service_type);
                }
            }
        }
        result
    }

    async fn query(&self, service_type: &str) -> DiscoveryResult<ServiceEndpoint> {
        let directory = self
            .context
            .discover_coordinates()
            .ok_or(DiscoveryError::NoDirectory)?;

        let records = self
            .directory
            .query(&directory, service_type)
            .await
            .map_err(|e| {
                tracing::warn!(service_type, directory = %directory, error = %e, "Directory query failed");
                DiscoveryError::Directory(e.to_string())
            })?;

        self.selector
            .select(service_type, &records)
            .and_then(|i| records.get(i))
            .map(ServiceEndpoint::from)
            .ok_or_else(|| DiscoveryError::NotFound {
                service_type: service_type.to_string(),
            })
    }
}

fn outcome(err: &DiscoveryError) -> &'static str {
    match err {
        DiscoveryError::NotFound { .. } => "not_found",
        DiscoveryError::Directory(_) => "directory_error",
        DiscoveryError::NoDirectory => "no_directory",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::DirectoryCoordinates;
    use crate::directory::{AgentRecord, DirectoryError, DirectoryResult};
    use async_trait::async_trait;
    use serde_json::Value;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct StaticDirectory {
        instances: HashMap<String, Vec<AgentRecord>>,
        queries: AtomicUsize,
        broken: bool,
    }

    #[async_trait]
    impl DirectoryClient for StaticDirectory {
        async fn query(
            &self,
            _directory: &DirectoryCoordinates,
            service_type: &str,
        ) -> DirectoryResult<Vec<AgentRecord>> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            if self.broken {
                return Err(DirectoryError::Decode("not an array".into()));
            }
            Ok(self.instances.get(service_type).cloned().unwrap_or_default())
        }

        async fn post_action(
            &self,
            _directory: &DirectoryCoordinates,
            _action: &str,
            _payload: &Value,
        ) -> DirectoryResult<Value> {
            Ok(Value::Null)
        }
    }

    fn directory() -> Arc<StaticDirectory> {
        let mut instances = HashMap::new();
        instances.insert(
            "db".to_string(),
            vec![AgentRecord::new("10.0.0.2", 5432), AgentRecord::new("10.0.0.3", 5432)],
        );
        Arc::new(StaticDirectory {
            instances,
            ..Default::default()
        })
    }

    fn context() -> Arc<DiscoveryContext> {
        let ctx = Arc::new(DiscoveryContext::new());
        ctx.set_discover_coordinates(DirectoryCoordinates::new("lcm", 3000));
        ctx
    }

    #[tokio::test]
    async fn test_first_match() {
        let resolver = EndpointResolver::new(directory(), context());
        let ep = resolver.resolve("db").await.unwrap();
        assert_eq!(ep, ServiceEndpoint::new("10.0.0.2", 5432));
        assert_eq!(ep.path, "");
    }

    #[tokio::test]
    async fn test_not_found() {
        let resolver = EndpointResolver::new(directory(), context());
        let err = resolver.resolve("queue").await.unwrap_err();
        assert_eq!(
            err,
            DiscoveryError::NotFound {
                service_type: "queue".into()
            }
        );
    }

    #[tokio::test]
    async fn test_directory_error() {
        let dir = Arc::new(StaticDirectory {
            broken: true,
            ..Default::default()
        });
        let resolver = EndpointResolver::new(dir, context());
        assert!(matches!(
            resolver.resolve("db").await,
            Err(DiscoveryError::Directory(_))
        ));
    }

    #[tokio::test]
    async fn test_no_directory() {
        let resolver = EndpointResolver::new(directory(), Arc::new(DiscoveryContext::new()));
        assert_eq!(resolver.resolve("db").await, Err(DiscoveryError::NoDirectory));
    }

    #[tokio::test]
    async fn test_cache_enabled_queries_once() {
        let dir = directory();
        let resolver =
            EndpointResolver::new(dir.clone(), context()).with_cache(EndpointCache::new(None));

        let a = resolver.resolve("db").await.unwrap();
        let b = resolver.resolve("db").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(dir.queries.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cache_disabled_queries_twice() {
        let dir = directory();
        let resolver = EndpointResolver::new(dir.clone(), context());

        resolver.resolve("db").await.unwrap();
        resolver.resolve("db").await.unwrap();
        assert_eq!(dir.queries.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_refresh_failure_evicts() {
        let resolver =
            EndpointResolver::new(directory(), context()).with_cache(EndpointCache::new(None));
        let cache = resolver.cache().unwrap().clone();
        cache.insert("queue", ServiceEndpoint::new("stale", 1));

        assert_eq!(resolver.resolve("queue").await.unwrap().host, "stale");
        assert!(resolver.refresh("queue").await.is_err());
        assert!(cache.get("queue").is_none());
    }

    #[tokio::test]
    async fn test_from_config_round_robin() {
        let config = DiscoveryConfig {
            selection: crate::config::SelectionPolicy::RoundRobin,
            ..Default::default()
        };
        let resolver = EndpointResolver::from_config(directory(), context(), &config);
        assert!(resolver.cache().is_none());
        assert_eq!(resolver.resolve("db").await.unwrap().host, "10.0.0.2");
        assert_eq!(resolver.resolve("db").await.unwrap().host, "10.0.0.3");
    }
}
