//! Resolved-endpoint cache.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::discovery::types::ServiceEndpoint;

#[derive(Debug, Clone)]
struct CachedEndpoint {
    endpoint: ServiceEndpoint,
    stored_at: Instant,
}

/// Thread-safe map of service type -> last resolved endpoint.
///
/// Entries never expire unless a TTL is set.
#[derive(Debug, Clone, Default)]
pub struct EndpointCache {
    inner: Arc<DashMap<String, CachedEndpoint>>,
    ttl: Option<Duration>,
}

impl EndpointCache {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            ttl,
        }
    }

    /// Cached endpoint for `service_type`, dropping it if expired.
    pub fn get(&self, service_type: &str) -> Option<ServiceEndpoint> {
        let entry = self.inner.get(service_type)?;
        if let Some(ttl) = self.ttl {
            if entry.stored_at.elapsed() >= ttl {
                drop(entry);
                self.inner.remove(service_type);
                return None;
            }
        }
        Some(entry.endpoint.clone())
    }

    pub fn insert(&self, service_type: &str, endpoint: ServiceEndpoint) {
        self.inner.insert(
            service_type.to_string(),
            CachedEndpoint {
                endpoint,
                stored_at: Instant::now(),
            },
        );
    }

    /// Evict one service type. Returns whether an entry existed.
    pub fn invalidate(&self, service_type: &str) -> bool {
        self.inner.remove(service_type).is_some()
    }

    pub fn clear(&self) {
        self.inner.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
