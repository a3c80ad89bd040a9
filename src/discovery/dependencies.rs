//! Required-agent checks.
//!
//! Resolves every required service type concurrently and sorts each into
//! `found` or `missing` as it settles. Order inside either list follows
//! completion, not input.

use futures_util::stream::{FuturesUnordered, StreamExt};

use crate::discovery::resolver::EndpointResolver;

/// Outcome of a dependency check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyReport {
    pub missing: Vec<String>,
    pub found: Vec<String>,
}

impl DependencyReport {
    pub fn is_satisfied(&self) -> bool {
        self.missing.is_empty()
    }
}

#[derive(Clone)]
pub struct DependencyChecker {
    resolver: EndpointResolver,
}

impl DependencyChecker {
    pub fn new(resolver: EndpointResolver) -> Self {
        Self { resolver }
    }

    /// Resolve all of `required` and report once every resolution has settled.
    pub async fn check_all(&self, required: &[String]) -> DependencyReport {
        let mut report = DependencyReport::default();
        if required.is_empty() {
            return report;
        }

        let mut pending: FuturesUnordered<_> = required
            .iter()
            .map(|service_type| async move {
                let result = self.resolver.resolve(service_type).await;
                (service_type, result)
            })
            .collect();

        while let Some((service_type, result)) = pending.next().await {
            match result {
                Ok(endpoint) => {
                    tracing::debug!(service_type = %service_type, endpoint = %endpoint, "Required agent found");
                    report.found.push(service_type.clone());
                }
                Err(e) => {
                    tracing::debug!(service_type = %service_type, error = %e, "Required agent missing");
                    report.missing.push(service_type.clone());
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::DirectoryCoordinates;
    use crate::context::DiscoveryContext;
    use crate::directory::{AgentRecord, DirectoryClient, DirectoryResult};
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// Knows every type except `absent-*`; `slow-*` types answer late.
    #[derive(Default)]
    struct LatencyDirectory {
        queries: AtomicUsize,
    }

    #[async_trait]
    impl DirectoryClient for LatencyDirectory {
        async fn query(
            &self,
            _directory: &DirectoryCoordinates,
            service_type: &str,
        ) -> DirectoryResult<Vec<AgentRecord>> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            if service_type.starts_with("slow-") {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            if service_type.starts_with("absent-") {
                return Ok(Vec::new());
            }
            Ok(vec![AgentRecord::new(format!("{service_type}.svc"), 80)])
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

    fn checker() -> (DependencyChecker, Arc<LatencyDirectory>) {
        let dir = Arc::new(LatencyDirectory::default());
        let ctx = Arc::new(DiscoveryContext::new());
        ctx.set_discover_coordinates(DirectoryCoordinates::new("lcm", 3000));
        (DependencyChecker::new(EndpointResolver::new(dir.clone(), ctx)), dir)
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_empty_short_circuits() {
        let (checker, dir) = checker();
        let report = checker.check_all(&[]).await;
        assert_eq!(report, DependencyReport::default());
        assert_eq!(dir.queries.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_all_found() {
        let (checker, _) = checker();
        let required = names(&["db", "slow-cache", "queue"]);
        let report = checker.check_all(&required).await;

        assert!(report.is_satisfied());
        let mut found = report.found.clone();
        found.sort();
        assert_eq!(found, names(&["db", "queue", "slow-cache"]));
    }

    #[tokio::test]
    async fn test_one_missing() {
        let (checker, _) = checker();
        let required = names(&["db", "absent-search", "queue"]);
        let report = checker.check_all(&required).await;

        assert_eq!(report.missing, names(&["absent-search"]));
        assert_eq!(report.found.len(), 2);
        assert!(!report.is_satisfied());
    }

    #[tokio::test]
    async fn test_completion_order() {
        let (checker, _) = checker();
        let required = names(&["slow-db", "queue"]);
        let report = checker.check_all(&required).await;
        assert_eq!(report.found, names(&["queue", "slow-db"]));
    }
}
