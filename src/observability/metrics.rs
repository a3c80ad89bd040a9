//! Metrics collection and exposition.
//!
//! # Metrics
//! - `discovery_resolutions_total` (counter): resolutions by service type, outcome
//! - `discovery_cache_hits_total` (counter): cache hits by service type
//! - `registration_actions_total` (counter): register/unregister/stopping by outcome
//! - `shutdown_total` (counter): terminations by winning path
//!
//! Without an installed recorder every call is a no-op.

use metrics::counter;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_resolution(service_type: &str, outcome: &'static str) {
    counter!(
        "discovery_resolutions_total",
        "service_type" => service_type.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_cache_hit(service_type: &str) {
    counter!("discovery_cache_hits_total", "service_type" => service_type.to_string()).increment(1);
}

pub fn record_registration(action: &'static str, outcome: &'static str) {
    counter!("registration_actions_total", "action" => action, "outcome" => outcome).increment(1);
}

pub fn record_shutdown(reason: &'static str) {
    counter!("shutdown_total", "reason" => reason).increment(1);
}
