//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Enforce that the hard shutdown deadline outlives the soft one
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AgentConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::AgentConfig;

/// A single semantic problem with an [`AgentConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("hard shutdown deadline ({hard_ms}ms) must exceed soft deadline ({soft_ms}ms)")]
    DeadlineOrder { soft_ms: u64, hard_ms: u64 },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("invalid {field} address: {value}")]
    Address { field: &'static str, value: String },

    #[error("{0} must not be empty")]
    Empty(&'static str),
}

/// Validate an agent configuration, collecting every error.
pub fn validate_config(config: &AgentConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let shutdown = &config.shutdown;
    if shutdown.soft_deadline_ms == 0 {
        errors.push(ValidationError::Zero("shutdown.soft_deadline_ms"));
    }
    if shutdown.hard_deadline_ms <= shutdown.soft_deadline_ms {
        errors.push(ValidationError::DeadlineOrder {
            soft_ms: shutdown.soft_deadline_ms,
            hard_ms: shutdown.hard_deadline_ms,
        });
    }

    if config.discovery.request_timeout_secs == 0 {
        errors.push(ValidationError::Zero("discovery.request_timeout_secs"));
    }
    if config.discovery.cache_ttl_secs == Some(0) {
        errors.push(ValidationError::Zero("discovery.cache_ttl_secs"));
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::Address {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::Address {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if config.registration.primary_source.trim().is_empty() {
        errors.push(ValidationError::Empty("registration.primary_source"));
    }
    if config.registration.secondary_source.trim().is_empty() {
        errors.push(ValidationError::Empty("registration.secondary_source"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
