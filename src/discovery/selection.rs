//! Instance selection strategies.
//!
//! A directory query returns every responsive instance of a type; a
//! [`SelectionStrategy`] picks the one to connect to.

use rand::Rng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::config::schema::SelectionPolicy;
use crate::directory::types::AgentRecord;

pub trait SelectionStrategy: Send + Sync + std::fmt::Debug {
    /// Index of the chosen record, `None` when `records` is empty.
    fn select(&self, service_type: &str, records: &[AgentRecord]) -> Option<usize>;
}

/// Always the first record the directory returned.
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstMatch;

impl SelectionStrategy for FirstMatch {
    fn select(&self, _service_type: &str, records: &[AgentRecord]) -> Option<usize> {
        if records.is_empty() {
            None
        } else {
            Some(0)
        }
    }
}

/// Round-robin selector.
/// Stores an internal counter to rotate through instances.
#[derive(Debug, Default)]
pub struct RoundRobin {
    counter: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SelectionStrategy for RoundRobin {
    fn select(&self, _service_type: &str, records: &[AgentRecord]) -> Option<usize> {
        if records.is_empty() {
            return None;
        }
        let count = self.counter.fetch_add(1, Ordering::Relaxed);
        Some(count % records.len())
    }
}

/// Uniformly random selector.
#[derive(Debug, Default, Clone, Copy)]
pub struct Random;

impl SelectionStrategy for Random {
    fn select(&self, _service_type: &str, records: &[AgentRecord]) -> Option<usize> {
        if records.is_empty() {
            return None;
        }
        Some(rand::thread_rng().gen_range(0..records.len()))
    }
}

/// Strategy for a configured policy.
pub fn strategy_for(policy: SelectionPolicy) -> Arc<dyn SelectionStrategy> {
    match policy {
        SelectionPolicy::FirstMatch => Arc::new(FirstMatch),
        SelectionPolicy::RoundRobin => Arc::new(RoundRobin::new()),
        SelectionPolicy::Random => Arc::new(Random),
    }
}
