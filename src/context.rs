//! Shared discovery state.
//!
//! One [`DiscoveryContext`] is owned per agent and handed to every component
//! that discovers or registers. It holds the current directory coordinates,
//! the runtime data of the last `register`, and the resolved hostname.

use arc_swap::ArcSwapOption;
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::config::schema::{DirectoryConfig, DirectoryCoordinates};
use crate::registration::types::RuntimeData;

#[derive(Debug, Default)]
pub struct DiscoveryContext {
    discover: ArcSwapOption<DirectoryCoordinates>,
    register: ArcSwapOption<DirectoryCoordinates>,
    last_runtime_data: ArcSwapOption<RuntimeData>,
    hostname: OnceCell<String>,
}

impl DiscoveryContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the coordinates with configured defaults.
    pub fn from_config(config: &DirectoryConfig) -> Self {
        let ctx = Self::new();
        if let Some(coords) = config.discover_coordinates() {
            ctx.set_discover_coordinates(coords);
        }
        if let Some(coords) = config.register_coordinates() {
            ctx.set_register_coordinates(coords);
        }
        ctx
    }

    pub fn discover_coordinates(&self) -> Option<DirectoryCoordinates> {
        self.discover.load_full().map(|c| (*c).clone())
    }

    pub fn set_discover_coordinates(&self, coords: DirectoryCoordinates) {
        self.discover.store(Some(Arc::new(coords)));
    }

    pub fn register_coordinates(&self) -> Option<DirectoryCoordinates> {
        self.register.load_full().map(|c| (*c).clone())
    }

    pub fn set_register_coordinates(&self, coords: DirectoryCoordinates) {
        self.register.store(Some(Arc::new(coords)));
    }

    pub fn last_runtime_data(&self) -> Option<RuntimeData> {
        self.last_runtime_data.load_full().map(|d| (*d).clone())
    }

    pub(crate) fn store_runtime_data(&self, data: RuntimeData) {
        self.last_runtime_data.store(Some(Arc::new(data)));
    }

    /// Hostname resolved earlier in this context's lifetime, if any.
    pub fn hostname(&self) -> Option<&str> {
        self.hostname.get().map(String::as_str)
    }

    /// Resolve the hostname once; later calls return the cached value.
    pub async fn hostname_or_init<F, Fut>(&self, resolve: F) -> &str
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = String>,
    {
        self.hostname.get_or_init(resolve).await
    }
}
