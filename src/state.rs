//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::store::{HighlightStore, KeyValueStore};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    store: HighlightStore,
}

impl AppState {
    /// Create the state over a key-value backend, using the configured
    /// storage key
    pub fn new(config: Config, kv: Arc<dyn KeyValueStore>) -> Self {
        let store = HighlightStore::with_key(kv, config.highlight.storage_key.clone());
        Self {
            inner: Arc::new(AppStateInner { config, store }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the highlight store
    pub fn store(&self) -> &HighlightStore {
        &self.inner.store
    }

    /// The colour applied to records without one: the user's saved
    /// preference, else the configured default
    pub async fn default_color(&self) -> crate::error::Result<String> {
        Ok(self
            .store()
            .default_color()
            .await?
            .unwrap_or_else(|| self.config().highlight.default_color.clone()))
    }
}
