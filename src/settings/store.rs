//! Configuration Store
//!
//! Holds the active [`PluginConfig`] behind an `Arc` that is swapped whole.
//! Readers take a snapshot and keep it for as long as they need; a swap never
//! changes a snapshot somebody already holds.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::RwLock;

use super::persistence::ConfigPersistence;
use super::schema::{PluginConfig, validate};

pub struct ConfigStore {
    current: RwLock<Arc<PluginConfig>>,
    persistence: Arc<dyn ConfigPersistence>,
}

impl ConfigStore {
    /// Store holding the defaults until [`load`](Self::load) runs
    pub fn new(persistence: Arc<dyn ConfigPersistence>) -> Self {
        Self {
            current: RwLock::new(Arc::new(PluginConfig::default())),
            persistence,
        }
    }

    /// Read persisted data, validate it and make it current.
    ///
    /// A persistence failure is logged and the defaults are used.
    pub async fn load(&self) -> Arc<PluginConfig> {
        let config = match self.try_load().await {
            Ok(config) => config.unwrap_or_default(),
            Err(e) => {
                log::warn!("Failed to load plugin data, using defaults: {:#}", e);
                PluginConfig::default()
            }
        };
        log::info!("Loaded {} language mappings", config.mappings.len());
        self.replace(config).await
    }

    /// Read and validate persisted data without touching the current
    /// configuration. `None` when nothing is saved.
    pub async fn try_load(&self) -> Result<Option<PluginConfig>> {
        let saved = self.persistence.load().await?;
        Ok(saved.map(|value| validate(&value)))
    }

    /// Current configuration
    pub async fn snapshot(&self) -> Arc<PluginConfig> {
        self.current.read().await.clone()
    }

    /// Swap in a new configuration
    pub async fn replace(&self, config: PluginConfig) -> Arc<PluginConfig> {
        let config = Arc::new(config);
        *self.current.write().await = config.clone();
        config
    }

    /// Persist `config`. Does not change the current configuration.
    pub async fn save(&self, config: &PluginConfig) -> Result<()> {
        self.persistence.save(config).await
    }
}
