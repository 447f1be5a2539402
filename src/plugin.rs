//! Plugin lifecycle
//!
//! Ties the settings store to the embed pipeline: configuration is loaded
//! once, every rendered fragment is post-processed with the snapshot current
//! at that moment, and a saved configuration re-renders every open view.

use std::sync::Arc;

use anyhow::Result;

use crate::dom::{NodeId, SharedDocument};
use crate::embed::{EmbedProcessor, InteractionControls, PassHandle};
use crate::host::{Clipboard, Highlighter, Vault, Workspace};
use crate::settings::{ConfigPersistence, ConfigStore, PluginConfig, validate};

/// Collaborators provided by the hosting application
#[derive(Clone)]
pub struct Host {
    pub vault: Arc<dyn Vault>,
    pub workspace: Arc<dyn Workspace>,
    pub highlighter: Arc<dyn Highlighter>,
    pub clipboard: Arc<dyn Clipboard>,
}

pub struct CodeEmbedPlugin {
    store: ConfigStore,
    host: Host,
}

impl CodeEmbedPlugin {
    pub fn new(persistence: Arc<dyn ConfigPersistence>, host: Host) -> Self {
        Self {
            store: ConfigStore::new(persistence),
            host,
        }
    }

    /// Load the persisted configuration. Call once before rendering.
    pub async fn on_load(&self) -> Arc<PluginConfig> {
        self.store.load().await
    }

    pub async fn config(&self) -> Arc<PluginConfig> {
        self.store.snapshot().await
    }

    /// Post-process the fragment under `root`
    pub async fn post_process(&self, doc: &SharedDocument, root: NodeId) -> PassHandle {
        let config = self.store.snapshot().await;
        EmbedProcessor::new(
            config,
            self.host.vault.clone(),
            self.host.workspace.clone(),
            self.host.highlighter.clone(),
        )
        .process(doc, root)
        .await
    }

    /// Click handling for blocks converted in `doc`
    pub fn controls(&self, doc: &SharedDocument) -> InteractionControls {
        InteractionControls::new(
            doc.clone(),
            self.host.workspace.clone(),
            self.host.clipboard.clone(),
        )
    }

    /// Persist `config`, make it current and re-render every view.
    ///
    /// The configuration is validated first, so what is stored is what the
    /// next startup will load. Nothing changes when saving fails.
    pub async fn save_config(&self, config: PluginConfig) -> Result<Arc<PluginConfig>> {
        let config = validate(&serde_json::to_value(&config)?);
        self.store.save(&config).await?;
        let config = self.store.replace(config).await;
        self.refresh();
        Ok(config)
    }

    /// Re-read persisted data after an outside change, then re-render.
    ///
    /// A file that cannot be read or parsed, or is gone, is usually caught
    /// mid-write: the current configuration stays and nothing re-renders.
    pub async fn reload(&self) -> Arc<PluginConfig> {
        match self.store.try_load().await {
            Ok(Some(config)) => {
                let config = self.store.replace(config).await;
                log::info!("Reloaded {} language mappings", config.mappings.len());
                self.refresh();
                config
            }
            Ok(None) => {
                log::warn!("Plugin data file is gone, keeping current mappings");
                self.store.snapshot().await
            }
            Err(e) => {
                log::warn!("Failed to reload plugin data, keeping current mappings: {:#}", e);
                self.store.snapshot().await
            }
        }
    }

    /// Ask every markdown view to render again
    pub fn refresh(&self) {
        let views = self.host.workspace.markdown_views();
        log::debug!("Refreshing {} markdown views", views.len());
        for view in views {
            view.rerender();
        }
    }
}
