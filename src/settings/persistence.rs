//! Plugin data persistence.
//!
//! The plugin data file is JSON (`data.json`) or TOML, chosen by its
//! extension. The store only ever sees an untrusted [`serde_json::Value`];
//! validation happens in [`super::schema::validate`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde_json::Value;
use tokio::sync::mpsc;

use super::schema::PluginConfig;

/// Where the plugin configuration lives between sessions
#[async_trait::async_trait]
pub trait ConfigPersistence: Send + Sync {
    /// Saved data, or `None` when nothing was saved yet
    async fn load(&self) -> Result<Option<Value>>;

    async fn save(&self, config: &PluginConfig) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DataFormat {
    Json,
    Toml,
}

impl DataFormat {
    fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|s| s.to_str()) {
            Some("toml") => DataFormat::Toml,
            _ => DataFormat::Json,
        }
    }
}

/// Plugin data stored in a single file
#[derive(Debug, Clone)]
pub struct FileConfigPersistence {
    path: PathBuf,
    format: DataFormat,
}

impl FileConfigPersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let format = DataFormat::for_path(&path);
        Self { path, format }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse(&self, content: &str) -> Result<Value> {
        match self.format {
            DataFormat::Json => serde_json::from_str(content)
                .with_context(|| format!("Failed to parse JSON: {}", self.path.display())),
            DataFormat::Toml => {
                let table: toml::Table = toml::from_str(content)
                    .with_context(|| format!("Failed to parse TOML: {}", self.path.display()))?;
                serde_json::to_value(table).context("Failed to convert TOML data")
            }
        }
    }

    fn render(&self, config: &PluginConfig) -> Result<String> {
        match self.format {
            DataFormat::Json => {
                serde_json::to_string_pretty(config).context("Failed to serialize config")
            }
            DataFormat::Toml => toml::to_string(config).context("Failed to serialize config"),
        }
    }
}

#[async_trait::async_trait]
impl ConfigPersistence for FileConfigPersistence {
    async fn load(&self) -> Result<Option<Value>> {
        if !tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            return Ok(None);
        }

        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read config file: {}", self.path.display()))?;

        if content.trim().is_empty() {
            return Ok(None);
        }

        self.parse(&content).map(Some)
    }

    async fn save(&self, config: &PluginConfig) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
        }

        let content = self.render(config)?;
        tokio::fs::write(&self.path, content)
            .await
            .with_context(|| format!("Failed to write config file: {}", self.path.display()))?;

        log::info!("Saved configuration to {}", self.path.display());
        Ok(())
    }
}

/// Watches the config file and yields a unit for every change to it.
///
/// The watcher stops when this value is dropped.
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::UnboundedReceiver<()>,
}

impl ConfigWatcher {
    /// Watch `path`. Its parent directory is watched so that editors that
    /// replace the file on save are still seen.
    pub fn new(path: &Path) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let file_name = path.file_name().map(|name| name.to_os_string());

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| match res {
                Ok(event) => {
                    if let EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) =
                        event.kind
                    {
                        let touches_config = event
                            .paths
                            .iter()
                            .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
                        if touches_config {
                            let _ = tx.send(());
                        }
                    }
                }
                Err(e) => {
                    log::error!("Config file watcher error: {}", e);
                }
            },
            Config::default().with_poll_interval(Duration::from_secs(1)),
        )?;

        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch {}", dir.display()))?;

        Ok(Self {
            _watcher: watcher,
            rx,
        })
    }

    /// Wait for the next change
    pub async fn changed(&mut self) -> Option<()> {
        self.rx.recv().await
    }
}
