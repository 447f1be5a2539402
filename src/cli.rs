//! Command line host
//!
//! Runs the plugin against a directory of files: `render` turns a Markdown
//! note into HTML with its code embeds converted, `mappings` edits the
//! extension table.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tokio::sync::mpsc;

use crate::config::{Command, Config, MappingsCommand, RenderArgs};
use crate::embed::EmbedOutcome;
use crate::highlight::SyntectHighlighter;
use crate::host::MarkdownView;
use crate::host::fs::FsVault;
use crate::host::memory::{MemoryClipboard, RecordingWorkspace};
use crate::markdown::render_document;
use crate::plugin::{CodeEmbedPlugin, Host};
use crate::settings::{ConfigStore, ConfigWatcher, FileConfigPersistence, SettingsDraft};

/// Run the command in `config`
pub async fn run(config: Config) -> Result<()> {
    match &config.command {
        Command::Render(args) => render(&config, args).await,
        Command::Mappings(command) => mappings(&config, command).await,
    }
}

/// View that turns a re-render request into a message for the render loop
struct ChannelView {
    tx: mpsc::UnboundedSender<()>,
}

impl MarkdownView for ChannelView {
    fn rerender(&self) {
        let _ = self.tx.send(());
    }
}

async fn render(config: &Config, args: &RenderArgs) -> Result<()> {
    let document = tokio::fs::canonicalize(&args.document)
        .await
        .with_context(|| format!("Document not found: {}", args.document.display()))?;
    let vault_root = match &args.vault {
        Some(dir) => tokio::fs::canonicalize(dir)
            .await
            .with_context(|| format!("Vault not found: {}", dir.display()))?,
        None => document
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };

    let vault = FsVault::scan(&vault_root).await?;
    let active = vault.file_for(&document);
    if active.is_none() {
        log::warn!(
            "{} is not inside the vault {}, embeds will not be resolved",
            document.display(),
            vault.root().display()
        );
    }

    let (tx, mut rerender) = mpsc::unbounded_channel();
    let workspace = RecordingWorkspace::new(active).with_view(Arc::new(ChannelView { tx }));
    let host = Host {
        vault: Arc::new(vault),
        workspace: Arc::new(workspace),
        highlighter: Arc::new(SyntectHighlighter::new()),
        clipboard: Arc::new(MemoryClipboard::new()),
    };
    let plugin = CodeEmbedPlugin::new(
        Arc::new(FileConfigPersistence::new(&config.config_path)),
        host,
    );
    plugin.on_load().await;

    let html = render_once(&plugin, &document, args.expand).await?;
    println!("{html}");

    if !args.watch {
        return Ok(());
    }

    let mut watcher = ConfigWatcher::new(&config.config_path)?;
    log::info!("Watching {} for changes", config.config_path.display());
    watch(&plugin, &document, args.expand, &mut watcher, &mut rerender, |html| {
        println!("{html}")
    })
    .await;

    Ok(())
}

/// Reload on data file changes and render again on request, until either
/// source closes. A failed render is logged and the loop keeps waiting.
async fn watch(
    plugin: &CodeEmbedPlugin,
    document: &Path,
    expand: bool,
    watcher: &mut ConfigWatcher,
    rerender: &mut mpsc::UnboundedReceiver<()>,
    mut emit: impl FnMut(String),
) {
    loop {
        tokio::select! {
            changed = watcher.changed() => {
                if changed.is_none() {
                    break;
                }
                plugin.reload().await;
            }
            request = rerender.recv() => {
                if request.is_none() {
                    break;
                }
                match render_once(plugin, document, expand).await {
                    Ok(html) => emit(html),
                    Err(e) => log::error!("Failed to render {}: {:#}", document.display(), e),
                }
            }
        }
    }
}

/// Render `document` and run one embed pass over it
async fn render_once(plugin: &CodeEmbedPlugin, document: &Path, expand: bool) -> Result<String> {
    let markdown = tokio::fs::read_to_string(document)
        .await
        .with_context(|| format!("Failed to read {}", document.display()))?;

    let doc = render_document(&markdown).into_shared();
    let root = doc.lock().await.root();

    let outcomes = plugin.post_process(&doc, root).await.settled().await;
    let converted = outcomes
        .iter()
        .filter(|o| matches!(o, EmbedOutcome::Converted { .. }))
        .count();
    log::info!("Converted {} of {} embeds", converted, outcomes.len());

    if expand {
        plugin.controls(&doc).expand_all().await;
    }

    let html = doc.lock().await.inner_html(root);
    Ok(html)
}

async fn mappings(config: &Config, command: &MappingsCommand) -> Result<()> {
    let store = ConfigStore::new(Arc::new(FileConfigPersistence::new(&config.config_path)));
    let current = store.load().await;

    let updated = match command {
        MappingsCommand::List => {
            for mapping in &current.mappings {
                println!(
                    "{}\t{}\t{}",
                    mapping.extension, mapping.grammar_id, mapping.display_name
                );
            }
            return Ok(());
        }
        MappingsCommand::Add { extension, grammar } => {
            if grammar.trim().is_empty() {
                bail!("A grammar is required");
            }
            let mut draft = SettingsDraft::new(&current);
            draft.push_mapping(extension, grammar)?;
            draft.into_config()?
        }
        MappingsCommand::Remove { extension } => {
            let mut draft = SettingsDraft::new(&current);
            let removed = draft.remove_extension(extension)?;
            log::info!("Removing .{} -> {}", removed.extension, removed.grammar_id);
            draft.into_config()?
        }
    };

    store.save(&updated).await?;
    store.replace(updated).await;
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryVault;
    use tempfile::TempDir;
    use tokio::sync::mpsc::error::TryRecvError;

    fn plugin(dir: &Path) -> CodeEmbedPlugin {
        let host = Host {
            vault: Arc::new(MemoryVault::new()),
            workspace: Arc::new(RecordingWorkspace::new(None)),
            highlighter: Arc::new(SyntectHighlighter::new()),
            clipboard: Arc::new(MemoryClipboard::new()),
        };
        CodeEmbedPlugin::new(
            Arc::new(FileConfigPersistence::new(dir.join("data.json"))),
            host,
        )
    }

    #[tokio::test]
    async fn test_watch_survives_failed_render() {
        let dir = TempDir::new().unwrap();
        let plugin = plugin(dir.path());
        plugin.on_load().await;
        let mut watcher = ConfigWatcher::new(&dir.path().join("data.json")).unwrap();

        let (tx, mut rerender) = mpsc::unbounded_channel();
        tx.send(()).unwrap();
        tx.send(()).unwrap();
        drop(tx);

        let mut rendered = Vec::new();
        let missing = dir.path().join("gone.md");
        watch(&plugin, &missing, false, &mut watcher, &mut rerender, |html| {
            rendered.push(html)
        })
        .await;

        // Both requests were handled even though each render failed
        assert!(rendered.is_empty());
        assert_eq!(rerender.try_recv(), Err(TryRecvError::Disconnected));
    }

    #[tokio::test]
    async fn test_watch_emits_rendered_document() {
        let dir = TempDir::new().unwrap();
        let document = dir.path().join("doc.md");
        tokio::fs::write(&document, "# Title").await.unwrap();
        let plugin = plugin(dir.path());
        plugin.on_load().await;
        let mut watcher = ConfigWatcher::new(&dir.path().join("data.json")).unwrap();

        let (tx, mut rerender) = mpsc::unbounded_channel();
        tx.send(()).unwrap();
        drop(tx);

        let mut rendered = Vec::new();
        watch(&plugin, &document, false, &mut watcher, &mut rerender, |html| {
            rendered.push(html)
        })
        .await;

        assert_eq!(rendered, vec!["<h1>Title</h1>".to_string()]);
    }
}
