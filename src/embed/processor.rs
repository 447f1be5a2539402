//! Embed Processor
//!
//! Runs once per rendered fragment. Every matched placeholder gets its own
//! task; tasks are started together and finish in any order. A task runs to
//! a terminal state (converted, failed, abandoned or detached) exactly once:
//! there is no retry and no cancellation. A re-render starts a new pass on a
//! new tree.
//!
//! Loading badges go in when the pass starts, so they are already visible
//! when `process` returns and can be removed even if a task panics.

use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinHandle;

use crate::dom::{NodeId, SharedDocument};
use crate::embed::block::{self, BlockContent};
use crate::embed::resolver::resolve;
use crate::embed::selector::{EmbedSelector, REFERENCE_ATTR};
use crate::host::{FileRef, Highlighter, Vault, Workspace};
use crate::settings::PluginConfig;

/// Failure of a single embed
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EmbedError {
    /// No active file to resolve against; the embed is skipped silently
    #[error("no active file")]
    PreconditionMissing,
    #[error("file not found: {reference}")]
    ResolutionFailed { reference: String },
    #[error("{message}")]
    ReadFailed { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedPhase {
    Loading,
    Resolved,
    Failed,
}

/// One placeholder being processed
#[derive(Debug, Clone)]
pub struct EmbedNode {
    pub source: NodeId,
    pub file_path: String,
    pub resolved: Option<FileRef>,
    pub phase: EmbedPhase,
}

impl EmbedNode {
    fn new(source: NodeId, file_path: String) -> Self {
        Self {
            source,
            file_path,
            resolved: None,
            phase: EmbedPhase::Loading,
        }
    }
}

/// Terminal state of one placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum EmbedOutcome {
    /// Replaced by `node`, a converted block for `file`
    Converted {
        source: NodeId,
        node: NodeId,
        file: FileRef,
    },
    /// Replaced by an inline error marker
    Failed { source: NodeId, message: String },
    /// Skipped without touching the placeholder
    Abandoned { source: NodeId },
    /// The placeholder left the tree before the task finished
    Detached { source: NodeId },
}

/// A started task and the loading badge it owns
#[derive(Debug)]
struct PendingEmbed {
    task: JoinHandle<EmbedOutcome>,
    badge: Option<NodeId>,
}

/// Tasks of one pass. Dropping the handle does not stop them.
#[derive(Debug, Default)]
pub struct PassHandle {
    doc: Option<SharedDocument>,
    tasks: Vec<PendingEmbed>,
}

impl PassHandle {
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Wait for every task; outcomes are in placeholder order.
    ///
    /// A task that panicked has no outcome. Its loading badge is removed.
    pub async fn settled(self) -> Vec<EmbedOutcome> {
        let mut outcomes = Vec::with_capacity(self.tasks.len());
        for pending in self.tasks {
            match pending.task.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    log::error!("Embed task panicked: {}", e);
                    if let (Some(doc), Some(badge)) = (&self.doc, pending.badge) {
                        doc.lock().await.detach(badge);
                    }
                }
            }
        }
        outcomes
    }
}

#[derive(Clone)]
pub struct EmbedProcessor {
    config: Arc<PluginConfig>,
    vault: Arc<dyn Vault>,
    workspace: Arc<dyn Workspace>,
    highlighter: Arc<dyn Highlighter>,
}

impl EmbedProcessor {
    /// Processor for one pass, reading `config` throughout
    pub fn new(
        config: Arc<PluginConfig>,
        vault: Arc<dyn Vault>,
        workspace: Arc<dyn Workspace>,
        highlighter: Arc<dyn Highlighter>,
    ) -> Self {
        Self {
            config,
            vault,
            workspace,
            highlighter,
        }
    }

    /// Start a task for every placeholder under `root`
    pub async fn process(&self, doc: &SharedDocument, root: NodeId) -> PassHandle {
        let selector = EmbedSelector::build(&self.config.extensions());
        if selector.is_empty() {
            return PassHandle::default();
        }

        let mut d = doc.lock().await;
        let placeholders = d.query_all(root, &selector);
        if placeholders.is_empty() {
            return PassHandle::default();
        }
        log::debug!("Processing {} embeds", placeholders.len());

        let tasks = placeholders
            .into_iter()
            .map(|source| {
                let Some(file_path) = d
                    .element(source)
                    .and_then(|el| el.attr(REFERENCE_ATTR))
                    .map(str::to_string)
                else {
                    return PendingEmbed {
                        task: tokio::spawn(async move { EmbedOutcome::Abandoned { source } }),
                        badge: None,
                    };
                };
                let badge = block::loading_badge(&mut d);
                d.insert_before(source, badge);

                let processor = self.clone();
                let doc = doc.clone();
                PendingEmbed {
                    task: tokio::spawn(async move {
                        processor.run(doc, source, file_path, badge).await
                    }),
                    badge: Some(badge),
                }
            })
            .collect();

        PassHandle {
            doc: Some(doc.clone()),
            tasks,
        }
    }

    async fn run(
        &self,
        doc: SharedDocument,
        source: NodeId,
        file_path: String,
        badge: NodeId,
    ) -> EmbedOutcome {
        let mut node = EmbedNode::new(source, file_path);
        let outcome = self.convert(&doc, &mut node).await;

        doc.lock().await.detach(badge);
        outcome
    }

    async fn convert(&self, doc: &SharedDocument, node: &mut EmbedNode) -> EmbedOutcome {
        match self.fetch(node).await {
            Ok((file, content)) => self.attach(doc, node, file, content).await,
            Err(EmbedError::PreconditionMissing) => {
                log::debug!("No active file, leaving '{}' alone", node.file_path);
                EmbedOutcome::Abandoned {
                    source: node.source,
                }
            }
            Err(error) => {
                node.phase = EmbedPhase::Failed;
                self.fail(doc, node, error).await
            }
        }
    }

    /// Resolve and read the referenced file
    async fn fetch(&self, node: &mut EmbedNode) -> Result<(FileRef, String), EmbedError> {
        let active = self
            .workspace
            .active_file()
            .ok_or(EmbedError::PreconditionMissing)?;

        let files = self.vault.list_files();
        let file = resolve(&node.file_path, &active, &files).ok_or_else(|| {
            EmbedError::ResolutionFailed {
                reference: node.file_path.clone(),
            }
        })?;
        node.resolved = Some(file.clone());
        node.phase = EmbedPhase::Resolved;

        let content = self
            .vault
            .read(&file)
            .await
            .map_err(|e| EmbedError::ReadFailed {
                message: format!("{:#}", e),
            })?;

        Ok((file, content))
    }

    /// Highlighted content for `file`, or plain text when the grammar is unknown
    fn render_content(&self, file: &FileRef, content: &str) -> (String, BlockContent) {
        let grammar = self.config.grammar_for(&file.extension).to_string();
        if self.highlighter.has_grammar(&grammar) {
            let markup = self.highlighter.highlight(content, &grammar);
            (grammar, BlockContent::Highlighted(markup))
        } else {
            log::warn!(
                "No grammar '{}' for {}, showing plain text",
                grammar,
                file.path
            );
            (grammar, BlockContent::Plain(content.to_string()))
        }
    }

    async fn attach(
        &self,
        doc: &SharedDocument,
        node: &EmbedNode,
        file: FileRef,
        content: String,
    ) -> EmbedOutcome {
        let (grammar, rendered) = self.render_content(&file, &content);

        let mut d = doc.lock().await;
        if d.parent(node.source).is_none() {
            log::debug!("Placeholder for '{}' is gone, dropping it", node.file_path);
            return EmbedOutcome::Detached {
                source: node.source,
            };
        }

        let converted = block::converted_block(&mut d, &content, &grammar, rendered);
        let replacement = block::replacement(&mut d, node.source, &converted, &file);
        d.replace(node.source, replacement);
        self.highlighter.highlight_all(&mut d);

        log::debug!("Embedded {} as {}", file.path, grammar);
        EmbedOutcome::Converted {
            source: node.source,
            node: replacement,
            file,
        }
    }

    async fn fail(&self, doc: &SharedDocument, node: &EmbedNode, error: EmbedError) -> EmbedOutcome {
        let message = error.to_string();
        log::warn!("Embed '{}' failed: {}", node.file_path, message);

        let mut d = doc.lock().await;
        let marker = block::error_marker(&mut d, &message);
        if !d.replace(node.source, marker) {
            return EmbedOutcome::Detached {
                source: node.source,
            };
        }

        EmbedOutcome::Failed {
            source: node.source,
            message,
        }
    }
}
