//! Shared fixtures for the integration tests
#![allow(dead_code)]

use std::sync::Arc;

use code_embed::dom::html::escape_text;
use code_embed::dom::{Document, NodeId, SharedDocument};
use code_embed::embed::EmbedProcessor;
use code_embed::host::{FileRef, Highlighter, RecordingWorkspace, Vault};
use code_embed::settings::PluginConfig;

/// Highlighter that knows python only and wraps text in a marker span
pub struct MarkerHighlighter;

impl Highlighter for MarkerHighlighter {
    fn highlight(&self, text: &str, grammar: &str) -> String {
        format!(r#"<span class="hl-{grammar}">{}</span>"#, escape_text(text))
    }

    fn has_grammar(&self, grammar: &str) -> bool {
        grammar == "python"
    }
}

/// A rendered fragment: `root > p > span[src]` for every reference
pub struct Fragment {
    pub doc: SharedDocument,
    pub root: NodeId,
    pub placeholders: Vec<NodeId>,
}

pub fn fragment(references: &[&str]) -> Fragment {
    let mut doc = Document::new();
    let root = doc.root();
    let mut placeholders = Vec::new();

    for reference in references {
        let p = doc.create_element("p");
        doc.append_child(root, p);
        let span = doc.create_element("span");
        if let Some(el) = doc.element_mut(span) {
            el.add_class("internal-embed");
            el.set_attr("src", *reference);
            el.set_attr("alt", *reference);
        }
        doc.append_child(p, span);
        placeholders.push(span);
    }

    Fragment {
        doc: doc.into_shared(),
        root,
        placeholders,
    }
}

pub fn processor(
    config: PluginConfig,
    vault: impl Vault + 'static,
    workspace: Arc<RecordingWorkspace>,
) -> EmbedProcessor {
    EmbedProcessor::new(
        Arc::new(config),
        Arc::new(vault),
        workspace,
        Arc::new(MarkerHighlighter),
    )
}

pub fn workspace(active: &str) -> Arc<RecordingWorkspace> {
    Arc::new(RecordingWorkspace::new(Some(FileRef::new(active))))
}

/// Elements under `root` carrying `class`
pub fn with_class(doc: &Document, root: NodeId, class: &str) -> Vec<NodeId> {
    doc.query_all(root, &|el: &code_embed::dom::Element| el.has_class(class))
}
