//! Host Collaborators
//!
//! Everything the pipeline needs from the editor it runs inside: the file
//! list and file contents, the active document, a highlighting engine and a
//! clipboard. The traits are object safe so a host can hand in
//! `Arc<dyn ...>` implementations.

pub mod fs;
pub mod memory;

use std::sync::Arc;

use anyhow::Result;

use crate::dom::{Document, NodeKind};

pub use fs::FsVault;
pub use memory::{MemoryClipboard, MemoryVault, RecordingWorkspace};

/// A file known to the vault
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileRef {
    /// Vault-relative, `/`-separated
    pub path: String,
    /// Text after the last dot of the file name, without the dot
    pub extension: String,
}

impl FileRef {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let extension = path
            .rsplit('/')
            .next()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.to_string())
            .unwrap_or_default();
        Self { path, extension }
    }

    /// Directory containing the file; empty at the vault root
    pub fn parent(&self) -> &str {
        self.path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
    }
}

/// Read-only view of the files the host knows about
#[async_trait::async_trait]
pub trait Vault: Send + Sync {
    fn list_files(&self) -> Vec<FileRef>;

    async fn read(&self, file: &FileRef) -> Result<String>;
}

/// A rendered markdown view that can be asked to render again
pub trait MarkdownView: Send + Sync {
    fn rerender(&self);
}

/// Active-document context
#[async_trait::async_trait]
pub trait Workspace: Send + Sync {
    fn active_file(&self) -> Option<FileRef>;

    /// Open `file` in the main view
    async fn open_file(&self, file: &FileRef);

    fn markdown_views(&self) -> Vec<Arc<dyn MarkdownView>>;
}

/// System clipboard
#[async_trait::async_trait]
pub trait Clipboard: Send + Sync {
    async fn write_text(&self, text: &str) -> Result<()>;
}

/// Syntax highlighting engine
pub trait Highlighter: Send + Sync {
    /// Highlighted HTML for `text`. Only called for grammars the registry knows.
    fn highlight(&self, text: &str, grammar: &str) -> String;

    fn has_grammar(&self, grammar: &str) -> bool;

    /// Highlight every `code.language-*` element of the document whose
    /// content is still plain text. Already highlighted code is left alone.
    fn highlight_all(&self, doc: &mut Document) {
        let root = doc.root();
        for id in doc.descendants(root) {
            let grammar = match doc.kind(id) {
                NodeKind::Element(el) if el.tag == "code" => match el.language() {
                    Some(grammar) => grammar.to_string(),
                    None => continue,
                },
                _ => continue,
            };
            if !self.has_grammar(&grammar) {
                continue;
            }
            let Some(text) = doc.plain_text(id) else {
                continue;
            };
            if text.is_empty() {
                continue;
            }
            let markup = self.highlight(&text, &grammar);
            doc.set_markup(id, markup);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Brackets;

    impl Highlighter for Brackets {
        fn highlight(&self, text: &str, grammar: &str) -> String {
            format!("[{grammar}:{text}]")
        }

        fn has_grammar(&self, grammar: &str) -> bool {
            grammar == "python"
        }
    }

    #[test]
    fn test_file_ref_parts() {
        let file = FileRef::new("notes/sub/target.py");
        assert_eq!(file.extension, "py");
        assert_eq!(file.parent(), "notes/sub");

        let root_file = FileRef::new("README");
        assert_eq!(root_file.extension, "");
        assert_eq!(root_file.parent(), "");

        let dotted_dir = FileRef::new("v1.2/Makefile");
        assert_eq!(dotted_dir.extension, "");
    }

    #[test]
    fn test_highlight_all_skips_highlighted_and_unknown() {
        let mut doc = Document::new();
        let root = doc.root();

        let plain = doc.create_element("code");
        doc.element_mut(plain).unwrap().add_class("language-python");
        doc.set_text(plain, "x = 1");

        let done = doc.create_element("code");
        doc.element_mut(done).unwrap().add_class("language-python");
        doc.set_markup(done, "<span>y</span>");

        let unknown = doc.create_element("code");
        doc.element_mut(unknown).unwrap().add_class("language-glsl");
        doc.set_text(unknown, "void main() {}");

        for id in [plain, done, unknown] {
            doc.append_child(root, id);
        }

        Brackets.highlight_all(&mut doc);

        assert_eq!(doc.inner_html(plain), "[python:x = 1]");
        assert_eq!(doc.inner_html(done), "<span>y</span>");
        assert_eq!(doc.inner_html(unknown), "void main() {}");
    }
}
