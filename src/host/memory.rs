//! In-memory collaborators.
//!
//! Used by the test suite, and by hosts that keep their files in memory.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Result, anyhow};

use super::{Clipboard, FileRef, MarkdownView, Vault, Workspace};

/// Vault holding file contents in memory
#[derive(Debug, Default)]
pub struct MemoryVault {
    files: Vec<FileRef>,
    contents: HashMap<String, String>,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a readable file
    #[must_use]
    pub fn with_file(mut self, path: &str, content: &str) -> Self {
        self.files.push(FileRef::new(path));
        self.contents.insert(path.to_string(), content.to_string());
        self
    }

    /// Add a file that is listed but fails to read
    #[must_use]
    pub fn with_unreadable_file(mut self, path: &str) -> Self {
        self.files.push(FileRef::new(path));
        self
    }
}

#[async_trait::async_trait]
impl Vault for MemoryVault {
    fn list_files(&self) -> Vec<FileRef> {
        self.files.clone()
    }

    async fn read(&self, file: &FileRef) -> Result<String> {
        self.contents
            .get(&file.path)
            .cloned()
            .ok_or_else(|| anyhow!("cannot read {}", file.path))
    }
}

/// Clipboard that remembers what was written; can be told to fail
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    text: Mutex<Option<String>>,
    writes: Mutex<usize>,
    failing: bool,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn text(&self) -> Option<String> {
        self.text
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn writes(&self) -> usize {
        *self.writes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait::async_trait]
impl Clipboard for MemoryClipboard {
    async fn write_text(&self, text: &str) -> Result<()> {
        if self.failing {
            return Err(anyhow!("clipboard unavailable"));
        }
        *self.text.lock().unwrap_or_else(PoisonError::into_inner) = Some(text.to_string());
        *self.writes.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(())
    }
}

/// Workspace with a fixed active file that records opened files
#[derive(Default)]
pub struct RecordingWorkspace {
    active: Option<FileRef>,
    opened: Mutex<Vec<FileRef>>,
    views: Vec<Arc<dyn MarkdownView>>,
}

impl RecordingWorkspace {
    pub fn new(active: Option<FileRef>) -> Self {
        Self {
            active,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_view(mut self, view: Arc<dyn MarkdownView>) -> Self {
        self.views.push(view);
        self
    }

    pub fn opened(&self) -> Vec<FileRef> {
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait::async_trait]
impl Workspace for RecordingWorkspace {
    fn active_file(&self) -> Option<FileRef> {
        self.active.clone()
    }

    async fn open_file(&self, file: &FileRef) {
        log::info!("Opening {}", file.path);
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(file.clone());
    }

    fn markdown_views(&self) -> Vec<Arc<dyn MarkdownView>> {
        self.views.clone()
    }
}
