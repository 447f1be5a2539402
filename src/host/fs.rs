//! Filesystem-backed vault.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::{FileRef, Vault};

/// Vault over a directory tree, scanned once at construction
#[derive(Debug, Clone)]
pub struct FsVault {
    root: PathBuf,
    files: Vec<FileRef>,
}

impl FsVault {
    /// Scan `root` recursively. Hidden files and directories are skipped.
    pub async fn scan(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let mut files = Vec::new();
        let mut pending = vec![root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir)
                .await
                .with_context(|| format!("Failed to read vault directory: {}", dir.display()))?;

            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                let hidden = path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with('.'));
                if hidden {
                    continue;
                }

                let file_type = entry.file_type().await?;
                if file_type.is_dir() {
                    pending.push(path);
                } else if file_type.is_file() {
                    if let Some(relative) = vault_path(&root, &path) {
                        files.push(FileRef::new(relative));
                    }
                }
            }
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        log::debug!("Scanned {} files under {}", files.len(), root.display());

        Ok(Self { root, files })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Vault entry for a path on disk, if it lies inside the vault
    pub fn file_for(&self, path: &Path) -> Option<FileRef> {
        let relative = vault_path(&self.root, path)?;
        self.files.iter().find(|f| f.path == relative).cloned()
    }
}

/// `/`-separated path of `path` relative to `root`
fn vault_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<&str> = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    Some(parts.join("/"))
}

#[async_trait::async_trait]
impl Vault for FsVault {
    fn list_files(&self) -> Vec<FileRef> {
        self.files.clone()
    }

    async fn read(&self, file: &FileRef) -> Result<String> {
        let path = self.root.join(&file.path);
        tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", file.path))
    }
}
