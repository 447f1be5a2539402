//! Reference resolution.
//!
//! A reference is relative to the directory of the active file. Exact
//! matches win; otherwise the first known file whose path ends with the
//! reference is used.

use std::sync::LazyLock;

use regex::Regex;

use crate::host::FileRef;

static REPEATED_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/+").expect("valid separator pattern"));

/// Join `dir` and `reference`, collapse repeated separators and resolve
/// `.` and `..` segments. The result has no leading separator.
pub fn join_path(dir: &str, reference: &str) -> String {
    let joined = format!("{}/{}", dir, reference);
    let collapsed = REPEATED_SEPARATORS.replace_all(&joined, "/");

    let mut segments: Vec<&str> = Vec::new();
    for segment in collapsed.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Find the file `reference` points at from `active`
pub fn resolve(reference: &str, active: &FileRef, files: &[FileRef]) -> Option<FileRef> {
    let reference = reference.trim();
    if reference.is_empty() {
        return None;
    }

    let full_path = join_path(active.parent(), reference);
    if let Some(file) = files.iter().find(|f| f.path == full_path) {
        log::debug!("Resolved '{}' to {} (relative)", reference, file.path);
        return Some(file.clone());
    }

    let suffix = format!("/{}", reference.trim_start_matches('/'));
    let bare = &suffix[1..];
    let found = files
        .iter()
        .find(|f| f.path.ends_with(&suffix) || f.path == bare)
        .cloned();

    match &found {
        Some(file) => log::debug!("Resolved '{}' to {} (suffix)", reference, file.path),
        None => log::debug!("No file matches '{}'", reference),
    }
    found
}
