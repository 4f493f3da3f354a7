//! Workspace validation — does a directory hold Terraform configuration?

use std::path::{Path, PathBuf};

/// List `*.tf` files directly inside `dir` (non-recursive).
///
/// Unreadable or nonexistent directories yield an empty list.
pub fn tf_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "tf"))
        .collect();
    files.sort();
    files
}

/// Validate that `path` is a usable Terraform workspace.
///
/// A workspace is valid iff it is an existing directory containing at
/// least one `*.tf` file, or its immediate parent contains one (covers
/// being pointed at a file inside the workspace). Symlinks and
/// unreadable paths fail closed.
pub fn validate_workspace(path: &Path) -> bool {
    let Ok(meta) = std::fs::symlink_metadata(path) else {
        tracing::debug!(path = %path.display(), "workspace path does not exist");
        return false;
    };
    if !meta.is_dir() {
        tracing::debug!(path = %path.display(), "workspace path is not a directory");
        return false;
    }

    let direct = tf_files(path);
    if !direct.is_empty() {
        tracing::debug!(path = %path.display(), count = direct.len(), "tf files in workspace");
        return true;
    }

    match path.parent() {
        Some(parent) => !tf_files(parent).is_empty(),
        None => false,
    }
}
