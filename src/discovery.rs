//! Content file discovery
//!
//! Walks the configured content directory and collects files whose
//! extension is on the allow-list. The walk is recursive, skips hidden
//! entries, and sorts results lexicographically so a batch over the same
//! tree is deterministic from run to run.

use crate::config::BatchConfig;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Collect checkable files under `config.content_dir`, sorted by path
pub fn discover_files(config: &BatchConfig) -> Result<Vec<PathBuf>> {
    let root = &config.content_dir;
    if !root.is_dir() {
        return Err(Error::Config {
            message: format!("content directory does not exist: {}", root.display()),
            key: Some("CONTENT_CHECK_CONTENT_DIR".into()),
        });
    }

    let mut files = Vec::new();
    // Depth 0 is the configured root itself; its name may legitimately
    // start with a dot, only entries below it are subject to hiding
    for entry in WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.path()))
    {
        let entry = entry.map_err(|e| Error::Other(format!("walk failed: {e}")))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if has_allowed_extension(entry.path(), &config.allowed_extensions) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    tracing::debug!(
        root = %root.display(),
        count = files.len(),
        "Discovered content files"
    );
    Ok(files)
}

/// Whether a path's extension is on the allow-list (case-insensitive)
pub fn has_allowed_extension(path: &Path, allowed: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            allowed.iter().any(|a| a.eq_ignore_ascii_case(&ext))
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}
