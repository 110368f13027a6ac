//! Input file discovery
//!
//! Recursive walk of the input directory keeping files (or links to files) whose
//! lowercase extension is in the allowed set. Results are sorted so runs over
//! the same tree process files in the same order.

use crate::error::{CliError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// All matching files under `root`, sorted.
///
/// `extensions` must already be normalized (lowercase, leading dot).
pub fn discover_files(root: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(CliError::InvalidDirectory(root.display().to_string()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        match entry {
            // Symlinked files count; symlinked directories are not descended
            Ok(entry) if entry.path().is_file() => {
                if has_allowed_extension(entry.path(), extensions) {
                    files.push(entry.into_path());
                }
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Skipping unreadable entry"),
        }
    }

    files.sort();
    debug!(root = %root.display(), count = files.len(), "Discovered files");
    Ok(files)
}

/// Case-insensitive extension check against `.ext` entries
pub fn has_allowed_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
        .is_some_and(|ext| extensions.iter().any(|allowed| *allowed == ext))
}
