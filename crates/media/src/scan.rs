use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Collect the files to caption under `root`.
///
/// A file path yields itself. A directory is walked recursively, skipping
/// hidden directories, and the result is sorted by path.
pub fn collect_media_files(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        anyhow::bail!("Path does not exist: {}", root.display());
    }

    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| {
            // Skip hidden directories (starting with .), but not the root itself
            if e.file_type().is_dir() && e.path() != root {
                !e.file_name()
                    .to_str()
                    .map(|s| s.starts_with('.'))
                    .unwrap_or(false)
            } else {
                true
            }
        })
    {
        match entry {
            Ok(entry) if entry.file_type().is_file() => files.push(entry.into_path()),
            Ok(_) => continue,
            Err(e) => {
                warn!("Error accessing directory entry: {}", e);
                continue;
            }
        }
    }

    files.sort();
    debug!("Found {} files under {}", files.len(), root.display());
    Ok(files)
}
