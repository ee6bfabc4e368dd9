//! Removal of locally cached LanguageTool artifacts
//!
//! A half-downloaded bundle ("File is not a zip file") keeps the engine from
//! starting until the cache is wiped.

use std::fs;
use std::path::Path;

/// Remove `*.zip` files and `LanguageTool*` directories directly under
/// `cache_dir`. Returns true if at least one artifact was removed.
pub fn clear_engine_cache(cache_dir: &Path) -> bool {
    let entries = match fs::read_dir(cache_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No LanguageTool cache at {}", cache_dir.display());
            return false;
        }
        Err(e) => {
            tracing::warn!("Error clearing cache {}: {}", cache_dir.display(), e);
            return false;
        }
    };

    tracing::info!("Clearing LanguageTool cache at: {}", cache_dir.display());

    let mut removed = 0usize;
    for entry in entries.flatten() {
        let path = entry.path();
        let name = entry.file_name();
        let name = name.to_string_lossy();

        let result = if path.is_dir() {
            if !name.starts_with("LanguageTool") {
                continue;
            }
            fs::remove_dir_all(&path)
        } else if path.extension().is_some_and(|ext| ext == "zip") {
            fs::remove_file(&path)
        } else {
            continue;
        };

        match result {
            Ok(()) => {
                tracing::info!("  Removed: {}", path.display());
                removed += 1;
            }
            Err(e) => tracing::warn!("  Failed to remove {}: {}", path.display(), e),
        }
    }

    removed > 0
}
