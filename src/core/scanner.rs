//! Local side scanning.

use std::path::Path;

use chrono::{DateTime, Local};
use walkdir::WalkDir;

use crate::core::snapshot::{normalize_key, Snapshot};
use crate::error::SyncError;

/// Walk `root` and capture (relative path, mtime) for every regular file.
///
/// Directories, symlinks, and special files are skipped silently. Any
/// traversal error aborts the scan so a run never diffs against
/// incomplete state.
pub fn scan_local(root: &Path) -> Result<Snapshot, SyncError> {
    let scan_err = |detail: String| SyncError::LocalScan {
        root: root.to_path_buf(),
        detail,
    };

    let mut snapshot = Snapshot::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|e| scan_err(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let metadata = entry.metadata().map_err(|e| scan_err(e.to_string()))?;
        let modified = metadata
            .modified()
            .map_err(|e| scan_err(format!("{}: {e}", entry.path().display())))?;

        let rel = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| scan_err(e.to_string()))?;
        let rel = rel
            .to_str()
            .ok_or_else(|| scan_err(format!("non-UTF-8 path: {}", entry.path().display())))?;

        let mtime = DateTime::<Local>::from(modified).fixed_offset();
        snapshot.insert(normalize_key(rel), mtime);
    }

    tracing::debug!(root = %root.display(), files = snapshot.len(), "local scan complete");
    Ok(snapshot)
}
