//! Remote file enumeration over one exec channel.

use std::io::Read;

use crate::core::snapshot::{normalize_key, parse_mtime, Snapshot};
use crate::error::SyncError;

use super::SshRemote;

/// `find -printf` layout; the timestamp part is what
/// [`parse_mtime`] expects.
const LISTING_FORMAT: &str = r"%p++%TY-%Tm-%Td %TH:%TM:%TS %TZ %Tz\n";

/// Run the listing command under the remote root and parse its output.
pub(super) fn remote_snapshot(remote: &SshRemote) -> Result<Snapshot, SyncError> {
    let root = remote.root().to_string();
    let scan_err = |detail: String| SyncError::RemoteScan {
        root: root.clone(),
        detail,
    };

    let cmd = format!(
        "find {} -type f -printf '{LISTING_FORMAT}'",
        shell_words::quote(&root)
    );

    let mut channel = remote.channel()?;
    channel
        .exec(&cmd)
        .map_err(|e| scan_err(format!("failed to start listing command: {e}")))?;

    let mut output = String::new();
    channel
        .read_to_string(&mut output)
        .map_err(|e| scan_err(format!("failed to read listing output: {e}")))?;
    let mut stderr = String::new();
    let _ = channel.stderr().read_to_string(&mut stderr);

    channel.close().map_err(|e| scan_err(e.to_string()))?;
    channel.wait_close().map_err(|e| scan_err(e.to_string()))?;
    let status = channel.exit_status().map_err(|e| scan_err(e.to_string()))?;
    if status != 0 {
        return Err(scan_err(format!(
            "listing command exited with status {status}: {}",
            stderr.trim()
        )));
    }

    let snapshot = parse_listing(&output, &root)?;
    tracing::debug!(root = %root, files = snapshot.len(), "remote scan complete");
    Ok(snapshot)
}

/// Parse line-oriented listing output into a snapshot.
///
/// Each non-blank line must be `<absolute-path>++<timestamp>`; anything
/// else fails the whole scan rather than silently dropping the entry.
pub fn parse_listing(output: &str, root: &str) -> Result<Snapshot, SyncError> {
    let mut snapshot = Snapshot::new();

    for line in output.lines() {
        if line.trim().is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split("++").collect();
        let [path, timestamp] = parts.as_slice() else {
            return Err(SyncError::MalformedListing {
                line: line.to_string(),
                detail: "expected exactly one `++` separator".to_string(),
            });
        };

        let mtime = parse_mtime(timestamp).map_err(|e| SyncError::MalformedListing {
            line: line.to_string(),
            detail: e.to_string(),
        })?;

        let rel = path.strip_prefix(root).unwrap_or(path);
        let key = normalize_key(rel);
        // Keys become local paths under the mirror root on pull; a
        // parent component would escape it.
        if key.split('/').any(|part| part == "..") {
            return Err(SyncError::MalformedListing {
                line: line.to_string(),
                detail: "path escapes the listing root".to_string(),
            });
        }
        snapshot.insert(key, mtime);
    }

    Ok(snapshot)
}
