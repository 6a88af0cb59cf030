//! Per-file transfer sessions: content copy, then timestamp
//! reconciliation.
//!
//! Each sub-step runs on its own exec channel. Diagnostic output from
//! the remote side is logged, never treated as failure; only a non-zero
//! exit status is.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;

use chrono::{DateTime, Local};
use filetime::FileTime;
use tempfile::NamedTempFile;

use crate::core::snapshot::{format_mtime, Mtime};
use crate::error::{SyncError, TransferStep};

use super::SshRemote;

/// Stream a local file to the remote side and reconcile its mtime.
pub(super) fn push_file(remote: &SshRemote, source: &Path, rel: &str) -> Result<(), SyncError> {
    let copy_err = |detail: String| SyncError::transfer(rel, TransferStep::Copy, detail);

    let mut file = File::open(source).map_err(|e| copy_err(e.to_string()))?;
    // Stat once, before the copy, so the reconciled mtime matches the
    // content that was actually read.
    let modified = file
        .metadata()
        .and_then(|m| m.modified())
        .map_err(|e| copy_err(e.to_string()))?;
    let mtime = DateTime::<Local>::from(modified).fixed_offset();

    let target = remote.target_path(rel);
    let parent = target.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("/");
    let cmd = format!(
        "mkdir -p {} && cat > {}",
        shell_words::quote(parent),
        shell_words::quote(&target)
    );

    let mut channel = remote.channel()?;
    channel
        .exec(&cmd)
        .map_err(|e| copy_err(format!("failed to start remote command: {e}")))?;

    io::copy(&mut file, &mut channel).map_err(|e| copy_err(e.to_string()))?;
    channel.send_eof().map_err(|e| copy_err(e.to_string()))?;

    let mut output = String::new();
    let _ = channel.read_to_string(&mut output);
    let mut stderr = String::new();
    let _ = channel.stderr().read_to_string(&mut stderr);
    if !output.trim().is_empty() {
        tracing::debug!(path = rel, output = %output.trim(), "remote output");
    }

    channel.wait_eof().map_err(|e| copy_err(e.to_string()))?;
    channel.close().map_err(|e| copy_err(e.to_string()))?;
    channel.wait_close().map_err(|e| copy_err(e.to_string()))?;
    let status = channel.exit_status().map_err(|e| copy_err(e.to_string()))?;
    if status != 0 {
        return Err(copy_err(format!(
            "remote command exited with status {status}: {}",
            stderr.trim()
        )));
    }

    tracing::info!(path = rel, "pushed");
    set_remote_mtime(remote, rel, &target, mtime)
}

/// Set the remote file's mtime via `touch -d`.
fn set_remote_mtime(
    remote: &SshRemote,
    rel: &str,
    target: &str,
    mtime: Mtime,
) -> Result<(), SyncError> {
    let touch_err = |detail: String| SyncError::transfer(rel, TransferStep::Reconcile, detail);

    let cmd = format!(
        "touch -d '{}' {}",
        format_mtime(&mtime),
        shell_words::quote(target)
    );

    let mut channel = remote.channel()?;
    channel
        .exec(&cmd)
        .map_err(|e| touch_err(format!("failed to start remote command: {e}")))?;

    let mut output = String::new();
    let _ = channel.read_to_string(&mut output);
    let mut stderr = String::new();
    let _ = channel.stderr().read_to_string(&mut stderr);
    if !output.trim().is_empty() {
        tracing::debug!(path = rel, output = %output.trim(), "remote output");
    }

    channel.close().map_err(|e| touch_err(e.to_string()))?;
    channel.wait_close().map_err(|e| touch_err(e.to_string()))?;
    let status = channel.exit_status().map_err(|e| touch_err(e.to_string()))?;
    if status != 0 {
        return Err(touch_err(format!(
            "touch exited with status {status}: {}",
            stderr.trim()
        )));
    }

    Ok(())
}

/// Fetch a remote file into the local tree and reconcile its mtime.
///
/// The content lands in a uniquely named staging file first and is
/// renamed into place only after the remote command succeeded, so a
/// failed copy never leaves a truncated destination behind.
pub(super) fn pull_file(
    remote: &SshRemote,
    rel: &str,
    dest: &Path,
    mtime: Mtime,
) -> Result<(), SyncError> {
    let copy_err = |detail: String| SyncError::transfer(rel, TransferStep::Copy, detail);

    let target = remote.target_path(rel);
    let cmd = format!("cat {}", shell_words::quote(&target));

    let mut channel = remote.channel()?;
    channel
        .exec(&cmd)
        .map_err(|e| copy_err(format!("failed to start remote command: {e}")))?;

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| copy_err(e.to_string()))?;
    }

    // Dropped unpersisted on any error path below.
    let mut staged = stage_temp(dest).map_err(|e| copy_err(e.to_string()))?;
    io::copy(&mut channel, staged.as_file_mut()).map_err(|e| copy_err(e.to_string()))?;

    let mut stderr = String::new();
    let _ = channel.stderr().read_to_string(&mut stderr);

    channel.close().map_err(|e| copy_err(e.to_string()))?;
    channel.wait_close().map_err(|e| copy_err(e.to_string()))?;
    let status = channel.exit_status().map_err(|e| copy_err(e.to_string()))?;
    if status != 0 {
        return Err(copy_err(format!(
            "remote command exited with status {status}: {}",
            stderr.trim()
        )));
    }

    staged
        .persist(dest)
        .map_err(|e| copy_err(e.error.to_string()))?;

    tracing::info!(path = rel, "pulled");

    let ft = FileTime::from_unix_time(mtime.timestamp(), mtime.timestamp_subsec_nanos());
    filetime::set_file_mtime(dest, ft)
        .map_err(|e| SyncError::transfer(rel, TransferStep::Reconcile, e))
}

/// Open a uniquely named staging file next to `dest`, so the final
/// rename never crosses filesystems and never collides with a sibling.
fn stage_temp(dest: &Path) -> io::Result<NamedTempFile> {
    let parent = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    NamedTempFile::new_in(parent)
}
