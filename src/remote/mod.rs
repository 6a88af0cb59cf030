//! Remote side of the mirror: the `Remote` seam and its SSH backend.

pub mod listing;
pub mod transfer;

use std::net::TcpStream;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ssh2::Session;

use crate::core::snapshot::{Mtime, Snapshot};
use crate::error::SyncError;

/// One side of the mirror reached over a command channel.
///
/// Every operation opens its own logical channel over the shared
/// connection and releases it on completion or failure, so two
/// in-flight operations never share a stream.
pub trait Remote {
    /// Capture (relative path, mtime) for every regular file under the
    /// remote root.
    fn snapshot(&mut self) -> Result<Snapshot, SyncError>;

    /// Stream `source` to the remote file at `rel`, creating missing
    /// parent directories, then set the remote mtime to the source
    /// mtime captured before the copy.
    fn push(&mut self, source: &Path, rel: &str) -> Result<(), SyncError>;

    /// Fetch the remote file at `rel` into `dest`, then set the local
    /// mtime to `mtime` (the value the remote scan reported).
    fn pull(&mut self, rel: &str, dest: &Path, mtime: Mtime) -> Result<(), SyncError>;
}

/// Connection parameters for [`SshRemote::connect`].
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// `host:port` of the remote side.
    pub host: String,
    pub user: String,
    /// Private key for public key authentication.
    pub key_path: PathBuf,
    /// Directory on the remote host that all operations are scoped to.
    pub root: String,
    /// Deadline applied to every channel operation, so a stalled remote
    /// fails instead of hanging the run.
    pub timeout: Duration,
}

/// Authenticated SSH session plus the remote root it mirrors.
pub struct SshRemote {
    session: Session,
    root: String,
}

impl SshRemote {
    /// Dial the host, handshake, and authenticate with the private key.
    pub fn connect(opts: &ConnectOptions) -> Result<Self, SyncError> {
        let tcp = TcpStream::connect(&opts.host).map_err(|e| SyncError::Connect {
            host: opts.host.clone(),
            source: e,
        })?;

        let handshake_err = |source| SyncError::Handshake {
            host: opts.host.clone(),
            source,
        };
        let mut session = Session::new().map_err(handshake_err)?;
        session.set_tcp_stream(tcp);
        session.handshake().map_err(handshake_err)?;

        session
            .userauth_pubkey_file(&opts.user, None, &opts.key_path, None)
            .map_err(|e| SyncError::Auth {
                user: opts.user.clone(),
                source: e,
            })?;

        session.set_timeout(opts.timeout.as_millis() as u32);
        tracing::info!(host = %opts.host, user = %opts.user, "ssh session established");

        Ok(Self {
            session,
            root: normalize_root(&opts.root),
        })
    }

    /// Root directory on the remote side, without a trailing slash.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Absolute remote path for a snapshot key.
    fn target_path(&self, rel: &str) -> String {
        if self.root == "/" {
            format!("/{rel}")
        } else {
            format!("{}/{rel}", self.root)
        }
    }

    /// Open a fresh exec channel; one per operation.
    fn channel(&self) -> Result<ssh2::Channel, SyncError> {
        self.session.channel_session().map_err(SyncError::Channel)
    }
}

impl Remote for SshRemote {
    fn snapshot(&mut self) -> Result<Snapshot, SyncError> {
        listing::remote_snapshot(self)
    }

    fn push(&mut self, source: &Path, rel: &str) -> Result<(), SyncError> {
        transfer::push_file(self, source, rel)
    }

    fn pull(&mut self, rel: &str, dest: &Path, mtime: Mtime) -> Result<(), SyncError> {
        transfer::pull_file(self, rel, dest, mtime)
    }
}

fn normalize_root(root: &str) -> String {
    let trimmed = root.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}
