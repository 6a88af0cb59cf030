//! Error taxonomy for a sync run.
//!
//! Every error carries the operation it came from and enough identifying
//! context (host, root, file path, transfer sub-step) for the caller to
//! report it without re-deriving state.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Sub-step of a per-file transfer, for error context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStep {
    /// Streaming the file bytes to the destination.
    Copy,
    /// Setting the destination mtime to match the source.
    Reconcile,
}

impl fmt::Display for TransferStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Copy => write!(f, "content copy"),
            Self::Reconcile => write!(f, "timestamp reconciliation"),
        }
    }
}

/// Errors that can occur during a sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to connect to {host}: {source}")]
    Connect {
        host: String,
        #[source]
        source: io::Error,
    },

    #[error("ssh handshake with {host} failed: {source}")]
    Handshake {
        host: String,
        #[source]
        source: ssh2::Error,
    },

    #[error("public key authentication failed for user {user}: {source}")]
    Auth {
        user: String,
        #[source]
        source: ssh2::Error,
    },

    #[error("failed to open ssh channel: {0}")]
    Channel(#[source] ssh2::Error),

    #[error("local scan of {} failed: {detail}", root.display())]
    LocalScan { root: PathBuf, detail: String },

    #[error("remote listing under {root} failed: {detail}")]
    RemoteScan { root: String, detail: String },

    #[error("malformed listing line {line:?}: {detail}")]
    MalformedListing { line: String, detail: String },

    #[error("unparseable timestamp {value:?}: {detail}")]
    Timestamp { value: String, detail: String },

    #[error("transfer of {path} failed during {step}: {detail}")]
    Transfer {
        path: String,
        step: TransferStep,
        detail: String,
    },

    #[error("sync cancelled")]
    Cancelled,
}

impl SyncError {
    /// Shorthand for a transfer failure with full context.
    pub fn transfer(path: impl Into<String>, step: TransferStep, detail: impl fmt::Display) -> Self {
        Self::Transfer {
            path: path.into(),
            step,
            detail: detail.to_string(),
        }
    }
}
