//! Two-way directory mirror over SSH.
//!
//! A run captures a snapshot of each side (relative path to mtime),
//! diffs them into four sets, and transfers the differing files: push
//! always, pull when enabled. Timestamps are reconciled after every
//! copy so repeated runs converge to a no-op.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod remote;

pub use crate::core::differ::{changes, SyncPlan};
pub use crate::core::engine::{EngineOptions, SyncEngine, SyncReport};
pub use crate::core::scanner::scan_local;
pub use crate::core::snapshot::{Mtime, Snapshot};
pub use crate::error::{SyncError, TransferStep};
pub use crate::remote::{ConnectOptions, Remote, SshRemote};
