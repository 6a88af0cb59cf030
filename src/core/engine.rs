//! Sync orchestration: scan both sides, diff, transfer, report.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::core::differ::SyncPlan;
use crate::core::scanner::scan_local;
use crate::core::snapshot::Snapshot;
use crate::error::{SyncError, TransferStep};
use crate::remote::Remote;

/// Knobs for one engine instance.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Also transfer the pull-direction sets (remote to local).
    pub pull: bool,
    /// Compute and report the plan without transferring anything.
    pub dry_run: bool,
    /// Bounded retries for scan failures. Transfers are never retried:
    /// a partially-written destination must be re-verified by the next
    /// run's scan, not blindly re-sent.
    pub max_retries: u32,
    pub retry_base_delay: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            pull: false,
            dry_run: false,
            max_retries: 2,
            retry_base_delay: Duration::from_millis(500),
        }
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub local_files: usize,
    pub remote_files: usize,
    pub plan: SyncPlan,
    pub pushed: usize,
    pub pulled: usize,
    pub duration: Duration,
}

/// Drives one sync pass: Scanning -> Diffing -> Pushing (-> Pulling)
/// -> Done, failing fast at every phase boundary.
pub struct SyncEngine<R: Remote> {
    local_root: PathBuf,
    remote: R,
    options: EngineOptions,
    cancelled: Arc<AtomicBool>,
}

impl<R: Remote> SyncEngine<R> {
    pub fn new(local_root: impl Into<PathBuf>, remote: R) -> Self {
        Self::with_options(local_root, remote, EngineOptions::default())
    }

    pub fn with_options(local_root: impl Into<PathBuf>, remote: R, options: EngineOptions) -> Self {
        Self {
            local_root: local_root.into(),
            remote,
            options,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag shared with signal handlers; checked between transfers.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Run one full sync pass.
    ///
    /// Either scan failing aborts before any diffing, so a run never
    /// acts on incomplete state. The first transfer failure aborts the
    /// remaining queue; files already transferred stay transferred.
    pub fn run(&mut self) -> Result<SyncReport, SyncError> {
        self.run_with(|_| {})
    }

    /// Like [`run`](Self::run), with `report_plan` invoked as soon as
    /// the diff is computed. A transfer failure therefore still leaves
    /// the caller with the full classification of what was detected.
    pub fn run_with(
        &mut self,
        report_plan: impl FnOnce(&SyncPlan),
    ) -> Result<SyncReport, SyncError> {
        let started = Instant::now();
        let options = self.options.clone();

        info!(root = %self.local_root.display(), "scanning both sides");
        let local_root = self.local_root.clone();
        let local = with_backoff(&options, "local scan", || scan_local(&local_root))?;
        let remote = {
            let side = &mut self.remote;
            with_backoff(&options, "remote scan", || side.snapshot())?
        };
        debug!(local = local.len(), remote = remote.len(), "snapshots captured");

        let plan = SyncPlan::build(&local, &remote);
        info!(
            push = plan.push_count(),
            pull = plan.pull_count(),
            "plan computed"
        );
        report_plan(&plan);

        let mut pushed = 0;
        let mut pulled = 0;
        if !self.options.dry_run {
            pushed += self.push_set(&plan.local_newer)?;
            pushed += self.push_set(&plan.remote_missing)?;
            if self.options.pull {
                pulled += self.pull_set(&plan.remote_newer, &remote)?;
                pulled += self.pull_set(&plan.local_missing, &remote)?;
            }
        }

        Ok(SyncReport {
            local_files: local.len(),
            remote_files: remote.len(),
            plan,
            pushed,
            pulled,
            duration: started.elapsed(),
        })
    }

    fn push_set(&mut self, paths: &[String]) -> Result<usize, SyncError> {
        for path in paths {
            if self.is_cancelled() {
                return Err(SyncError::Cancelled);
            }
            debug!(path = %path, "pushing");
            let source = self.local_root.join(path);
            self.remote.push(&source, path)?;
        }
        Ok(paths.len())
    }

    fn pull_set(&mut self, paths: &[String], remote_snap: &Snapshot) -> Result<usize, SyncError> {
        for path in paths {
            if self.is_cancelled() {
                return Err(SyncError::Cancelled);
            }
            debug!(path = %path, "pulling");
            // Pull sets are derived from this snapshot, so a miss is an
            // internal inconsistency, reported against the file.
            let mtime = remote_snap.get(path).copied().ok_or_else(|| {
                SyncError::transfer(
                    path.clone(),
                    TransferStep::Copy,
                    "missing from the remote snapshot",
                )
            })?;
            let dest = self.local_root.join(path);
            self.remote.pull(path, &dest, mtime)?;
        }
        Ok(paths.len())
    }
}

/// Retry `op` with exponential backoff. Applied to connectivity and
/// scan failures only.
pub fn with_backoff<T>(
    options: &EngineOptions,
    what: &str,
    mut op: impl FnMut() -> Result<T, SyncError>,
) -> Result<T, SyncError> {
    let mut attempt = 0;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(e) if attempt < options.max_retries => {
                let delay = options.retry_base_delay * 2u32.pow(attempt);
                warn!(what, error = %e, delay_ms = delay.as_millis() as u64, "retrying");
                thread::sleep(delay);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
