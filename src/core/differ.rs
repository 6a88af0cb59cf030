//! Four-way diff between two snapshots.

use std::fmt;

use crate::core::snapshot::Snapshot;

/// For every path in `a`: absent from `b` goes into the first result,
/// strictly newer in `a` into the second. Equal timestamps produce no
/// action. Output order follows the snapshot's sorted keys, so the same
/// inputs always yield the same sequences.
///
/// Calling this twice with swapped arguments yields the full four-way
/// classification; a path can land in at most one set per direction.
pub fn changes(a: &Snapshot, b: &Snapshot) -> (Vec<String>, Vec<String>) {
    let mut missing = Vec::new();
    let mut newer = Vec::new();

    for (path, mtime) in a.iter() {
        match b.get(path) {
            None => missing.push(path.clone()),
            Some(other) if mtime > other => newer.push(path.clone()),
            Some(_) => {}
        }
    }

    (missing, newer)
}

/// The four disjoint path sets driving one sync run.
///
/// Derived once per run from the two snapshots and discarded afterwards.
#[derive(Debug, Clone, Default)]
pub struct SyncPlan {
    /// Present locally, absent on the remote side.
    pub remote_missing: Vec<String>,
    /// Present on both sides, strictly newer locally.
    pub local_newer: Vec<String>,
    /// Present remotely, absent on the local side.
    pub local_missing: Vec<String>,
    /// Present on both sides, strictly newer remotely.
    pub remote_newer: Vec<String>,
}

impl SyncPlan {
    pub fn build(local: &Snapshot, remote: &Snapshot) -> Self {
        let (remote_missing, local_newer) = changes(local, remote);
        let (local_missing, remote_newer) = changes(remote, local);
        Self {
            remote_missing,
            local_newer,
            local_missing,
            remote_newer,
        }
    }

    /// True when both sides already agree.
    pub fn is_noop(&self) -> bool {
        self.push_count() == 0 && self.pull_count() == 0
    }

    /// Files the push phase will transfer.
    pub fn push_count(&self) -> usize {
        self.remote_missing.len() + self.local_newer.len()
    }

    /// Files a pull phase would transfer.
    pub fn pull_count(&self) -> usize {
        self.local_missing.len() + self.remote_newer.len()
    }
}

impl fmt::Display for SyncPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn section(f: &mut fmt::Formatter<'_>, title: &str, paths: &[String]) -> fmt::Result {
            writeln!(f, "{title} ({}):", paths.len())?;
            for path in paths {
                writeln!(f, "  {path}")?;
            }
            Ok(())
        }

        section(f, "files missing on remote host", &self.remote_missing)?;
        section(f, "files changed on local host", &self.local_newer)?;
        section(f, "files missing on local host", &self.local_missing)?;
        section(f, "files changed on remote host", &self.remote_newer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::snapshot::Mtime;
    use chrono::TimeZone;

    fn at(secs: i64) -> Mtime {
        chrono::FixedOffset::east_opt(0)
            .unwrap()
            .timestamp_opt(secs, 0)
            .unwrap()
    }

    fn snap(entries: &[(&str, i64)]) -> Snapshot {
        entries
            .iter()
            .map(|(path, secs)| (path.to_string(), at(*secs)))
            .collect()
    }

    #[test]
    fn empty_side_yields_empty_results() {
        let empty = Snapshot::new();
        let other = snap(&[("a.txt", 100)]);
        let (missing, newer) = changes(&empty, &other);
        assert!(missing.is_empty());
        assert!(newer.is_empty());
    }

    #[test]
    fn missing_is_detected_regardless_of_timestamp() {
        let a = snap(&[("old.txt", 1), ("new.txt", i64::from(u32::MAX))]);
        let b = Snapshot::new();
        let (missing, newer) = changes(&a, &b);
        assert_eq!(missing, ["new.txt", "old.txt"]);
        assert!(newer.is_empty());
    }

    #[test]
    fn equal_timestamps_produce_no_action() {
        let a = snap(&[("c.txt", 100)]);
        let b = snap(&[("c.txt", 100)]);
        let plan = SyncPlan::build(&a, &b);
        assert!(plan.is_noop());
    }

    #[test]
    fn strictly_newer_wins_in_exactly_one_direction() {
        let a = snap(&[("f.txt", 200)]);
        let b = snap(&[("f.txt", 100)]);

        let (missing_ab, newer_ab) = changes(&a, &b);
        let (missing_ba, newer_ba) = changes(&b, &a);

        assert!(missing_ab.is_empty());
        assert_eq!(newer_ab, ["f.txt"]);
        assert!(missing_ba.is_empty());
        assert!(newer_ba.is_empty());
    }

    #[test]
    fn paths_partition_into_one_set_each() {
        let local = snap(&[
            ("only-local.txt", 100),
            ("local-newer.txt", 200),
            ("remote-newer.txt", 100),
            ("same.txt", 100),
        ]);
        let remote = snap(&[
            ("only-remote.txt", 100),
            ("local-newer.txt", 100),
            ("remote-newer.txt", 200),
            ("same.txt", 100),
        ]);

        let plan = SyncPlan::build(&local, &remote);
        assert_eq!(plan.remote_missing, ["only-local.txt"]);
        assert_eq!(plan.local_newer, ["local-newer.txt"]);
        assert_eq!(plan.local_missing, ["only-remote.txt"]);
        assert_eq!(plan.remote_newer, ["remote-newer.txt"]);

        // No path is classified twice across the four sets.
        let mut all: Vec<&String> = plan
            .remote_missing
            .iter()
            .chain(&plan.local_newer)
            .chain(&plan.local_missing)
            .chain(&plan.remote_newer)
            .collect();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), 4);
    }

    #[test]
    fn display_lists_all_four_sections() {
        let plan = SyncPlan::build(&snap(&[("a.txt", 100)]), &Snapshot::new());
        let text = plan.to_string();
        assert!(text.contains("files missing on remote host (1):"));
        assert!(text.contains("  a.txt"));
        assert!(text.contains("files changed on local host (0):"));
        assert!(text.contains("files missing on local host (0):"));
        assert!(text.contains("files changed on remote host (0):"));
    }
}
