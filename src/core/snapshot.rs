//! Per-side file state and the canonical mtime codec.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};

use crate::error::SyncError;

/// Timezone-aware modification time, nanosecond precision.
pub type Mtime = DateTime<FixedOffset>;

/// Snapshot of one side of the mirror: relative path -> mtime.
///
/// Captured fresh at the start of every run and immutable afterwards;
/// nothing is cached across runs. Keys are forward-slash-normalized,
/// root-stripped paths, so the two sides compare directly. The sorted
/// backing map makes transfer order deterministic within a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    files: BTreeMap<String, Mtime>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, mtime: Mtime) {
        self.files.insert(path.into(), mtime);
    }

    pub fn get(&self, path: &str) -> Option<&Mtime> {
        self.files.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Mtime)> {
        self.files.iter()
    }
}

impl FromIterator<(String, Mtime)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (String, Mtime)>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().collect(),
        }
    }
}

/// Normalize a root-stripped path into snapshot key form: forward
/// slashes, no leading separator.
pub fn normalize_key(path: &str) -> String {
    path.replace('\\', "/").trim_start_matches('/').to_string()
}

/// Parse a timestamp in the listing layout:
/// `YYYY-MM-DD HH:MM:SS[.fraction] <zone-name> <zone-offset>`.
///
/// This is the one parsing path for remote timestamps; the zone name
/// printed by `find %TZ` is redundant given the numeric offset and is
/// dropped rather than interpreted.
pub fn parse_mtime(value: &str) -> Result<Mtime, SyncError> {
    let bad = |detail: String| SyncError::Timestamp {
        value: value.to_string(),
        detail,
    };

    // The zone name is optional: `find %TZ` prints one, `touch -d`
    // input does not need it.
    let fields: Vec<&str> = value.split_whitespace().collect();
    let (date, time, offset) = match fields.as_slice() {
        [date, time, offset] => (date, time, offset),
        [date, time, _zone, offset] => (date, time, offset),
        _ => return Err(bad("expected `date time [zone] offset`".to_string())),
    };

    DateTime::parse_from_str(
        &format!("{date} {time} {offset}"),
        "%Y-%m-%d %H:%M:%S%.f %z",
    )
    .map_err(|e| bad(e.to_string()))
}

/// Format an mtime for `touch -d`, the counterpart of [`parse_mtime`].
///
/// Both paths keep nanosecond precision so a reconciled file compares
/// equal on the next run instead of being redetected as changed.
pub fn format_mtime(mtime: &Mtime) -> String {
    mtime.format("%Y-%m-%d %H:%M:%S%.9f %z").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64, nanos: u32) -> Mtime {
        FixedOffset::east_opt(3600)
            .unwrap()
            .timestamp_opt(secs, nanos)
            .unwrap()
    }

    #[test]
    fn parses_fractional_seconds() {
        let t = parse_mtime("2024-05-01 10:15:30.1234567890 CEST +0200").unwrap();
        assert_eq!(t.timestamp_subsec_nanos(), 123_456_789);
    }

    #[test]
    fn parses_whole_seconds() {
        let t = parse_mtime("2024-05-01 10:15:30 CEST +0200").unwrap();
        assert_eq!(t.timestamp_subsec_nanos(), 0);
    }

    #[test]
    fn rejects_missing_fields() {
        assert!(matches!(
            parse_mtime("2024-05-01 10:15:30"),
            Err(SyncError::Timestamp { .. })
        ));
    }

    #[test]
    fn rejects_garbage_date() {
        assert!(parse_mtime("not-a-date 10:15:30 UTC +0000").is_err());
    }

    #[test]
    fn codec_round_trips() {
        let t = at(1_714_557_330, 123_456_789);
        assert_eq!(parse_mtime(&format_mtime(&t)).unwrap(), t);
    }

    #[test]
    fn normalizes_keys() {
        assert_eq!(normalize_key("/sub/file.txt"), "sub/file.txt");
        assert_eq!(normalize_key("sub\\file.txt"), "sub/file.txt");
        assert_eq!(normalize_key("file.txt"), "file.txt");
    }

    #[test]
    fn snapshot_is_sorted() {
        let mut snap = Snapshot::new();
        snap.insert("b.txt", at(10, 0));
        snap.insert("a.txt", at(10, 0));
        let keys: Vec<_> = snap.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["a.txt", "b.txt"]);
    }
}
