//! Sync records - one per relative path in the union of source and target trees
//!
//! Records are immutable once built. Inclusion state lives in the
//! [`Plan`](crate::fit::Plan) produced by the space fitter, never in the record.

use anyhow::{bail, Result};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

/// Size and modification time of a regular file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileAttrs {
    pub size: u64,
    pub modified: SystemTime,
}

impl FileAttrs {
    pub fn new(size: u64, modified: SystemTime) -> Self {
        Self { size, modified }
    }
}

/// Relative path -> attributes for every regular file under a root
pub type FileMap = BTreeMap<PathBuf, FileAttrs>;

/// Decision state for one relative path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRecord {
    /// Path relative to both roots
    pub path: PathBuf,
    /// Present iff the file exists in the source tree
    pub source: Option<FileAttrs>,
    /// Present iff the file exists in the target tree
    pub target: Option<FileAttrs>,
}

impl SyncRecord {
    pub fn new(
        path: impl Into<PathBuf>,
        source: Option<FileAttrs>,
        target: Option<FileAttrs>,
    ) -> Self {
        debug_assert!(
            source.is_some() || target.is_some(),
            "sync record needs at least one side"
        );
        Self {
            path: path.into(),
            source,
            target,
        }
    }

    pub fn source_size(&self) -> u64 {
        self.source.map_or(0, |attrs| attrs.size)
    }

    pub fn target_size(&self) -> u64 {
        self.target.map_or(0, |attrs| attrs.size)
    }

    /// Signed growth of the target if the source copy replaced the target copy
    pub fn size_delta(&self) -> i64 {
        signed(self.source_size()) - signed(self.target_size())
    }

    /// The later of the two modification times
    pub fn timestamp(&self) -> SystemTime {
        match (self.source, self.target) {
            (Some(s), Some(t)) => s.modified.max(t.modified),
            (Some(s), None) => s.modified,
            (None, Some(t)) => t.modified,
            (None, None) => UNIX_EPOCH,
        }
    }

    /// Total processing order: oldest timestamp first, then path bytes ascending
    pub fn order(&self, other: &Self) -> Ordering {
        self.timestamp()
            .cmp(&other.timestamp())
            .then_with(|| self.path.as_os_str().cmp(other.path.as_os_str()))
    }
}

/// Byte counts never reach i64::MAX in practice; saturate rather than wrap.
pub fn signed(bytes: u64) -> i64 {
    i64::try_from(bytes).unwrap_or(i64::MAX)
}

/// Merge source and target listings into one record per path in their union
pub fn build(source: &FileMap, target: &FileMap) -> Vec<SyncRecord> {
    let paths: BTreeSet<&PathBuf> = source.keys().chain(target.keys()).collect();

    paths
        .into_iter()
        .map(|path| {
            SyncRecord::new(
                path.clone(),
                source.get(path).copied(),
                target.get(path).copied(),
            )
        })
        .collect()
}

/// Sort records into processing order, rejecting duplicate paths
pub fn sort_records(mut records: Vec<SyncRecord>) -> Result<Vec<SyncRecord>> {
    records.sort_by(SyncRecord::order);

    let mut seen = BTreeSet::new();
    for record in &records {
        if !seen.insert(record.path.as_path()) {
            bail!("Duplicate sync record for path: {}", record.path.display());
        }
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    fn attrs(size: u64, secs: u64) -> FileAttrs {
        FileAttrs::new(size, at(secs))
    }

    #[test]
    fn test_build_covers_union_of_paths() {
        let mut source = FileMap::new();
        source.insert("both".into(), attrs(10, 5));
        source.insert("src-only".into(), attrs(3, 7));

        let mut target = FileMap::new();
        target.insert("both".into(), attrs(12, 6));
        target.insert("dst-only".into(), attrs(4, 2));

        let records = build(&source, &target);
        assert_eq!(records.len(), 3);

        let both = records.iter().find(|r| r.path == PathBuf::from("both")).unwrap();
        assert_eq!(both.source_size(), 10);
        assert_eq!(both.target_size(), 12);
        assert_eq!(both.size_delta(), -2);
        assert_eq!(both.timestamp(), at(6));

        let src_only = records.iter().find(|r| r.path == PathBuf::from("src-only")).unwrap();
        assert!(src_only.target.is_none());
        assert_eq!(src_only.target_size(), 0);
        assert_eq!(src_only.timestamp(), at(7));

        let dst_only = records.iter().find(|r| r.path == PathBuf::from("dst-only")).unwrap();
        assert!(dst_only.source.is_none());
        assert_eq!(dst_only.size_delta(), -4);
    }

    #[test]
    fn test_build_empty_maps() {
        assert!(build(&FileMap::new(), &FileMap::new()).is_empty());
    }

    #[test]
    fn test_timestamp_uses_later_side() {
        let newer_source = SyncRecord::new("a", Some(attrs(1, 20)), Some(attrs(1, 10)));
        assert_eq!(newer_source.timestamp(), at(20));

        let newer_target = SyncRecord::new("a", Some(attrs(1, 10)), Some(attrs(1, 30)));
        assert_eq!(newer_target.timestamp(), at(30));
    }

    #[test]
    fn test_sort_oldest_first_with_path_tie_break() {
        let records = vec![
            SyncRecord::new("z", Some(attrs(1, 5)), None),
            SyncRecord::new("b", Some(attrs(1, 9)), None),
            SyncRecord::new("a", None, Some(attrs(1, 9))),
            SyncRecord::new("m", Some(attrs(1, 1)), None),
        ];

        let sorted = sort_records(records).expect("sort");
        let paths: Vec<_> = sorted.iter().map(|r| r.path.to_string_lossy().into_owned()).collect();
        assert_eq!(paths, vec!["m", "z", "a", "b"]);
    }

    #[test]
    fn test_order_is_lexicographic_on_path_bytes() {
        // '-' (0x2d) sorts before '/' (0x2f)
        let nested = SyncRecord::new("a/b", Some(attrs(1, 1)), None);
        let dashed = SyncRecord::new("a-b", Some(attrs(1, 1)), None);
        assert_eq!(dashed.order(&nested), Ordering::Less);
    }

    #[test]
    fn test_distinct_paths_never_compare_equal() {
        let a = SyncRecord::new("a", Some(attrs(1, 1)), None);
        let b = SyncRecord::new("b", Some(attrs(1, 1)), None);
        assert_ne!(a.order(&b), Ordering::Equal);
        assert_eq!(a.order(&a.clone()), Ordering::Equal);
    }

    #[test]
    fn test_sort_rejects_duplicate_paths() {
        let records = vec![
            SyncRecord::new("dup", Some(attrs(1, 1)), None),
            SyncRecord::new("dup", None, Some(attrs(2, 3))),
        ];

        let err = sort_records(records).unwrap_err();
        assert!(err.to_string().contains("Duplicate"));
    }
}
