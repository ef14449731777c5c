//! Space fitting - oldest-first exclusion until the plan fits the budget
//!
//! The fitter walks records in processing order (oldest timestamp first)
//! and excludes them one at a time while the projected growth of the
//! target exceeds the available space. Exclusion never increases the
//! projection, so the walk converges in at most one pass. If every record
//! has been excluded and the projection still does not fit, the plan is
//! returned anyway and the filesystem gets the final word at execution.

use crate::action::{space_effect, Action};
use crate::record::{sort_records, SyncRecord};
use anyhow::Result;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Sorted records plus the set of paths excluded to fit the budget
#[derive(Debug, Clone)]
pub struct Plan {
    records: Vec<SyncRecord>,
    excluded: HashSet<PathBuf>,
    total: i64,
    available: i64,
}

impl Plan {
    /// Records in processing order
    pub fn records(&self) -> &[SyncRecord] {
        &self.records
    }

    pub fn is_included(&self, path: &Path) -> bool {
        !self.excluded.contains(path)
    }

    pub fn excluded(&self) -> &HashSet<PathBuf> {
        &self.excluded
    }

    /// Resolved action for a record of this plan
    pub fn action(&self, record: &SyncRecord) -> Action {
        Action::resolve(record, self.is_included(&record.path))
    }

    /// Records paired with their resolved actions, in processing order
    pub fn actions(&self) -> impl Iterator<Item = (&SyncRecord, Action)> + '_ {
        self.records.iter().map(move |record| (record, self.action(record)))
    }

    /// Projected change in target usage after execution
    pub fn total(&self) -> i64 {
        self.total
    }

    pub fn available(&self) -> i64 {
        self.available
    }

    pub fn fits(&self) -> bool {
        self.total <= self.available
    }
}

/// Greedy oldest-first fitter for a fixed space budget
#[derive(Debug, Clone, Copy)]
pub struct SpaceFitter {
    available: i64,
}

impl SpaceFitter {
    pub fn new(available: i64) -> Self {
        Self { available }
    }

    /// A fitter that never needs to exclude anything
    pub fn unlimited() -> Self {
        Self::new(i64::MAX)
    }

    /// Sort the records and exclude oldest-first until the projection fits
    pub fn fit(&self, records: Vec<SyncRecord>) -> Result<Plan> {
        let records = sort_records(records)?;

        let mut total: i64 = records.iter().map(|r| space_effect(r, true)).sum();
        let mut excluded = HashSet::new();

        debug!(
            "Projected growth {} bytes against {} available across {} records",
            total,
            self.available,
            records.len()
        );

        for record in &records {
            if total <= self.available {
                break;
            }

            let before = space_effect(record, true);
            excluded.insert(record.path.clone());
            let after = space_effect(record, false);
            total += after - before;

            debug!(
                "Excluded {} ({} -> {} bytes), projection now {}",
                record.path.display(),
                before,
                after,
                total
            );
        }

        if total > self.available {
            debug!(
                "Plan still exceeds available space by {} bytes after excluding {} records",
                total - self.available,
                excluded.len()
            );
        }

        Ok(Plan {
            records,
            excluded,
            total,
            available: self.available,
        })
    }
}
