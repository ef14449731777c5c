//! Action classification for sync records
//!
//! Every record resolves to exactly one [`Action`] given whether it is
//! included in the target. The action determines both what the executor
//! does and how many bytes it adds to (or frees from) the target.

use crate::record::{signed, SyncRecord};

/// Resolved operation for a sync record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// File exists only in the target; leave it alone
    Keep,
    /// File exists only in the source; copy it over
    Create,
    /// Sizes match; treated as identical
    SameSize,
    /// Target copy is more recent than the source copy
    NewerInTarget,
    /// Overwrite the target copy with the source copy
    Replace,
    /// Excluded and never copied; nothing to free
    TooOldSkip,
    /// Excluded; remove the target copy
    Delete,
}

impl Action {
    /// Resolve the action for a record under the given inclusion state
    pub fn resolve(record: &SyncRecord, include: bool) -> Action {
        let included = match (record.source, record.target) {
            (None, _) => Action::Keep,
            (Some(_), None) => Action::Create,
            (Some(source), Some(target)) => {
                if source.size == target.size {
                    Action::SameSize
                } else if target.modified > source.modified {
                    Action::NewerInTarget
                } else {
                    Action::Replace
                }
            }
        };

        if include {
            included
        } else if included == Action::Create {
            Action::TooOldSkip
        } else {
            Action::Delete
        }
    }

    /// Signed bytes this action adds to the target's used space
    pub fn space_effect(self, record: &SyncRecord) -> i64 {
        match self {
            Action::Create | Action::Replace => record.size_delta(),
            Action::Delete => -signed(record.target_size()),
            Action::Keep | Action::SameSize | Action::NewerInTarget | Action::TooOldSkip => 0,
        }
    }

    /// Whether executing this action touches the target filesystem
    pub fn mutates(self) -> bool {
        matches!(self, Action::Create | Action::Replace | Action::Delete)
    }

    /// Short description used in the per-file report
    pub fn description(self) -> &'static str {
        match self {
            Action::Keep => "keep (target only)",
            Action::Create => "copy",
            Action::SameSize => "unchanged (same size)",
            Action::NewerInTarget => "skip (newer in target)",
            Action::Replace => "replace",
            Action::TooOldSkip => "skip (too old)",
            Action::Delete => "delete",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

/// Space effect of a record under the given inclusion state
pub fn space_effect(record: &SyncRecord, include: bool) -> i64 {
    Action::resolve(record, include).space_effect(record)
}
