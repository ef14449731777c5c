//! Executor - applies a fitted plan against the source and target roots
//!
//! Records are processed in plan order. Each record's report line is
//! written before its action runs, so the output stops at the record
//! that failed. The first I/O error aborts the run; earlier changes stay.

use crate::action::Action;
use crate::fit::Plan;
use crate::record::SyncRecord;
use crate::report::report_line;
use anyhow::{bail, Context, Result};
use filetime::{set_file_mtime, FileTime};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Counts and byte totals from applying a plan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub total_files: usize,
    pub created: usize,
    pub replaced: usize,
    pub deleted: usize,
    pub skipped_too_old: usize,
    pub unchanged: usize,
    pub bytes_written: u64,
    pub bytes_freed: u64,
    pub projected_total: i64,
    pub available: i64,
    pub fits: bool,
    pub dry_run: bool,
    pub duration: Duration,
}

impl SyncSummary {
    fn record(&mut self, record: &SyncRecord, action: Action) {
        self.total_files += 1;
        match action {
            Action::Create => {
                self.created += 1;
                self.bytes_written += record.source_size();
            }
            Action::Replace => {
                self.replaced += 1;
                self.bytes_written += record.source_size();
            }
            Action::Delete => {
                self.deleted += 1;
                self.bytes_freed += record.target_size();
            }
            Action::TooOldSkip => self.skipped_too_old += 1,
            Action::Keep | Action::SameSize | Action::NewerInTarget => self.unchanged += 1,
        }
    }
}

/// Applies actions from a plan to the target tree
#[derive(Debug, Clone)]
pub struct Executor {
    source_root: PathBuf,
    target_root: PathBuf,
    dry_run: bool,
    preserve_timestamps: bool,
    follow_links: bool,
}

impl Executor {
    pub fn new(source_root: impl Into<PathBuf>, target_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            target_root: target_root.into(),
            dry_run: false,
            preserve_timestamps: true,
            follow_links: false,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn preserve_timestamps(mut self, preserve: bool) -> Self {
        self.preserve_timestamps = preserve;
        self
    }

    /// Allow writes through symlinks inside the target tree
    pub fn follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    /// Execute every record of the plan, writing one report line per record
    pub fn apply<W: Write>(&self, plan: &Plan, out: &mut W) -> Result<SyncSummary> {
        let start_time = Instant::now();
        let mut summary = SyncSummary {
            projected_total: plan.total(),
            available: plan.available(),
            fits: plan.fits(),
            dry_run: self.dry_run,
            ..Default::default()
        };

        for (record, action) in plan.actions() {
            writeln!(out, "{}", report_line(record, action))
                .context("Failed to write report line")?;

            if !self.dry_run {
                self.execute(record, action)?;
            }

            summary.record(record, action);
        }

        out.flush().context("Failed to flush report output")?;
        summary.duration = start_time.elapsed();

        info!(
            "Applied {} records: {} created, {} replaced, {} deleted, {} skipped{}",
            summary.total_files,
            summary.created,
            summary.replaced,
            summary.deleted,
            summary.skipped_too_old,
            if self.dry_run { " (dry run)" } else { "" }
        );

        Ok(summary)
    }

    /// Perform the filesystem effect of a single action
    pub fn execute(&self, record: &SyncRecord, action: Action) -> Result<()> {
        if !action.mutates() {
            return Ok(());
        }

        let source = self.source_root.join(&record.path);
        let target = self.target_root.join(&record.path);

        if action == Action::Delete {
            debug!("Deleting {}", target.display());
            return std::fs::remove_file(&target)
                .with_context(|| format!("Failed to delete {}", target.display()));
        }

        if !self.follow_links {
            self.unlink_target_symlinks(&record.path)?;
        }
        self.copy(&source, &target)
    }

    /// Make sure a copy to `relative` cannot land outside the target root.
    ///
    /// A symlink at the file itself is removed so the copy replaces the link,
    /// not the file it points to. A symlinked directory on the way is an error.
    fn unlink_target_symlinks(&self, relative: &Path) -> Result<()> {
        let mut current = self.target_root.clone();
        let mut components = relative.components().peekable();

        while let Some(component) = components.next() {
            current.push(component);

            let metadata = match std::fs::symlink_metadata(&current) {
                Ok(metadata) => metadata,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
                Err(e) => {
                    return Err(e)
                        .with_context(|| format!("Failed to inspect {}", current.display()))
                }
            };

            if !metadata.file_type().is_symlink() {
                continue;
            }
            if components.peek().is_some() {
                bail!(
                    "Refusing to copy through symlinked directory {}",
                    current.display()
                );
            }

            debug!("Removing symlink {} before copy", current.display());
            std::fs::remove_file(&current)
                .with_context(|| format!("Failed to remove symlink {}", current.display()))?;
        }

        Ok(())
    }

    fn copy(&self, source: &Path, target: &Path) -> Result<()> {
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        debug!("Copying {} -> {}", source.display(), target.display());
        let copied = std::fs::copy(source, target).with_context(|| {
            format!("Failed to copy {} to {}", source.display(), target.display())
        })?;

        if self.preserve_timestamps {
            let metadata = std::fs::metadata(source)
                .with_context(|| format!("Failed to read metadata: {}", source.display()))?;
            set_file_mtime(target, FileTime::from_last_modification_time(&metadata))
                .with_context(|| format!("Failed to set mtime on {}", target.display()))?;
        }

        debug!("Copied {} bytes", copied);
        Ok(())
    }
}
