//! Sync Engine - Orchestrates scanning, space fitting, and execution
//!
//! This module provides the high-level sync orchestration: validate both
//! roots, scan them, pair up records, fit them into the target's budget,
//! and hand the plan to the executor.

use crate::executor::{Executor, SyncSummary};
use crate::fit::{Plan, SpaceFitter};
use crate::record::{build, signed, SyncRecord};
use crate::scan::{walk, ExcludeMatcher, ScanOptions};
use crate::Config;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Where the space budget comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Budget {
    /// Query free space on the target filesystem
    Measured,
    /// Use a fixed number of bytes
    Fixed(u64),
}

/// Options for a single sync run, resolved from config and CLI flags
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub budget: Budget,
    pub reserve: u64,
    pub dry_run: bool,
    pub preserve_timestamps: bool,
    pub follow_links: bool,
    pub exclude_patterns: Vec<String>,
}

impl SyncOptions {
    /// Options as described by the configuration file
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            budget: Budget::Measured,
            reserve: config.reserve_bytes()?,
            dry_run: config.sync.dry_run,
            preserve_timestamps: config.sync.preserve_timestamps,
            follow_links: config.sync.follow_links,
            exclude_patterns: config.sync.exclude_patterns.clone(),
        })
    }
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            budget: Budget::Measured,
            reserve: 0,
            dry_run: false,
            preserve_timestamps: true,
            follow_links: false,
            exclude_patterns: Vec::new(),
        }
    }
}

/// The main sync engine for one source/target pair
#[derive(Debug, Clone)]
pub struct SyncEngine {
    source: PathBuf,
    target: PathBuf,
    options: SyncOptions,
    scan_options: ScanOptions,
}

impl SyncEngine {
    /// Create an engine, failing if either root is not an existing directory
    pub fn new(
        source: impl Into<PathBuf>,
        target: impl Into<PathBuf>,
        options: SyncOptions,
    ) -> Result<Self> {
        let source = source.into();
        let target = target.into();

        validate_directory(&source, "Source")?;
        validate_directory(&target, "Target")?;

        let scan_options = ScanOptions {
            follow_links: options.follow_links,
            exclude: ExcludeMatcher::new(&options.exclude_patterns)?,
        };

        Ok(Self {
            source,
            target,
            options,
            scan_options,
        })
    }

    /// Scan both trees and build the fitted plan without executing it
    pub fn plan(&self) -> Result<Plan> {
        info!(
            "Scanning {} -> {}",
            self.source.display(),
            self.target.display()
        );

        let source_files = walk(&self.source, &self.scan_options)
            .with_context(|| format!("Failed to scan source {}", self.source.display()))?;
        let target_files = walk(&self.target, &self.scan_options)
            .with_context(|| format!("Failed to scan target {}", self.target.display()))?;

        info!(
            "Found {} source files and {} target files",
            source_files.len(),
            target_files.len()
        );

        let records = build(&source_files, &target_files);
        let available = self.available_bytes()?;

        let plan = SpaceFitter::new(available).fit(records)?;

        for (record, action) in plan.actions() {
            debug!(
                "{} @ {} -> {:?}",
                record.path.display(),
                format_timestamp(record),
                action
            );
        }

        if !plan.fits() {
            warn!(
                "Projected growth of {} bytes exceeds the {} bytes available; continuing best-effort",
                plan.total(),
                plan.available()
            );
        }

        Ok(plan)
    }

    /// Plan and execute, writing one report line per record to `out`
    pub fn run<W: Write>(&self, out: &mut W) -> Result<SyncSummary> {
        let plan = self.plan()?;

        let summary = Executor::new(&self.source, &self.target)
            .dry_run(self.options.dry_run)
            .preserve_timestamps(self.options.preserve_timestamps)
            .follow_links(self.options.follow_links)
            .apply(&plan, out)
            .context("Failed to apply sync plan")?;

        info!(
            "Sync completed in {:.2}s: {} written, {} freed",
            summary.duration.as_secs_f64(),
            summary.bytes_written,
            summary.bytes_freed
        );

        Ok(summary)
    }

    /// Budget for the fitter: free space (or the fixed override) minus the reserve
    fn available_bytes(&self) -> Result<i64> {
        let free = match self.options.budget {
            Budget::Fixed(bytes) => bytes,
            Budget::Measured => fs2::available_space(&self.target).with_context(|| {
                format!("Failed to query free space on {}", self.target.display())
            })?,
        };

        let available = free.saturating_sub(self.options.reserve);
        debug!(
            "Free space {} bytes, reserve {} bytes, budget {} bytes",
            free, self.options.reserve, available
        );

        Ok(signed(available))
    }
}

/// Fail unless `path` exists and is a directory
pub fn validate_directory(path: &Path, role: &str) -> Result<()> {
    if !path.exists() {
        bail!("{} path does not exist: {}", role, path.display());
    }
    if !path.is_dir() {
        bail!("{} path is not a directory: {}", role, path.display());
    }
    Ok(())
}

fn format_timestamp(record: &SyncRecord) -> String {
    let timestamp: DateTime<Utc> = record.timestamp().into();
    timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
}
