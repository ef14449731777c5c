//! fitsync - One-way directory sync for capacity-constrained targets
//!
//! fitsync copies a source tree onto a target tree. When the target cannot
//! hold everything, it drops the oldest files first (including files that
//! only exist on the target) until the projected result fits.
//!
//! ## Pipeline
//!
//! - **Scan**: both roots are walked into relative path -> size/mtime maps
//! - **Pair**: the two maps merge into one [`SyncRecord`] per path
//! - **Fit**: records are ordered oldest first and excluded until the plan fits
//! - **Execute**: each record's [`Action`] is applied in plan order
//!
//! ## Modules
//!
//! - [`config`]: Configuration management and parsing
//! - [`scan`]: Directory traversal and exclude patterns
//! - [`record`]: Sync records and their processing order
//! - [`action`]: Per-record action classification and space effects
//! - [`fit`]: Oldest-first space fitting
//! - [`executor`]: Applying a plan to the filesystem
//! - [`report`]: Per-file report lines
//! - [`sync`]: End-to-end orchestration

pub mod action;
pub mod config;
pub mod executor;
pub mod fit;
pub mod record;
pub mod report;
pub mod scan;
pub mod sync;

pub use action::Action;
pub use config::Config;
pub use executor::{Executor, SyncSummary};
pub use fit::{Plan, SpaceFitter};
pub use record::{FileAttrs, FileMap, SyncRecord};
pub use sync::{Budget, SyncEngine, SyncOptions};
