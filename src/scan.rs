//! Directory scanning - relative path to size/mtime for every regular file

use crate::record::{FileAttrs, FileMap};
use anyhow::{Context, Result};
use regex::Regex;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// Traversal options shared by the source and target scans
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Follow symbolic links while walking
    pub follow_links: bool,
    /// Files with any path component matching one of these are ignored
    pub exclude: ExcludeMatcher,
}

/// Glob-like name patterns where `*` matches any run of characters
#[derive(Debug, Clone, Default)]
pub struct ExcludeMatcher {
    patterns: Vec<Regex>,
}

impl ExcludeMatcher {
    pub fn new(patterns: &[String]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|pattern| {
                let escaped = regex::escape(pattern).replace(r"\*", ".*");
                Regex::new(&format!("^{}$", escaped))
                    .with_context(|| format!("Invalid exclude pattern: {}", pattern))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { patterns })
    }

    /// Check whether any component of a relative path matches
    pub fn matches(&self, relative: &Path) -> bool {
        if self.patterns.is_empty() {
            return false;
        }

        relative.components().any(|component| {
            let name = component.as_os_str().to_string_lossy();
            self.patterns.iter().any(|re| re.is_match(&name))
        })
    }
}

/// Walk `root` and collect attributes for every regular file beneath it
pub fn walk(root: &Path, options: &ScanOptions) -> Result<FileMap> {
    let mut files = FileMap::new();

    for entry in WalkDir::new(root).follow_links(options.follow_links) {
        let entry =
            entry.with_context(|| format!("Failed to traverse directory: {}", root.display()))?;

        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root)
            .with_context(|| format!("Path escaped scan root: {}", entry.path().display()))?;

        if options.exclude.matches(relative) {
            debug!("Excluding {} by pattern", relative.display());
            continue;
        }

        let metadata = entry
            .metadata()
            .with_context(|| format!("Failed to read metadata: {}", entry.path().display()))?;
        let modified = metadata
            .modified()
            .with_context(|| format!("Failed to read mtime: {}", entry.path().display()))?;

        files.insert(
            relative.to_path_buf(),
            FileAttrs::new(metadata.len(), modified),
        );
    }

    debug!("Scanned {} files under {}", files.len(), root.display());

    Ok(files)
}
