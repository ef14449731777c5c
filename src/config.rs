use anyhow::{anyhow, Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for fitsync
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    /// Synchronization behavior settings
    #[serde(default)]
    pub sync: SyncConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Synchronization configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SyncConfig {
    /// Space to leave free on the target
    #[serde(default = "default_reserve")]
    pub reserve: String, // "0", "500MB", "2GB"

    /// Report the plan without touching the target
    #[serde(default)]
    pub dry_run: bool,

    /// Copy modification times onto copied files
    #[serde(default = "default_true")]
    pub preserve_timestamps: bool,

    /// Follow symbolic links while scanning
    #[serde(default)]
    pub follow_links: bool,

    /// File or directory name patterns to ignore on both sides
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String, // "info"

    /// Log format
    #[serde(default = "default_log_format")]
    pub format: String, // "compact", "full"

    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,
}

// Default value functions
fn default_true() -> bool {
    true
}
fn default_reserve() -> String {
    "0".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "compact".to_string()
}

// Default implementations
impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            reserve: default_reserve(),
            dry_run: false,
            preserve_timestamps: default_true(),
            follow_links: false,
            exclude_patterns: Vec::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            color: default_true(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, falling back to defaults
    pub fn load_or_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load(&config_path)
        } else {
            tracing::debug!("No configuration at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        // Surface a bad reserve value at load time rather than mid-run
        config.reserve_bytes()?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self).context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    /// Get the default configuration file path (XDG compliant)
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = config_dir().context("Failed to get user config directory")?;

        Ok(config_dir.join("fitsync").join("config.yml"))
    }

    /// Reserve as a byte count
    pub fn reserve_bytes(&self) -> Result<u64> {
        parse_size(&self.sync.reserve)
            .with_context(|| format!("Invalid sync.reserve value: {:?}", self.sync.reserve))
    }
}

/// Parse "1500", "500MB", "2.5 GB" into bytes using 1000-based units
pub fn parse_size(input: &str) -> Result<u64> {
    let trimmed = input.trim();
    let split = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(split);

    let value: f64 = number
        .parse()
        .map_err(|_| anyhow!("Expected a number in size {:?}", input))?;

    let multiplier: u64 = match unit.trim().to_ascii_uppercase().as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "MB" | "M" => 1_000_000,
        "GB" | "G" => 1_000_000_000,
        "TB" | "T" => 1_000_000_000_000,
        other => return Err(anyhow!("Unknown size unit {:?} in {:?}", other, input)),
    };

    Ok((value * multiplier as f64).round() as u64)
}
