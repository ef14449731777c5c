use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fitsync::config::{parse_size, LoggingConfig};
use fitsync::report::format_space;
use fitsync::{Budget, Config, SyncEngine, SyncOptions, SyncSummary};

#[derive(Parser)]
#[command(name = "fitsync")]
#[command(about = "One-way directory sync that keeps the newest files when space runs out")]
#[command(version)]
struct Cli {
    /// Directory to copy from
    source: PathBuf,

    /// Directory to copy into
    target: PathBuf,

    /// Configuration file path (defaults to XDG config location)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Report the plan without touching the target
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Use this budget instead of the target's free space (e.g. "500MB")
    #[arg(long, value_parser = parse_size_arg)]
    available: Option<u64>,

    /// Space to leave free on the target (e.g. "1GB")
    #[arg(long, value_parser = parse_size_arg)]
    reserve: Option<u64>,

    /// Ignore files or directories matching this name pattern (repeatable)
    #[arg(short, long = "exclude", value_name = "PATTERN")]
    exclude: Vec<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_size_arg(value: &str) -> Result<u64, String> {
    parse_size(value).map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = load_config(cli.config.clone())?;

    init_logging(cli.verbose, &config.logging)?;
    info!("Starting fitsync v{}", env!("CARGO_PKG_VERSION"));

    cmd_sync(cli, &config)
}

/// Initialize logging based on verbosity level and configuration
fn init_logging(verbose: bool, logging: &LoggingConfig) -> Result<()> {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level))
    };

    // stdout carries the per-file report
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(logging.color);

    if logging.format == "compact" {
        tracing_subscriber::registry()
            .with(layer.compact())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry().with(layer).with(filter).init();
    }

    Ok(())
}

/// Load configuration from specified path or default location
fn load_config(config_path: Option<PathBuf>) -> Result<Config> {
    match config_path {
        Some(path) => Config::load(&path),
        None => Config::load_or_default(),
    }
}

/// Sync the source tree into the target tree
fn cmd_sync(cli: Cli, config: &Config) -> Result<()> {
    let mut options = SyncOptions::from_config(config)?;
    options.dry_run |= cli.dry_run;
    if let Some(bytes) = cli.available {
        options.budget = Budget::Fixed(bytes);
    }
    if let Some(bytes) = cli.reserve {
        options.reserve = bytes;
    }
    options.exclude_patterns.extend(cli.exclude);

    let engine = SyncEngine::new(cli.source, cli.target, options)?;

    let stdout = std::io::stdout();
    let summary = engine.run(&mut stdout.lock())?;

    print_summary(&summary);

    Ok(())
}

/// Print the run summary to stderr
fn print_summary(summary: &SyncSummary) {
    let prefix = if summary.dry_run { "Dry run: " } else { "" };

    eprintln!(
        "{}{} files: {} copied, {} replaced, {} deleted, {} skipped, {} unchanged",
        prefix,
        summary.total_files,
        summary.created,
        summary.replaced,
        summary.deleted,
        summary.skipped_too_old,
        summary.unchanged
    );

    if !summary.fits {
        eprintln!(
            "Warning: projected usage exceeds available space by {}",
            format_space(summary.projected_total - summary.available)
        );
    }
}
