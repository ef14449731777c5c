/// Common test utilities and helpers for fitsync tests

use assert_fs::prelude::*;
use assert_fs::TempDir;
use filetime::{set_file_mtime, FileTime};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Source, target, and config directories for one CLI run
pub struct TestEnvironment {
    pub temp_dir: TempDir,
    pub source: PathBuf,
    pub target: PathBuf,
    pub config_home: PathBuf,
}

impl TestEnvironment {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let source = temp_dir.child("source");
        let target = temp_dir.child("target");
        let config_home = temp_dir.child("config");
        source.create_dir_all().expect("Failed to create source dir");
        target.create_dir_all().expect("Failed to create target dir");
        config_home.create_dir_all().expect("Failed to create config dir");

        Self {
            source: source.path().to_path_buf(),
            target: target.path().to_path_buf(),
            config_home: config_home.path().to_path_buf(),
            temp_dir,
        }
    }

    /// Write `bytes` bytes to `relative` under the source tree with a fixed mtime
    pub fn source_file(&self, relative: &str, bytes: usize, mtime: i64) -> PathBuf {
        write_file(&self.source, relative, bytes, mtime)
    }

    /// Write `bytes` bytes to `relative` under the target tree with a fixed mtime
    pub fn target_file(&self, relative: &str, bytes: usize, mtime: i64) -> PathBuf {
        write_file(&self.target, relative, bytes, mtime)
    }

    /// Write a config file under the isolated XDG config home
    pub fn create_test_config(&self, content: &str) -> PathBuf {
        let config_dir = self.config_home.join("fitsync");
        std::fs::create_dir_all(&config_dir).expect("Failed to create config dir");
        let config_path = config_dir.join("config.yml");
        std::fs::write(&config_path, content).expect("Failed to write test config");
        config_path
    }

    /// Run the binary against this environment's source and target
    pub fn sync(&self, extra_args: &[&str]) -> Output {
        let mut args: Vec<&str> = extra_args.to_vec();
        let source = self.source.to_str().expect("utf-8 temp path");
        let target = self.target.to_str().expect("utf-8 temp path");
        args.push(source);
        args.push(target);
        self.run(&args)
    }

    /// Run the binary with arbitrary arguments
    pub fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_fitsync"))
            .args(args)
            .env("XDG_CONFIG_HOME", &self.config_home)
            .env_remove("RUST_LOG")
            .output()
            .expect("Failed to execute fitsync")
    }
}

fn write_file(root: &Path, relative: &str, bytes: usize, mtime: i64) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create parent dir");
    }
    std::fs::write(&path, vec![b'x'; bytes]).expect("Failed to write file");
    set_file_mtime(&path, FileTime::from_unix_time(mtime, 0)).expect("Failed to set mtime");
    path
}

/// Report lines printed on stdout
pub fn report_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect()
}

/// Assertion helpers for test validation
pub fn assert_contains_all(text: &str, expected: &[&str]) {
    for item in expected {
        assert!(
            text.contains(item),
            "Expected text to contain '{}', but it didn't. Text: {}",
            item,
            text
        );
    }
}
