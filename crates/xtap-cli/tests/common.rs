//! Shared fixture for CLI integration tests.
//!
//! Each integration test file compiles this module separately, so helpers
//! unused by one file would otherwise warn.
#![allow(dead_code)]

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const POST_ID: &str = "1890000000000000101";

pub struct TestFixture {
    _temp_dir: TempDir,
    data_dir: PathBuf,
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl TestFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let data_dir = temp_dir.path().join(".xtap");

        Self {
            _temp_dir: temp_dir,
            data_dir,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn sample_path(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests/samples")
            .join(name)
    }

    pub fn command(&self) -> Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("xtap");
        cmd.env_remove("RUST_LOG")
            .env_remove("XTAP_PATH")
            .env("NO_COLOR", "1")
            .arg("--data-dir")
            .arg(self.data_dir());
        cmd
    }

    pub fn ingest_session(&self) -> anyhow::Result<()> {
        let output = self
            .command()
            .arg("ingest")
            .arg(Self::sample_path("session.jsonl"))
            .output()?;

        if !output.status.success() {
            anyhow::bail!(
                "ingest failed: {}",
                String::from_utf8_lossy(&output.stderr)
            );
        }
        Ok(())
    }

    /// Run a command with `--format json` and parse stdout
    pub fn json(&self, args: &[&str]) -> anyhow::Result<serde_json::Value> {
        let output = self
            .command()
            .args(args)
            .arg("--format")
            .arg("json")
            .output()?;

        if !output.status.success() {
            anyhow::bail!(
                "{:?} failed: {}",
                args,
                String::from_utf8_lossy(&output.stderr)
            );
        }
        Ok(serde_json::from_slice(&output.stdout)?)
    }
}
