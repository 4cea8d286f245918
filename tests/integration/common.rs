//! Shared helpers for the integration tests.

use anyhow::{Context, Result};
use assert_cmd::Command;
use reqwest::Url;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};
use tempfile::TempDir;

/// An isolated directory plus a `handover` command that never touches the
/// user's real configuration.
pub struct TestEnv {
    pub temp: TempDir,
}

impl TestEnv {
    pub fn new() -> Result<Self> {
        handover_cli::test_utils::init_test_logging(None);
        Ok(Self {
            temp: TempDir::new()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    pub fn join(&self, name: &str) -> PathBuf {
        self.temp.path().join(name)
    }

    /// Location of the config file the commands read (absent unless written).
    pub fn config_path(&self) -> PathBuf {
        self.join("config.toml")
    }

    pub fn write_config(&self, content: &str) -> Result<()> {
        std::fs::write(self.config_path(), content).context("Failed to write test config")
    }

    pub fn handover_command(&self) -> Command {
        let mut cmd = Command::cargo_bin("handover").expect("handover binary is built for tests");
        cmd.env("HANDOVER_CONFIG_PATH", self.config_path())
            .env_remove("HANDOVER_PAYLOAD_PREFIX")
            .env_remove("RUST_LOG")
            .current_dir(self.path());
        cmd
    }

    /// Write `content` to `name` and return its `file://` URL.
    pub fn remote_file(&self, name: &str, content: &[u8]) -> Result<Url> {
        let path = self.join(name);
        std::fs::write(&path, content)?;
        Url::from_file_path(&path).map_err(|()| anyhow::anyhow!("not an absolute path: {}", path.display()))
    }
}

/// Set the modification time of `path`.
pub fn set_modified(path: &Path, time: SystemTime) -> Result<()> {
    let file = std::fs::File::options().write(true).open(path)?;
    file.set_modified(time)?;
    Ok(())
}

/// Poll until `path` exists with non-empty content, or fail after `timeout`.
pub fn wait_for_file(path: &Path, timeout: Duration) -> Result<String> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Ok(content) = std::fs::read_to_string(path)
            && !content.is_empty()
        {
            return Ok(content);
        }
        if Instant::now() >= deadline {
            anyhow::bail!("{} did not appear within {:?}", path.display(), timeout);
        }
        std::thread::sleep(Duration::from_millis(50));
    }
}

/// A shell script standing in for an updated artifact: it records its
/// arguments into `relaunched.txt` in its working directory.
#[cfg(unix)]
pub const RELAUNCH_SCRIPT: &[u8] = b"#!/bin/sh\necho \"$*\" > relaunched.txt\n";

/// Count the non-empty lines in a stderr capture.
pub fn line_count(output: &[u8]) -> usize {
    String::from_utf8_lossy(output).lines().filter(|line| !line.trim().is_empty()).count()
}
