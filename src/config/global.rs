//! Global configuration management for handover.
//!
//! The global configuration file holds user-wide settings that tune the
//! update protocol. It is optional; a missing file means defaults.
//!
//! # Configuration File Location
//!
//! Resolved in this order:
//!
//! 1. The `--config` command line flag
//! 2. The `HANDOVER_CONFIG_PATH` environment variable
//! 3. **Unix/macOS**: `~/.handover/config.toml`,
//!    **Windows**: `%LOCALAPPDATA%\handover\config.toml`
//!
//! # File Format
//!
//! ```toml
//! [upgrade]
//! payload_prefix = "myapp-updater"
//! eviction_attempts = 10
//! eviction_delay_ms = 1000
//!
//! [upgrade.relaunch]
//! kind = "hosted"
//! home = "/opt/jre"
//! executable = "bin/java"
//! launch_args = ["-jar"]
//! ```

use crate::constants::CONFIG_PATH_ENV;
use crate::upgrade::config::UpgradeConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Global configuration structure.
///
/// # Examples
///
/// ```rust,no_run
/// use handover_cli::config::GlobalConfig;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = GlobalConfig::load().await?;
/// println!("payload prefix: {}", config.upgrade.payload_prefix());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GlobalConfig {
    /// Self-replacement settings.
    #[serde(default)]
    pub upgrade: UpgradeConfig,
}

impl GlobalConfig {
    /// Load global configuration from the default location.
    ///
    /// A missing file yields the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the default path cannot be determined or the file
    /// exists but cannot be read or parsed.
    pub async fn load() -> Result<Self> {
        Self::load_with_optional(None).await
    }

    /// Load global configuration from `path`, or from the default location
    /// when `path` is `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or contains
    /// invalid TOML.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => Self::default_path()?,
        };

        if path.exists() {
            Self::load_from(&path).await
        } else {
            debug!("No global config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Load global configuration from a specific file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the TOML does not
    /// match the expected schema.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read global config from {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse global config from {}", path.display()))
    }

    /// Get the file path for global configuration.
    ///
    /// `HANDOVER_CONFIG_PATH` overrides the platform default.
    ///
    /// # Errors
    ///
    /// Returns an error if the home (or, on Windows, local data) directory
    /// cannot be determined.
    pub fn default_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV)
            && !path.is_empty()
        {
            return Ok(PathBuf::from(path));
        }

        let config_dir = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?
                .join("handover")
        } else {
            dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?
                .join(".handover")
        };

        Ok(config_dir.join("config.toml"))
    }
}
