use crate::constants::{
    DEFAULT_PAYLOAD_PREFIX, EVICTION_MAX_ATTEMPTS, EVICTION_RETRY_DELAY, PAYLOAD_PREFIX_ENV,
};
use crate::upgrade::backup::EvictionPolicy;
use crate::upgrade::runtime::Runtime;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration settings for self-replacement.
///
/// Lives in the `[upgrade]` table of the global configuration file. Every
/// field is optional; an empty table behaves like [`UpgradeConfig::default`].
///
/// # Examples
///
/// ```rust,no_run
/// use handover_cli::upgrade::config::UpgradeConfig;
///
/// let config = UpgradeConfig::default();
/// assert_eq!(config.eviction_attempts, 10);
/// assert_eq!(config.eviction_delay_ms, 1000);
/// ```
///
/// ## TOML Example
/// ```toml
/// [upgrade]
/// payload_prefix = "myapp-updater"
/// eviction_attempts = 10
/// eviction_delay_ms = 1000
///
/// [upgrade.relaunch]
/// kind = "hosted"
/// home = "/opt/jre"
/// executable = "bin/java"
/// windowed_executable = "javaw.exe"
/// launch_args = ["-jar"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeConfig {
    /// File name prefix of the temporary payload.
    ///
    /// Lets an embedding application give its updater process a
    /// recognizable name. `HANDOVER_PAYLOAD_PREFIX` takes precedence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_prefix: Option<String>,

    /// Total rename attempts while evicting a locked artifact.
    ///
    /// # Default: `10`
    #[serde(default = "default_eviction_attempts")]
    pub eviction_attempts: u32,

    /// Delay between two eviction attempts, in milliseconds.
    ///
    /// # Default: `1000`
    #[serde(default = "default_eviction_delay_ms")]
    pub eviction_delay_ms: u64,

    /// How the installed artifact is started after the update.
    ///
    /// # Default: native
    #[serde(default)]
    pub relaunch: Runtime,
}

impl Default for UpgradeConfig {
    fn default() -> Self {
        Self {
            payload_prefix: None,
            eviction_attempts: default_eviction_attempts(),
            eviction_delay_ms: default_eviction_delay_ms(),
            relaunch: Runtime::Native,
        }
    }
}

impl UpgradeConfig {
    /// Resolve the payload prefix: environment, then config, then default.
    #[must_use]
    pub fn payload_prefix(&self) -> String {
        std::env::var(PAYLOAD_PREFIX_ENV)
            .ok()
            .filter(|prefix| !prefix.is_empty())
            .or_else(|| self.payload_prefix.clone())
            .unwrap_or_else(|| DEFAULT_PAYLOAD_PREFIX.to_string())
    }

    /// The eviction retry policy described by this configuration.
    #[must_use]
    pub fn eviction_policy(&self) -> EvictionPolicy {
        EvictionPolicy {
            max_attempts: self.eviction_attempts.max(1),
            delay: Duration::from_millis(self.eviction_delay_ms),
        }
    }
}

const fn default_eviction_attempts() -> u32 {
    EVICTION_MAX_ATTEMPTS
}

const fn default_eviction_delay_ms() -> u64 {
    EVICTION_RETRY_DELAY.as_millis() as u64
}
