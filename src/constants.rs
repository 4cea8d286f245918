//! Global constants used throughout the handover codebase.
//!
//! This module contains retry parameters, file naming conventions and
//! environment variable names that are shared across multiple modules.
//! Defining them centrally keeps the process-generation contract in one
//! place.

use std::time::Duration;

/// Maximum number of rename attempts when evicting the installed artifact.
///
/// Together with [`EVICTION_RETRY_DELAY`] this bounds how long an updater
/// process waits for the previous generation to release its lock on the
/// artifact (about ten seconds in the worst case).
pub const EVICTION_MAX_ATTEMPTS: u32 = 10;

/// Fixed delay between two eviction attempts.
pub const EVICTION_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Extension given to the evicted artifact.
pub const BACKUP_EXTENSION: &str = "bak";

/// Default file name prefix of the temporary updater payload.
pub const DEFAULT_PAYLOAD_PREFIX: &str = "handover";

/// Subcommand that turns a payload copy into an updater process.
pub const APPLY_SUBCOMMAND: &str = "apply";

/// Global flag carrying the configuration file to the updater process.
pub const CONFIG_FLAG: &str = "--config";

/// Environment variable overriding the payload prefix.
pub const PAYLOAD_PREFIX_ENV: &str = "HANDOVER_PAYLOAD_PREFIX";

/// Environment variable overriding the global configuration file location.
pub const CONFIG_PATH_ENV: &str = "HANDOVER_CONFIG_PATH";

/// Extension of the diagnostic sidecar written next to the payload.
pub const DESCRIPTOR_EXTENSION: &str = "json";
