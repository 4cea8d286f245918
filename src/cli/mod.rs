//! Command-line interface for handover.
//!
//! # Available Commands
//!
//! - `update` - hand the artifact over to an updater process
//! - `check` - report whether the artifact is stale
//! - `rollback` - move the backup of the previous version back into place
//! - `apply` - (hidden) the updater process entry point spawned by `update`
//!
//! # Global Options
//!
//! - `--verbose` / `-v`: debug logging
//! - `--quiet` / `-q`: errors only
//! - `--config` / `-c`: custom global configuration file
//!
//! Logs are written to stderr. `RUST_LOG` overrides the level chosen by the
//! flags.
//!
//! # Examples
//!
//! ```bash
//! # Replace the running artifact and restart it with the same arguments
//! handover update --remote https://example.com/app --local ~/bin/app -- --resume
//!
//! # Only update when the remote is newer
//! handover update --if-stale --remote https://example.com/app --local ~/bin/app
//!
//! # Undo the last update
//! handover rollback --local ~/bin/app
//! ```

mod apply;
mod check;
mod rollback;
mod update;

use crate::config::GlobalConfig;
use crate::upgrade::runtime::update_context;
use crate::utils::platform::resolve_path;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Runtime configuration derived from the global flags.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Log level filter used when `RUST_LOG` is not set.
    pub log_level: String,

    /// Path to a custom global configuration file.
    pub config_path: Option<PathBuf>,
}

impl CliConfig {
    /// Install the global tracing subscriber, writing to stderr.
    ///
    /// Only the first call in a process has an effect.
    pub fn init_logging(&self) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.log_level));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

/// Main CLI structure for handover.
#[derive(Parser, Debug)]
#[command(
    name = "handover",
    about = "Replace a running executable with its next version",
    version,
    long_about = "handover replaces an executable artifact with a newer version fetched from a \
                  URL. The update runs in a separate process generation so the original \
                  artifact can be moved aside, and the new version is relaunched with the \
                  original arguments."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress everything but errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Path to a custom global configuration file
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Updater process entry point (spawned by `update`)
    #[command(hide = true)]
    Apply(apply::ApplyCommand),

    /// Hand the artifact over to an updater process and exit
    Update(update::UpdateCommand),

    /// Check whether the artifact needs an update
    Check(check::CheckCommand),

    /// Restore the previous version from its backup
    Rollback(rollback::RollbackCommand),
}

impl Cli {
    /// Execute the parsed command.
    ///
    /// # Errors
    ///
    /// Returns whatever error the command produced; the binary turns it into
    /// a single line on stderr and exit code 1.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    /// Translate the global flags into a [`CliConfig`].
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "info"
        };

        CliConfig {
            log_level: log_level.to_string(),
            config_path: self.config.clone(),
        }
    }

    /// Execute with an explicit configuration.
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        config.init_logging();
        let global = GlobalConfig::load_with_optional(config.config_path.clone()).await?;

        match self.command {
            Commands::Apply(cmd) => cmd.execute(&global).await,
            Commands::Update(cmd) => cmd.execute(&global, config.config_path.as_deref()).await,
            Commands::Check(cmd) => cmd.execute().await,
            Commands::Rollback(cmd) => cmd.execute(&global).await,
        }
    }
}

/// Resolve a `--local` value, defaulting to the running executable.
fn resolve_local(local: Option<&str>) -> Result<PathBuf> {
    match local {
        Some(path) => resolve_path(path),
        None => Ok(update_context()?),
    }
}
