//! The updater process.
//!
//! Spawned by `handover update` from a temporary payload with the handoff
//! message as its arguments. Decodes the message, runs the replacement
//! protocol and exits once the updated artifact has been relaunched.

use crate::config::GlobalConfig;
use crate::upgrade::{HttpRemote, ReplacementProtocol, UpdateRequest};
use anyhow::{Context, Result};
use clap::Args;
use std::ffi::OsString;
use tracing::{info, warn};

/// Arguments of the hidden `apply` subcommand.
#[derive(Args, Debug)]
pub struct ApplyCommand {
    /// Handoff message: --remote <url> --local <path> [--args <token>...]
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, num_args = 0.., value_name = "HANDOFF")]
    pub(crate) tokens: Vec<OsString>,
}

impl ApplyCommand {
    pub async fn execute(self, config: &GlobalConfig) -> Result<()> {
        let request = UpdateRequest::decode(&self.tokens).context("Failed to decode handoff message")?;
        info!("Updating {} from {}", request.local().display(), request.remote());

        let protocol = ReplacementProtocol::new(HttpRemote::new())
            .policy(config.upgrade.eviction_policy())
            .runtime(config.upgrade.relaunch.clone());

        let report = protocol
            .run_until(&request, interrupted())
            .await
            .with_context(|| format!("Failed to update {}", request.local().display()))?;

        if let Some(eviction) = &report.eviction {
            info!("Previous version kept at {}", eviction.backup.display());
        }
        info!("Relaunched {}", report.relaunch.executable.display());
        Ok(())
    }
}

/// Completes on Ctrl-C; never completes if the handler cannot be installed.
async fn interrupted() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => warn!("Interrupt received, giving up"),
        Err(e) => {
            warn!("Cannot listen for interrupts: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
