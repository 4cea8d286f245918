//! Start an update of an artifact.

use crate::config::GlobalConfig;
use crate::upgrade::{Launcher, UpdateRequest, is_up_to_date_at};
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use reqwest::Url;
use std::ffi::OsString;
use std::path::Path;
use tracing::debug;

/// Hand an artifact over to an updater process.
///
/// Returns as soon as the updater has been spawned. When the artifact being
/// replaced is the one running this command, the caller must exit right
/// away so the updater can move it aside.
#[derive(Args, Debug)]
pub struct UpdateCommand {
    /// Location of the new version (http, https or file URL)
    #[arg(long, value_name = "URL")]
    pub(crate) remote: Url,

    /// Artifact to replace (default: the running executable)
    #[arg(long, value_name = "PATH")]
    pub(crate) local: Option<String>,

    /// Do nothing when the local artifact is newer than the remote one
    #[arg(long)]
    pub(crate) if_stale: bool,

    /// Arguments passed to the updated artifact when it is relaunched
    #[arg(last = true, value_name = "ARGS")]
    pub(crate) restart_args: Vec<OsString>,
}

impl UpdateCommand {
    /// `config_path` is the file given with `--config`; the updater process
    /// loads the same file.
    pub async fn execute(self, config: &GlobalConfig, config_path: Option<&Path>) -> Result<()> {
        let local = super::resolve_local(self.local.as_deref())?;

        if self.if_stale
            && is_up_to_date_at(&self.remote, &local)
                .await
                .with_context(|| format!("Failed to check {} for updates", local.display()))?
        {
            println!("{}", format!("{} is up to date", local.display()).green());
            return Ok(());
        }

        let request = UpdateRequest::new(self.remote, &local, self.restart_args)?;
        debug!("Handoff message: {:?}", request.encode());

        let mut launcher = Launcher::from_config(&config.upgrade);
        if let Some(path) = config_path {
            launcher = launcher.config_path(path);
        }

        let report = launcher
            .launch(&request)
            .context("Failed to start the updater process")?;

        println!(
            "{}",
            format!("Updating {} in the background ({})", request.local().display(), report.payload.display())
                .cyan()
        );
        Ok(())
    }
}
