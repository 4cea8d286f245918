use crate::upgrade::is_up_to_date_at;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use reqwest::Url;

/// Report whether an artifact needs an update.
#[derive(Args, Debug)]
pub struct CheckCommand {
    /// Location of the latest version
    #[arg(long, value_name = "URL")]
    remote: Url,

    /// Artifact to check (default: the running executable)
    #[arg(long, value_name = "PATH")]
    local: Option<String>,
}

impl CheckCommand {
    pub async fn execute(self) -> Result<()> {
        let local = super::resolve_local(self.local.as_deref())?;

        let fresh = is_up_to_date_at(&self.remote, &local)
            .await
            .with_context(|| format!("Failed to check {} for updates", local.display()))?;

        if fresh {
            println!("{}", format!("{} is up to date", local.display()).green());
        } else {
            println!("{}", format!("Update available for {} from {}", local.display(), self.remote).yellow());
        }
        Ok(())
    }
}
