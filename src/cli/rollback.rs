use crate::config::GlobalConfig;
use crate::upgrade::BackupManager;
use anyhow::{Context, Result, bail};
use clap::Args;
use colored::Colorize;

/// Restore the previous version of an artifact from its backup.
#[derive(Args, Debug)]
pub struct RollbackCommand {
    /// Artifact to restore (default: the running executable)
    #[arg(long, value_name = "PATH")]
    local: Option<String>,
}

impl RollbackCommand {
    pub async fn execute(self, config: &GlobalConfig) -> Result<()> {
        let local = super::resolve_local(self.local.as_deref())?;
        let manager = BackupManager::new(local).policy(config.upgrade.eviction_policy());

        if !manager.backup_exists() {
            bail!("No backup found at {}. Cannot rollback.", manager.backup_path().display());
        }

        println!("{}", "Rolling back to previous version...".yellow());
        manager.restore().await.context("Failed to restore from backup")?;
        println!("{}", "Successfully rolled back to previous version".green());

        Ok(())
    }
}
