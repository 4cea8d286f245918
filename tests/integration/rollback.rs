use crate::common::TestEnv;
use anyhow::Result;
use handover_cli::upgrade::BackupManager;
use predicates::prelude::*;

#[test]
fn test_rollback_restores_backup() -> Result<()> {
    let env = TestEnv::new()?;
    std::fs::write(env.join("app.jar"), b"broken update")?;
    std::fs::write(env.join("app.bak"), b"previous version")?;

    env.handover_command()
        .args(["rollback", "--local"])
        .arg(env.join("app.jar"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Successfully rolled back"));

    assert_eq!(std::fs::read(env.join("app.jar"))?, b"previous version");
    assert!(!env.join("app.bak").exists());
    Ok(())
}

#[test]
fn test_rollback_without_backup_fails() -> Result<()> {
    let env = TestEnv::new()?;
    std::fs::write(env.join("app"), b"current")?;

    env.handover_command()
        .args(["rollback", "--local"])
        .arg(env.join("app"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No backup found"));

    assert_eq!(std::fs::read(env.join("app"))?, b"current");
    Ok(())
}

/// Evict through the library, then roll back through the binary.
#[tokio::test]
async fn test_evict_then_rollback() -> Result<()> {
    let env = TestEnv::new()?;
    let local = env.join("app");
    tokio::fs::write(&local, b"version one").await?;

    let eviction = BackupManager::new(local.clone()).evict().await?;
    assert_eq!(eviction.backup, env.join("app.bak"));
    assert!(!local.exists());

    env.handover_command().args(["rollback", "--local"]).arg(&local).assert().success();

    assert_eq!(tokio::fs::read(&local).await?, b"version one");
    Ok(())
}
