//! The updater process, driven directly with a handoff message.

use crate::common::TestEnv;
use anyhow::Result;
use handover_cli::upgrade::UpdateRequest;
use predicates::prelude::*;

#[cfg(unix)]
#[test]
fn test_apply_replaces_and_relaunches() -> Result<()> {
    use crate::common::{RELAUNCH_SCRIPT, wait_for_file};
    use std::time::Duration;

    let env = TestEnv::new()?;
    let remote = env.remote_file("app-2.0", RELAUNCH_SCRIPT)?;
    let install_dir = env.join("install");
    std::fs::create_dir(&install_dir)?;
    let local = install_dir.join("app");
    std::fs::write(&local, b"version one")?;

    let request = UpdateRequest::new(remote, &local, ["one", "--two", "three four"])?;

    env.handover_command().arg("apply").args(request.encode()).assert().success();

    assert_eq!(std::fs::read(&local)?, RELAUNCH_SCRIPT);
    assert_eq!(std::fs::read(install_dir.join("app.bak"))?, b"version one");

    let relaunched = wait_for_file(&install_dir.join("relaunched.txt"), Duration::from_secs(10))?;
    assert_eq!(relaunched.trim_end(), "one --two three four");
    Ok(())
}

/// A failed fetch leaves the backup in place and relaunches nothing.
#[test]
fn test_apply_fetch_failure_keeps_backup() -> Result<()> {
    let env = TestEnv::new()?;
    let local = env.join("app.jar");
    std::fs::write(&local, b"version one")?;
    let missing = reqwest::Url::from_file_path(env.join("not-published"))
        .map_err(|()| anyhow::anyhow!("bad path"))?;

    let request = UpdateRequest::new(missing, &local, Vec::<String>::new())?;

    env.handover_command()
        .arg("apply")
        .args(request.encode())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to update"));

    assert!(!local.exists());
    assert_eq!(std::fs::read(env.join("app.bak"))?, b"version one");
    Ok(())
}

/// Eviction budget comes from the global configuration.
#[test]
fn test_apply_uses_configured_eviction_policy() -> Result<()> {
    let env = TestEnv::new()?;
    env.write_config("[upgrade]\neviction_attempts = 1\neviction_delay_ms = 10\n")?;

    // A directory cannot be renamed onto a non-empty directory, so eviction fails.
    let local = env.join("app");
    std::fs::create_dir(&local)?;
    let backup = env.join("app.bak");
    std::fs::create_dir(&backup)?;
    std::fs::write(backup.join("keep"), b"x")?;

    let remote = env.remote_file("app-2.0", b"new")?;
    let request = UpdateRequest::new(remote, &local, Vec::<String>::new())?;

    env.handover_command()
        .arg("apply")
        .args(request.encode())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to evict"));

    assert!(local.is_dir());
    Ok(())
}
