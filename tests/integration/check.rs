use crate::common::{TestEnv, set_modified};
use anyhow::Result;
use predicates::prelude::*;
use std::time::{Duration, SystemTime};

#[test]
fn test_check_missing_local_needs_update() -> Result<()> {
    let env = TestEnv::new()?;
    let remote = env.remote_file("app-2.0", b"new")?;

    env.handover_command()
        .args(["check", "--remote", remote.as_str(), "--local"])
        .arg(env.join("app"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Update available"));
    Ok(())
}

#[test]
fn test_check_older_remote_is_up_to_date() -> Result<()> {
    let env = TestEnv::new()?;
    let remote = env.remote_file("app-2.0", b"new")?;
    set_modified(&env.join("app-2.0"), SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000))?;
    std::fs::write(env.join("app"), b"installed")?;

    env.handover_command()
        .args(["check", "--remote", remote.as_str(), "--local"])
        .arg(env.join("app"))
        .assert()
        .success()
        .stdout(predicate::str::contains("is up to date"));
    Ok(())
}

/// Same timestamp on both sides counts as stale.
#[test]
fn test_check_equal_times_need_update() -> Result<()> {
    let env = TestEnv::new()?;
    let stamp = SystemTime::UNIX_EPOCH + Duration::from_secs(1_600_000_000);
    let remote = env.remote_file("app-2.0", b"new")?;
    std::fs::write(env.join("app"), b"installed")?;
    set_modified(&env.join("app-2.0"), stamp)?;
    set_modified(&env.join("app"), stamp)?;

    env.handover_command()
        .args(["check", "--remote", remote.as_str(), "--local"])
        .arg(env.join("app"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Update available"));
    Ok(())
}

#[test]
fn test_check_missing_remote_file_fails() -> Result<()> {
    let env = TestEnv::new()?;
    std::fs::write(env.join("app"), b"installed")?;
    let remote = reqwest::Url::from_file_path(env.join("gone")).map_err(|()| anyhow::anyhow!("bad path"))?;

    env.handover_command()
        .args(["check", "--remote", remote.as_str(), "--local"])
        .arg(env.join("app"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to check"));
    Ok(())
}
