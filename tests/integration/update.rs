//! The full chain: `update` builds a payload, the payload applies the update
//! and relaunches the new artifact.

use crate::common::{TestEnv, set_modified};
use anyhow::Result;
use predicates::prelude::*;
use std::time::{Duration, SystemTime};

#[cfg(unix)]
#[test]
fn test_update_hands_over_to_payload() -> Result<()> {
    use crate::common::{RELAUNCH_SCRIPT, wait_for_file};

    let env = TestEnv::new()?;
    let payload_dir = env.join("tmp");
    std::fs::create_dir(&payload_dir)?;
    let install_dir = env.join("install");
    std::fs::create_dir(&install_dir)?;
    let local = install_dir.join("app");
    std::fs::write(&local, b"version one")?;
    let remote = env.remote_file("app-2.0", RELAUNCH_SCRIPT)?;

    env.handover_command()
        .env("TMPDIR", &payload_dir)
        .env("HANDOVER_PAYLOAD_PREFIX", "myapp-updater")
        .args(["update", "--remote", remote.as_str(), "--local"])
        .arg(&local)
        .args(["--", "--resume", "job 7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updating"));

    let relaunched = wait_for_file(&install_dir.join("relaunched.txt"), Duration::from_secs(20))?;
    assert_eq!(relaunched.trim_end(), "--resume job 7");
    assert_eq!(std::fs::read(&local)?, RELAUNCH_SCRIPT);
    assert_eq!(std::fs::read(install_dir.join("app.bak"))?, b"version one");

    let payloads: Vec<_> = std::fs::read_dir(&payload_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    assert!(payloads.iter().any(|name| name.starts_with("myapp-updater") && !name.ends_with(".json")));
    assert!(payloads.iter().any(|name| name.starts_with("myapp-updater") && name.ends_with(".json")));
    Ok(())
}

#[test]
fn test_update_if_stale_skips_fresh_artifact() -> Result<()> {
    let env = TestEnv::new()?;
    let payload_dir = env.join("tmp");
    std::fs::create_dir(&payload_dir)?;
    let local = env.join("app");
    std::fs::write(&local, b"installed")?;
    let remote = env.remote_file("app-2.0", b"new")?;
    set_modified(&env.join("app-2.0"), SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000))?;

    env.handover_command()
        .env("TMPDIR", &payload_dir)
        .env("TMP", &payload_dir)
        .env("TEMP", &payload_dir)
        .args(["update", "--if-stale", "--remote", remote.as_str(), "--local"])
        .arg(&local)
        .assert()
        .success()
        .stdout(predicate::str::contains("is up to date"));

    assert_eq!(std::fs::read_dir(&payload_dir)?.count(), 0);
    assert_eq!(std::fs::read(&local)?, b"installed");
    Ok(())
}

/// The updater process loads the configuration file given to `update`.
#[cfg(unix)]
#[test]
fn test_update_forwards_config_to_updater() -> Result<()> {
    use crate::common::{RELAUNCH_SCRIPT, wait_for_file};
    use std::os::unix::fs::PermissionsExt;

    let env = TestEnv::new()?;
    let payload_dir = env.join("tmp");
    std::fs::create_dir(&payload_dir)?;

    let runtime_bin = env.join("runtime").join("bin");
    std::fs::create_dir_all(&runtime_bin)?;
    std::fs::write(runtime_bin.join("run"), RELAUNCH_SCRIPT)?;
    std::fs::set_permissions(runtime_bin.join("run"), std::fs::Permissions::from_mode(0o755))?;

    // Only reachable through --config; the default location stays empty.
    std::fs::write(
        env.join("custom.toml"),
        format!(
            "[upgrade]\neviction_attempts = 2\n\n[upgrade.relaunch]\nkind = \"hosted\"\nhome = \"{}\"\nexecutable = \"bin/run\"\n",
            env.join("runtime").display()
        ),
    )?;

    let install_dir = env.join("install");
    std::fs::create_dir(&install_dir)?;
    let local = install_dir.join("app.jar");
    std::fs::write(&local, b"jar v1")?;
    let remote = env.remote_file("app-2.0.jar", b"jar v2")?;

    env.handover_command()
        .env("TMPDIR", &payload_dir)
        .args(["-c", "custom.toml", "update", "--remote", remote.as_str(), "--local"])
        .arg(&local)
        .args(["--", "--resume"])
        .assert()
        .success();

    let relaunched = wait_for_file(&install_dir.join("relaunched.txt"), Duration::from_secs(20))?;
    assert_eq!(relaunched.trim_end(), format!("{} --resume", local.display()));
    assert_eq!(std::fs::read(&local)?, b"jar v2");
    assert_eq!(std::fs::read(install_dir.join("app.bak"))?, b"jar v1");
    Ok(())
}
