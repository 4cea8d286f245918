use crate::common::{TestEnv, line_count};
use anyhow::Result;
use predicates::prelude::*;

/// A handoff message without `--remote` is malformed input.
#[test]
fn test_apply_without_remote_fails_with_single_line() -> Result<()> {
    let env = TestEnv::new()?;
    let local = env.join("app");

    let output = env
        .handover_command()
        .arg("apply")
        .arg("--local")
        .arg(&local)
        .arg("--args")
        .arg("foo")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("missing required flag --remote"))
        .get_output()
        .clone();

    assert_eq!(line_count(&output.stderr), 1, "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(!local.exists());
    Ok(())
}

#[test]
fn test_apply_with_invalid_url_fails() -> Result<()> {
    let env = TestEnv::new()?;

    env.handover_command()
        .args(["apply", "--remote", "not a url", "--local"])
        .arg(env.join("app"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Malformed handoff message"));
    Ok(())
}

/// Usage errors are reported like every other failure.
#[test]
fn test_update_without_remote_exits_one() -> Result<()> {
    let env = TestEnv::new()?;

    let output = env
        .handover_command()
        .args(["update", "--local"])
        .arg(env.join("app"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--remote"))
        .get_output()
        .clone();

    assert_eq!(line_count(&output.stderr), 1, "stderr: {}", String::from_utf8_lossy(&output.stderr));
    Ok(())
}

#[test]
fn test_help_succeeds() -> Result<()> {
    let env = TestEnv::new()?;

    env.handover_command()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("update"))
        .stdout(predicate::str::contains("rollback"))
        .stdout(predicate::str::contains("apply").not());
    Ok(())
}

#[test]
fn test_broken_config_is_reported() -> Result<()> {
    let env = TestEnv::new()?;
    env.write_config("[upgrade\neviction_attempts = ")?;

    env.handover_command()
        .args(["rollback", "--local"])
        .arg(env.join("app"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to parse global config"));
    Ok(())
}
