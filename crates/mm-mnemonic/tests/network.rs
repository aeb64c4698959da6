mod common;

use common::TestEnv;
use predicates::prelude::*;
use std::net::TcpListener;

const ABANDON_ABOUT: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

#[test]
fn reachable_probe_target_blocks_secret_commands() -> eyre::Result<()> {
    let env = TestEnv::new()?;
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let target = listener.local_addr()?.to_string();

    env.bare_cmd()
        .env("MM_MNEMONIC_PROBE_TARGETS", &target)
        .args(["show", "-m", ABANDON_ABOUT, "-p", ""])
        .assert()
        .failure()
        .stderr(predicate::str::contains("network connectivity detected"))
        .stderr(predicate::str::contains("--allow-internet-risk"))
        .stdout(predicate::str::is_empty());

    env.cmd()
        .env("MM_MNEMONIC_PROBE_TARGETS", &target)
        .args(["show", "-m", ABANDON_ABOUT, "-p", "", "-l", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0x9858EfFD232B4033E47d90003D41EC34EcaEda94"));
    Ok(())
}

#[test]
fn unreachable_targets_let_commands_run() -> eyre::Result<()> {
    let env = TestEnv::new()?;
    let closed = {
        let l = TcpListener::bind("127.0.0.1:0")?;
        l.local_addr()?.to_string()
    };

    env.bare_cmd()
        .env("MM_MNEMONIC_PROBE_TARGETS", &closed)
        .args(["show", "-m", ABANDON_ABOUT, "-p", "", "-l", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0x9858EfFD232B4033E47d90003D41EC34EcaEda94"));
    Ok(())
}

#[test]
fn parameter_errors_come_before_the_probe() -> eyre::Result<()> {
    let env = TestEnv::new()?;
    let listener = TcpListener::bind("127.0.0.1:0")?;

    env.bare_cmd()
        .env("MM_MNEMONIC_PROBE_TARGETS", listener.local_addr()?.to_string())
        .args(["derive", "--prompt", "--generate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("conflicting parameters"))
        .stderr(predicate::str::contains("network connectivity detected").not());
    Ok(())
}

#[test]
fn paths_needs_no_isolation() -> eyre::Result<()> {
    let env = TestEnv::new()?;
    let listener = TcpListener::bind("127.0.0.1:0")?;

    let out = env
        .bare_cmd()
        .env("MM_MNEMONIC_PROBE_TARGETS", listener.local_addr()?.to_string())
        .arg("paths")
        .output()?;
    assert!(out.status.success(), "paths failed");
    let v: serde_json::Value = serde_json::from_slice(&out.stdout)?;
    assert!(
        v.get("config_file")
            .and_then(serde_json::Value::as_str)
            .is_some_and(|p| p.ends_with("config.toml")),
        "{v}"
    );
    Ok(())
}
