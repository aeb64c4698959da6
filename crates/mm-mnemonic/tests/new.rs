mod common;

use common::TestEnv;
use eyre::{Context as _, ContextCompat as _};
use predicates::prelude::*;

fn stdout_of(out: &std::process::Output) -> eyre::Result<String> {
    String::from_utf8(out.stdout.clone()).context("stdout is utf-8")
}

#[test]
fn new_prints_a_fresh_mnemonic_and_accounts() -> eyre::Result<()> {
    let env = TestEnv::new()?;
    let out = env
        .cmd()
        .args(["new", "--words", "12", "--limit", "3"])
        .output()
        .context("run new")?;
    assert!(
        out.status.success(),
        "stderr={}",
        String::from_utf8_lossy(&out.stderr)
    );
    let stdout = stdout_of(&out)?;

    let mnemonic = stdout
        .lines()
        .find_map(|l| l.strip_prefix("mnemonic: "))
        .context("mnemonic line")?;
    assert_eq!(mnemonic.split(' ').count(), 12, "{stdout}");

    let passphrase = stdout
        .lines()
        .find_map(|l| l.strip_prefix("passphrase: "))
        .context("passphrase line")?;
    assert_eq!(passphrase.len(), 32, "default generated length");

    let seed = stdout
        .lines()
        .find_map(|l| l.strip_prefix("seed: "))
        .context("seed line")?;
    assert_eq!(seed.len(), 128, "64-byte seed in hex");

    let accounts: Vec<&str> = stdout.lines().filter(|l| l.starts_with("m/")).collect();
    assert_eq!(accounts.len(), 3, "{stdout}");
    assert!(
        accounts
            .iter()
            .all(|l| l.split(' ').nth(1).is_some_and(|a| a.starts_with("0x"))),
        "ETH addresses by default: {stdout}"
    );
    Ok(())
}

#[test]
fn columns_select_output() -> eyre::Result<()> {
    let env = TestEnv::new()?;
    let out = env
        .cmd()
        .args([
            "new",
            "--no-passphrase",
            "--coin",
            "SOL",
            "--limit",
            "2",
            "--columns",
            "passphrase,address",
        ])
        .output()
        .context("run new")?;
    assert!(out.status.success(), "new failed");
    let stdout = stdout_of(&out)?;
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.first().copied(), Some("passphrase: "), "{stdout}");
    assert!(!stdout.contains("mnemonic:"), "mnemonic hidden: {stdout}");
    assert!(!stdout.contains("m/44'"), "paths hidden: {stdout}");
    let addresses: Vec<&str> = lines.iter().skip(2).copied().collect();
    assert_eq!(addresses.len(), 2, "{stdout}");
    assert!(
        addresses.iter().all(|a| !a.contains(' ')),
        "one field per line: {stdout}"
    );
    Ok(())
}

#[test]
fn two_runs_differ() -> eyre::Result<()> {
    let env = TestEnv::new()?;
    let run = || -> eyre::Result<String> {
        let out = env
            .cmd()
            .args(["new", "--columns", "mnemonic", "--limit", "1"])
            .output()
            .context("run new")?;
        stdout_of(&out)
    };
    assert_ne!(run()?, run()?);
    Ok(())
}

#[test]
fn unsupported_word_counts_are_rejected() -> eyre::Result<()> {
    let env = TestEnv::new()?;
    for words in ["11", "18", "25", "twelve"] {
        env.cmd()
            .args(["new", "--words", words])
            .assert()
            .failure()
            .stdout(predicate::str::is_empty());
    }
    env.cmd()
        .args(["new", "--columns", "balance"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown column"));
    Ok(())
}
