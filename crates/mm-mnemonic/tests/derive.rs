mod common;

use common::TestEnv;
use eyre::Context as _;
use predicates::prelude::*;
use std::{fs, path::Path};

const ABANDON_ABOUT: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

/// `keys.toml` alone in a fresh folder, which is what the verifier expects.
fn verify_folder_for(out_dir: &Path, scratch: &Path) -> eyre::Result<std::path::PathBuf> {
    let check = scratch.join("check");
    fs::create_dir(&check)?;
    fs::copy(out_dir.join("keys.toml"), check.join("keys.toml")).context("copy keys.toml")?;
    Ok(check)
}

#[test]
fn no_input_method_prints_examples_and_fails() -> eyre::Result<()> {
    let env = TestEnv::new()?;
    env.cmd()
        .arg("derive")
        .assert()
        .failure()
        .stderr(predicate::str::contains("USAGE EXAMPLES"))
        .stderr(predicate::str::contains("no input method"))
        .stdout(predicate::str::is_empty());
    Ok(())
}

#[test]
fn conflicting_flags_are_rejected() -> eyre::Result<()> {
    let env = TestEnv::new()?;
    let dir = tempfile::tempdir()?;
    let out_dir = dir.path().join("out");
    let out_dir = out_dir.to_string_lossy();
    let cases: [&[&str]; 7] = [
        &["--prompt", "--generate"],
        &["--generate", "--mnemonic", ABANDON_ABOUT],
        &["--prompt", "--passphrase", "x"],
        &["--mnemonic", ABANDON_ABOUT, "--generate-passphrase"],
        &["--generate", "--generate-passphrase", "--passphrase", "x"],
        &["--mnemonic", ABANDON_ABOUT, "--words", "12"],
        &["--mnemonic", ABANDON_ABOUT, "--encrypt"],
    ];
    for args in cases {
        env.cmd()
            .arg("derive")
            .args(args)
            .assert()
            .failure()
            .stderr(predicate::str::contains("conflicting parameters"))
            .stdout(predicate::str::is_empty());
    }
    env.cmd()
        .args(["derive", "--generate", "--output-dir", &out_dir, "--limit", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("conflicting parameters"));
    assert!(!dir.path().join("out").exists(), "nothing created");
    Ok(())
}

#[test]
fn derive_from_mnemonic_prints_keys() -> eyre::Result<()> {
    let env = TestEnv::new()?;
    env.cmd()
        .args(["derive", "-m", ABANDON_ABOUT, "--coin", "TRX", "-l", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "m/44'/195'/0'/0/0 TUEZSdKsoDHQMeZwihtdoBiN46zxhGWYdH \
             b5a4cea271ff424d7c31dc12a3e43e401df7a40d7412a15750f3f0b6b5449a28",
        ))
        .stdout(predicate::str::contains("TSeJkUh4Qv67VNFwY8LaAxERygNdy6NQZK"));
    Ok(())
}

#[test]
fn passphrase_changes_the_accounts() -> eyre::Result<()> {
    let env = TestEnv::new()?;
    env.cmd()
        .args(["derive", "-m", ABANDON_ABOUT, "-p", "TREZOR", "-l", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0x9858EfFD232B4033E47d90003D41EC34EcaEda94").not());
    Ok(())
}

#[test]
fn prompt_mode_reads_mnemonic_and_passphrase() -> eyre::Result<()> {
    let env = TestEnv::new()?;
    env.cmd()
        .args(["derive", "--prompt", "-l", "1", "--coin", "SOL"])
        .write_stdin(format!("{ABANDON_ABOUT}\n\n"))
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "m/44'/501'/0'/0' HAgk14JpMQLgt6rVgv7cBQFJWFto5Dqxi472uT3DKpqk \
             27npWoNE4HfmLeQo1TyWcW7NEA28qnsnDK7kcttDQEWrCWnro83HMJ97rMmpvYYZRwDAvG4KRuB7hTBacvwD7bgi",
        ));
    Ok(())
}

#[test]
fn generate_asks_for_a_confirmed_passphrase() -> eyre::Result<()> {
    let env = TestEnv::new()?;
    env.cmd()
        .args(["derive", "--generate", "--words", "15", "-l", "1"])
        .write_stdin("one\ntwo\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("do not match"));

    let out = env
        .cmd()
        .args(["derive", "--generate", "--words", "15", "-l", "1"])
        .write_stdin("same\nsame\n")
        .output()
        .context("run derive --generate")?;
    assert!(out.status.success(), "derive --generate failed");
    let stdout = String::from_utf8(out.stdout).context("utf-8")?;
    assert!(stdout.contains("passphrase: same\n"), "{stdout}");
    let words = stdout
        .lines()
        .find_map(|l| l.strip_prefix("mnemonic: "))
        .map(|m| m.split(' ').count());
    assert_eq!(words, Some(15), "{stdout}");
    Ok(())
}

#[test]
fn output_dir_keeps_secrets_off_the_screen() -> eyre::Result<()> {
    let env = TestEnv::new()?;
    let dir = tempfile::tempdir()?;
    let out_dir = dir.path().join("keys");

    env.cmd()
        .args(["derive", "-m", ABANDON_ABOUT, "-l", "2", "--output-dir"])
        .arg(&out_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "m/44'/60'/0'/0/0 0x9858EfFD232B4033E47d90003D41EC34EcaEda94\n",
        ))
        .stdout(predicate::str::contains("0x1ab42cc4").not())
        .stdout(predicate::str::contains("abandon").not());

    let addresses = fs::read_to_string(out_dir.join("addresses.txt"))?;
    assert_eq!(
        addresses,
        "0x9858EfFD232B4033E47d90003D41EC34EcaEda94\n0x6Fac4D18c912343BF86fa7049364Dd4E424Ab9C0\n"
    );
    let keys = fs::read_to_string(out_dir.join("keys.toml"))?;
    assert!(keys.contains("kind = \"derive\""), "{keys}");
    assert!(keys.contains(ABANDON_ABOUT), "mnemonic saved");
    assert!(
        keys.contains("0x1ab42cc412b618bdea3a599e3c9bae199ebf030895b039e9db1e30dafb12b727"),
        "private key saved"
    );

    let check = verify_folder_for(&out_dir, dir.path())?;
    env.cmd()
        .arg("verify-batch2")
        .arg(&check)
        .assert()
        .success()
        .stdout(predicate::str::contains("OK   keys.toml: 2 accounts"));
    Ok(())
}

#[test]
fn encrypted_output_round_trips_through_the_verifier() -> eyre::Result<()> {
    let env = TestEnv::new()?;
    let dir = tempfile::tempdir()?;
    let out_dir = dir.path().join("keys");

    env.cmd()
        .env("MM_MNEMONIC_PASSWORD", "correct horse")
        .args([
            "derive",
            "--generate",
            "--generate-passphrase",
            "--coin",
            "BTC",
            "-l",
            "3",
            "--encrypt",
            "--output-dir",
        ])
        .arg(&out_dir)
        .assert()
        .success()
        .stderr(predicate::str::contains("(encrypted)"));

    let keys = fs::read_to_string(out_dir.join("keys.toml"))?;
    assert!(keys.contains("[encryption]"), "{keys}");
    assert!(!keys.contains("accounts"), "no plaintext fields: {keys}");
    assert_eq!(fs::read_to_string(out_dir.join("addresses.txt"))?.lines().count(), 3);

    let check = verify_folder_for(&out_dir, dir.path())?;
    env.cmd()
        .env("MM_MNEMONIC_PASSWORD", "correct horse")
        .arg("verify-batch2")
        .arg(&check)
        .assert()
        .success();
    env.cmd()
        .env("MM_MNEMONIC_PASSWORD", "wrong")
        .arg("verify-batch2")
        .arg(&check)
        .assert()
        .failure()
        .stdout(predicate::str::contains("FAIL keys.toml"));
    Ok(())
}

#[test]
fn non_empty_output_dir_is_refused_before_any_work() -> eyre::Result<()> {
    let env = TestEnv::new()?;
    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join("existing.txt"), "keep me")?;

    env.cmd()
        .args(["derive", "--generate", "--generate-passphrase", "--output-dir"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("not empty"))
        .stdout(predicate::str::is_empty());
    let names: Vec<_> = fs::read_dir(dir.path())?
        .filter_map(Result::ok)
        .map(|e| e.file_name())
        .collect();
    assert_eq!(names, ["existing.txt"], "directory untouched");
    Ok(())
}
