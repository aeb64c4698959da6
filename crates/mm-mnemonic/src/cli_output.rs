//! Centralised helpers for user-facing CLI output and secret prompts.
//!
//! Results go to stdout; prompts, notices and usage help go to stderr.

use crate::{
    account::DerivedAccount,
    verify::{AccountStatus, VerifyReport},
};
use eyre::Context as _;
use secrecy::SecretString;
use std::{
    fmt::Write as _,
    io::{BufRead as _, IsTerminal as _, Write as _},
};
use zeroize::Zeroizing;

pub const PASSWORD_ENV: &str = "MM_MNEMONIC_PASSWORD";

fn stderr_write(s: &str) {
    let mut stderr = std::io::stderr().lock();
    if stderr.write_all(s.as_bytes()).is_err() {
        return;
    }
    let _flush = stderr.flush();
}

pub fn stderr_writeln(s: &str) {
    let mut stderr = std::io::stderr().lock();
    if stderr.write_all(s.as_bytes()).is_err() {
        return;
    }
    if stderr.write_all(b"\n").is_err() {
        return;
    }
    let _flush = stderr.flush();
}

pub fn stdout_write(s: &str) -> eyre::Result<()> {
    let mut out = std::io::stdout().lock();
    out.write_all(s.as_bytes()).context("write stdout")?;
    out.flush().context("flush stdout")
}

/// Which parts of `new` output to print.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Columns {
    pub mnemonic: bool,
    pub passphrase: bool,
    pub seed: bool,
    pub path: bool,
    pub address: bool,
    pub private: bool,
}

impl Columns {
    pub const ALL: Self = Self {
        mnemonic: true,
        passphrase: true,
        seed: true,
        path: true,
        address: true,
        private: true,
    };

    /// Secrets stay on disk only: paths and addresses.
    pub const PUBLIC: Self = Self {
        mnemonic: false,
        passphrase: false,
        seed: false,
        path: true,
        address: true,
        private: false,
    };

    pub const KEYS: Self = Self {
        seed: false,
        ..Self::ALL
    };
}

/// clap value parser for `--columns` (`all` or a comma-separated subset).
pub fn parse_columns(s: &str) -> Result<Columns, String> {
    let mut cols = Columns {
        mnemonic: false,
        passphrase: false,
        seed: false,
        path: false,
        address: false,
        private: false,
    };
    for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.to_ascii_lowercase().as_str() {
            "all" => cols = Columns::ALL,
            "mnemonic" => cols.mnemonic = true,
            "passphrase" => cols.passphrase = true,
            "seed" => cols.seed = true,
            "path" => cols.path = true,
            "address" => cols.address = true,
            "private" => cols.private = true,
            other => {
                return Err(format!(
                    "unknown column `{other}` (expected all,mnemonic,passphrase,seed,path,address,private)"
                ))
            }
        }
    }
    if cols == (Columns {
        mnemonic: false,
        passphrase: false,
        seed: false,
        path: false,
        address: false,
        private: false,
    }) {
        return Err("at least one column is required".to_owned());
    }
    Ok(cols)
}

/// Secret header lines (mnemonic/passphrase/seed) and one line per account.
pub struct KeysView<'a> {
    pub mnemonic: Option<&'a str>,
    pub passphrase: Option<&'a str>,
    pub seed_hex: Option<&'a str>,
    pub accounts: &'a [DerivedAccount],
}

pub fn render_keys(view: &KeysView<'_>, cols: Columns) -> Zeroizing<String> {
    let mut out = Zeroizing::new(String::new());
    let header = [
        (cols.mnemonic, "mnemonic", view.mnemonic),
        (cols.passphrase, "passphrase", view.passphrase),
        (cols.seed, "seed", view.seed_hex),
    ];
    for (wanted, label, value) in header {
        if let (true, Some(v)) = (wanted, value) {
            let _infallible = writeln!(out, "{label}: {v}");
        }
    }
    if cols.mnemonic || cols.passphrase || cols.seed {
        out.push('\n');
    }

    for a in view.accounts {
        let mut fields: Vec<&str> = vec![];
        if cols.path {
            fields.push(&a.path);
        }
        if cols.address {
            fields.push(&a.address);
        }
        if cols.private {
            fields.push(&a.private_key);
        }
        if !fields.is_empty() {
            let _infallible = writeln!(out, "{}", fields.join(" "));
        }
    }
    out
}

pub fn render_verify_report(report: &VerifyReport) -> String {
    let mut out = String::new();
    for f in &report.files {
        let name = f
            .path
            .file_name()
            .map_or_else(|| f.path.display().to_string(), |n| n.to_string_lossy().into_owned());
        if let Some(err) = &f.error {
            let _infallible = writeln!(out, "FAIL {name}: {err}");
            continue;
        }
        let failed: Vec<_> = f.failed_accounts().collect();
        if failed.is_empty() {
            let _infallible = writeln!(out, "OK   {name}: {} accounts", f.accounts.len());
            continue;
        }
        let _infallible = writeln!(
            out,
            "FAIL {name}: {} of {} accounts failed",
            failed.len(),
            f.accounts.len()
        );
        for a in failed {
            let detail = match &a.status {
                AccountStatus::Mismatch(fields) => format!("mismatch in {}", fields.join(", ")),
                AccountStatus::Error(e) => e.clone(),
                AccountStatus::Ok => continue,
            };
            let _infallible = writeln!(
                out,
                "     account #{} (index {}, {}): {detail}",
                a.position + 1,
                a.index,
                a.address
            );
        }
    }
    let _infallible = writeln!(
        out,
        "\n{} files, {} accounts checked; {} files with failures, {} failed accounts",
        report.files.len(),
        report.total_accounts(),
        report.failed_files(),
        report.failed_accounts()
    );
    out
}

/// clap value parser for secrets given on the command line; the parsed copy is wiped on drop.
pub fn parse_secret(s: &str) -> Result<Zeroizing<String>, std::convert::Infallible> {
    Ok(Zeroizing::new(s.to_owned()))
}

/// Read one secret line: hidden prompt on a terminal, plain line from piped stdin otherwise.
pub fn prompt_secret(label: &str) -> eyre::Result<Zeroizing<String>> {
    if std::io::stdin().is_terminal() {
        let s = rpassword::prompt_password(format!("{label}: ")).context("read hidden input")?;
        return Ok(Zeroizing::new(s));
    }
    stderr_write(&format!("{label}: "));
    let mut line = Zeroizing::new(String::new());
    let n = std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("read stdin")?;
    stderr_write("\n");
    if n == 0 {
        eyre::bail!("stdin closed while reading {label}");
    }
    let trimmed = line.trim_end_matches(['\r', '\n']).to_owned();
    Ok(Zeroizing::new(trimmed))
}

/// Prompt twice and require both entries to match.
pub fn prompt_secret_confirmed(label: &str) -> eyre::Result<Zeroizing<String>> {
    let first = prompt_secret(label)?;
    let second = prompt_secret(&format!("Repeat {}", label.to_lowercase()))?;
    if first != second {
        eyre::bail!("{label} entries do not match");
    }
    Ok(first)
}

fn password_from_env() -> Option<SecretString> {
    std::env::var(PASSWORD_ENV)
        .ok()
        .filter(|v| !v.is_empty())
        .map(SecretString::from)
}

/// Password for encrypting new files: env var, or a confirmed hidden prompt.
pub fn encryption_password() -> eyre::Result<SecretString> {
    if let Some(pw) = password_from_env() {
        return Ok(pw);
    }
    let pw = prompt_secret_confirmed("Encryption password")?;
    if pw.is_empty() {
        eyre::bail!("encryption password must not be empty");
    }
    Ok(SecretString::from(pw.as_str()))
}

/// Password for reading encrypted files: env var, or a single hidden prompt.
pub fn decryption_password() -> eyre::Result<SecretString> {
    if let Some(pw) = password_from_env() {
        return Ok(pw);
    }
    let pw = prompt_secret("Decryption password")?;
    Ok(SecretString::from(pw.as_str()))
}

pub fn print_derive_examples() {
    stderr_writeln(
        "mm-mnemonic derive - derive accounts from a BIP39 mnemonic

USAGE EXAMPLES:

1. Interactive mode (prompt for mnemonic and passphrase):
   mm-mnemonic derive --prompt

2. Generate a new random mnemonic:
   mm-mnemonic derive --generate

3. Generate a new mnemonic and passphrase:
   mm-mnemonic derive --generate --generate-passphrase

4. Use a specific mnemonic and passphrase:
   mm-mnemonic derive --mnemonic \"abandon abandon abandon ...\" --passphrase \"secret\"

ADDITIONAL OPTIONS:
   --coin         BTC, ETH, SOL or TRX [default: ETH]
   --limit        Number of accounts to derive [default: 10]
   --words        Mnemonic length with --generate: 12, 15, 21, 24 [default: 24]
   --output-dir   Save keys.toml and addresses.txt to an empty directory
   --encrypt      Encrypt keys.toml (needs --output-dir)

MORE EXAMPLES:
   mm-mnemonic derive --generate --coin BTC --limit 5
   mm-mnemonic derive --prompt --output-dir ./keys --encrypt
   mm-mnemonic derive --generate --words 12 --derivation-path \"m/44'/60'/0'/0/{i}\"",
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        chains::Coin,
        verify::{AccountOutcome, FileOutcome},
    };
    use std::path::PathBuf;

    fn account(index: u32) -> DerivedAccount {
        DerivedAccount {
            coin: Coin::Eth,
            index,
            path: format!("m/44'/60'/0'/0/{index}"),
            address: format!("0xaddr{index}"),
            private_key: Zeroizing::new(format!("0xkey{index}")),
        }
    }

    #[test]
    fn columns_parse() -> eyre::Result<()> {
        assert_eq!(parse_columns("all").map_err(|e| eyre::eyre!(e))?, Columns::ALL);
        let c = parse_columns("address, private").map_err(|e| eyre::eyre!(e))?;
        assert!(c.address && c.private && !c.mnemonic && !c.path);
        assert!(parse_columns("balance").is_err(), "unknown column");
        assert!(parse_columns(" , ").is_err(), "empty selection");
        Ok(())
    }

    #[test]
    fn renders_selected_columns_only() {
        let accounts = [account(0), account(1)];
        let view = KeysView {
            mnemonic: Some("abandon about"),
            passphrase: Some("pp"),
            seed_hex: Some("5eb0"),
            accounts: &accounts,
        };
        let full = render_keys(&view, Columns::ALL);
        assert!(full.starts_with("mnemonic: abandon about\npassphrase: pp\nseed: 5eb0\n\n"));
        assert!(full.contains("m/44'/60'/0'/0/1 0xaddr1 0xkey1\n"));

        let public = render_keys(&view, Columns::PUBLIC);
        assert_eq!(public.as_str(), "m/44'/60'/0'/0/0 0xaddr0\nm/44'/60'/0'/0/1 0xaddr1\n");
    }

    #[test]
    fn report_lists_failures() {
        let report = VerifyReport {
            files: vec![
                FileOutcome {
                    path: PathBuf::from("/x/batch2_1.toml"),
                    encrypted: false,
                    error: None,
                    accounts: vec![AccountOutcome {
                        position: 0,
                        index: 0,
                        address: "0xabc".to_owned(),
                        status: AccountStatus::Mismatch(vec!["address"]),
                    }],
                },
                FileOutcome {
                    path: PathBuf::from("/x/junk.toml"),
                    encrypted: false,
                    error: Some("parse error".to_owned()),
                    accounts: vec![],
                },
            ],
        };
        let text = render_verify_report(&report);
        assert!(text.contains("FAIL batch2_1.toml: 1 of 1 accounts failed"), "{text}");
        assert!(text.contains("mismatch in address"), "{text}");
        assert!(text.contains("FAIL junk.toml: parse error"), "{text}");
        assert!(text.contains("2 files with failures"), "{text}");
    }
}
