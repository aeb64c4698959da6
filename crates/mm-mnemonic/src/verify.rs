//! Re-derive every account in a batch folder and compare it with what was written.
//!
//! Problems are collected into a [`VerifyReport`]; a bad file or a mismatching account
//! never stops the scan.

use crate::{
    account::{derive_accounts_at, DeriveRequest},
    chains::ChainOptions,
    fsutil,
    keystore::{self, AccountRecord, BatchRecord, RECORD_VERSION},
};
use secrecy::SecretString;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountStatus {
    Ok,
    /// Names of the fields that differ from the re-derived values.
    Mismatch(Vec<&'static str>),
    /// The account could not be re-derived at all.
    Error(String),
}

#[derive(Debug, Clone)]
pub struct AccountOutcome {
    /// Position of the account in the file (0-based).
    pub position: usize,
    pub index: u32,
    pub address: String,
    pub status: AccountStatus,
}

#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub encrypted: bool,
    /// Set when the file could not be read, decrypted or parsed.
    pub error: Option<String>,
    pub accounts: Vec<AccountOutcome>,
}

impl FileOutcome {
    pub fn failed_accounts(&self) -> impl Iterator<Item = &AccountOutcome> {
        self.accounts.iter().filter(|a| a.status != AccountStatus::Ok)
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none() && self.failed_accounts().next().is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct VerifyReport {
    pub files: Vec<FileOutcome>,
}

impl VerifyReport {
    pub fn is_success(&self) -> bool {
        !self.files.is_empty() && self.files.iter().all(FileOutcome::is_ok)
    }

    pub fn total_accounts(&self) -> usize {
        self.files.iter().map(|f| f.accounts.len()).sum()
    }

    pub fn failed_files(&self) -> usize {
        self.files.iter().filter(|f| !f.is_ok()).count()
    }

    pub fn failed_accounts(&self) -> usize {
        self.files.iter().map(|f| f.failed_accounts().count()).sum()
    }
}

/// Supplies the decryption password the first time an encrypted file is met.
pub trait PasswordSource {
    fn password(&mut self) -> eyre::Result<SecretString>;
}

impl<F> PasswordSource for F
where
    F: FnMut() -> eyre::Result<SecretString>,
{
    fn password(&mut self) -> eyre::Result<SecretString> {
        self()
    }
}

/// Asks the source at most once and remembers the answer (or the failure).
struct CachedPassword<'a, P: PasswordSource> {
    source: &'a mut P,
    cached: Option<Result<SecretString, String>>,
}

impl<P: PasswordSource> CachedPassword<'_, P> {
    fn get(&mut self) -> Result<&SecretString, String> {
        let source = &mut *self.source;
        self.cached
            .get_or_insert_with(|| source.password().map_err(|e| format!("{e:#}")))
            .as_ref()
            .map_err(|e| format!("no password available: {e}"))
    }
}

fn verify_account(
    record: &BatchRecord,
    position: usize,
    account: &AccountRecord,
) -> AccountOutcome {
    let outcome = |status| AccountOutcome {
        position,
        index: account.index,
        address: account.address.clone(),
        status,
    };

    let Some(mnemonic) = account.mnemonic.as_ref().or(record.mnemonic.as_ref()) else {
        return outcome(AccountStatus::Error("no mnemonic recorded".to_owned()));
    };
    let passphrase = account
        .passphrase
        .as_ref()
        .or(record.passphrase.as_ref())
        .map_or("", |p| p.as_str());

    let req = DeriveRequest {
        coin: record.coin,
        mnemonic,
        passphrase,
        template: Some(&record.derivation_path),
        limit: 1,
        options: ChainOptions {
            btc_address_type: record.btc_address_type.unwrap_or_default(),
        },
    };
    let derived = match derive_accounts_at(&req, [account.index]) {
        Ok(v) => v,
        Err(e) => return outcome(AccountStatus::Error(format!("{e:#}"))),
    };
    let Some(d) = derived.first() else {
        return outcome(AccountStatus::Error("derivation returned no account".to_owned()));
    };

    let mut differs = vec![];
    if d.path != account.path {
        differs.push("path");
    }
    if d.address != account.address {
        differs.push("address");
    }
    if d.private_key != account.private_key {
        differs.push("private_key");
    }
    if differs.is_empty() {
        outcome(AccountStatus::Ok)
    } else {
        outcome(AccountStatus::Mismatch(differs))
    }
}

fn verify_file<P: PasswordSource>(path: &Path, password: &mut CachedPassword<'_, P>) -> FileOutcome {
    let mut out = FileOutcome {
        path: path.to_path_buf(),
        encrypted: false,
        error: None,
        accounts: vec![],
    };

    let stored = match keystore::read_file(path) {
        Ok(s) => s,
        Err(e) => {
            out.error = Some(format!("{e:#}"));
            return out;
        }
    };
    out.encrypted = stored.is_encrypted();

    let opened = if out.encrypted {
        match password.get() {
            Ok(pw) => stored.open(Some(pw)),
            Err(e) => Err(eyre::eyre!(e)),
        }
    } else {
        stored.open(None)
    };
    let record = match opened {
        Ok(r) => r,
        Err(e) => {
            out.error = Some(format!("{e:#}"));
            return out;
        }
    };

    if record.version != RECORD_VERSION {
        out.error = Some(format!("unsupported record version {}", record.version));
        return out;
    }
    if record.accounts.is_empty() {
        out.error = Some("file contains no accounts".to_owned());
        return out;
    }

    out.accounts = record
        .accounts
        .iter()
        .enumerate()
        .map(|(pos, a)| verify_account(&record, pos, a))
        .collect();
    out
}

/// Verify every non-hidden regular file directly inside `dir`.
pub fn verify_directory(dir: &Path, password: &mut impl PasswordSource) -> eyre::Result<VerifyReport> {
    let files = fsutil::list_visible_files(dir)?;
    let mut password = CachedPassword {
        source: password,
        cached: None,
    };

    let mut report = VerifyReport::default();
    for path in files {
        let outcome = verify_file(&path, &mut password);
        tracing::info!(
            file = %outcome.path.display(),
            accounts = outcome.accounts.len(),
            failed = outcome.failed_accounts().count(),
            file_error = outcome.error.is_some(),
            "file verified"
        );
        report.files.push(outcome);
    }
    Ok(report)
}
