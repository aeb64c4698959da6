//! Batch generation.
//!
//! * batch1: each file holds one fresh mnemonic + generated passphrase and `limit`
//!   accounts derived from it.
//! * batch2: each file holds `limit` independent mnemonics (empty passphrase), one
//!   account each at index 0.
//!
//! Every file is written atomically; files of completed batches stay in place when a
//! later batch fails.

use crate::{
    account::{derive_accounts, template_for, DeriveRequest, DerivedAccount},
    chains::{ChainOptions, Coin},
    errors::MnemonicToolError,
    fsutil,
    keystore::{AccountRecord, BatchRecord, Keystore, RecordKind},
    mnemonic::{EntropySource, MnemonicPhrase, WordCount},
    passphrase::generate_passphrase_with,
};
use eyre::Context as _;
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

#[derive(Debug, Clone)]
pub struct BatchParams<'a> {
    pub batches: u32,
    pub limit: u32,
    pub coin: Coin,
    pub template: Option<&'a str>,
    pub words: WordCount,
    pub options: ChainOptions,
    /// Length of the generated batch1 passphrase.
    pub passphrase_len: usize,
    pub output_dir: &'a Path,
}

#[derive(Debug, Clone)]
pub struct BatchSummary {
    pub run_id: String,
    pub files: Vec<PathBuf>,
}

pub fn batch_file_name(kind: RecordKind, n: u32, batches: u32) -> String {
    let width = batches.to_string().len();
    format!("{}_{n:0width$}.toml", kind.as_str())
}

struct RunContext {
    template: String,
    run_id: String,
}

fn prepare(params: &BatchParams<'_>) -> eyre::Result<RunContext> {
    if params.batches == 0 {
        return Err(MnemonicToolError::ParameterConflict("--batches must be at least 1".into()).into());
    }
    if params.limit == 0 {
        return Err(MnemonicToolError::ParameterConflict("--limit must be at least 1".into()).into());
    }
    let template = template_for(params.coin, params.template)?;
    fsutil::prepare_output_dir(params.output_dir)?;
    Ok(RunContext {
        template: template.as_str().to_owned(),
        run_id: uuid::Uuid::new_v4().to_string(),
    })
}

fn new_record(kind: RecordKind, params: &BatchParams<'_>, ctx: &RunContext) -> BatchRecord {
    BatchRecord::new(kind, params.coin, &ctx.template, params.options, &ctx.run_id)
}

fn write_batch(
    keystore: &Keystore,
    params: &BatchParams<'_>,
    kind: RecordKind,
    n: u32,
    record: &BatchRecord,
) -> eyre::Result<PathBuf> {
    let path = params
        .output_dir
        .join(batch_file_name(kind, n, params.batches));
    keystore.store(&path, record)?;
    tracing::info!(
        kind = kind.as_str(),
        batch = n,
        accounts = record.accounts.len(),
        encrypted = keystore.encrypts(),
        file = %path.display(),
        "batch written"
    );
    Ok(path)
}

pub fn run_batch1(
    params: &BatchParams<'_>,
    keystore: &Keystore,
    entropy: &mut impl EntropySource,
) -> eyre::Result<BatchSummary> {
    let ctx = prepare(params)?;
    let mut files = vec![];

    for n in 1..=params.batches {
        let mnemonic = MnemonicPhrase::generate(params.words, entropy)?;
        let passphrase = generate_passphrase_with(params.passphrase_len, entropy);
        let accounts = derive_accounts(&DeriveRequest {
            coin: params.coin,
            mnemonic: mnemonic.as_str(),
            passphrase: &passphrase,
            template: Some(&ctx.template),
            limit: params.limit,
            options: params.options,
        })
        .with_context(|| format!("batch {n}"))?;

        let mut record = new_record(RecordKind::Batch1, params, &ctx);
        record.mnemonic = Some(Zeroizing::new(mnemonic.as_str().to_owned()));
        record.passphrase = Some(passphrase);
        record.accounts = accounts.iter().map(AccountRecord::from_derived).collect();

        files.push(write_batch(keystore, params, RecordKind::Batch1, n, &record)?);
    }

    Ok(BatchSummary {
        run_id: ctx.run_id,
        files,
    })
}

fn first_account(accounts: Vec<DerivedAccount>) -> eyre::Result<DerivedAccount> {
    accounts
        .into_iter()
        .next()
        .ok_or_else(|| eyre::eyre!("derivation returned no account"))
}

pub fn run_batch2(
    params: &BatchParams<'_>,
    keystore: &Keystore,
    entropy: &mut impl EntropySource,
) -> eyre::Result<BatchSummary> {
    let ctx = prepare(params)?;
    let mut files = vec![];

    for n in 1..=params.batches {
        let mut record = new_record(RecordKind::Batch2, params, &ctx);
        for slot in 0..params.limit {
            let mnemonic = MnemonicPhrase::generate(params.words, entropy)?;
            let account = first_account(
                derive_accounts(&DeriveRequest {
                    coin: params.coin,
                    mnemonic: mnemonic.as_str(),
                    passphrase: "",
                    template: Some(&ctx.template),
                    limit: 1,
                    options: params.options,
                })
                .with_context(|| format!("batch {n}, account {slot}"))?,
            )?;
            let mut entry = AccountRecord::from_derived(&account);
            entry.mnemonic = Some(Zeroizing::new(mnemonic.as_str().to_owned()));
            entry.passphrase = Some(Zeroizing::new(String::new()));
            record.accounts.push(entry);
        }

        files.push(write_batch(keystore, params, RecordKind::Batch2, n, &record)?);
    }

    Ok(BatchSummary {
        run_id: ctx.run_id,
        files,
    })
}
