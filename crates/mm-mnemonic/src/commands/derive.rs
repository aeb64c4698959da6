use super::{keystore_for, show::prompt_valid_mnemonic, TargetArgs};
use crate::{
    account::{derive_accounts, template_for, DeriveRequest, DerivedAccount},
    chains::{ChainOptions, Coin},
    cli_output::{self, Columns, KeysView},
    config::ToolConfig,
    errors::MnemonicToolError,
    fsutil,
    keystore::{AccountRecord, BatchRecord, Keystore, RecordKind},
    mnemonic::{generate_mnemonic, parse_word_count, WordCount},
    passphrase::generate_passphrase,
};
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

pub const KEYS_FILE: &str = "keys.toml";
pub const ADDRESSES_FILE: &str = "addresses.txt";

#[derive(clap::Args, Debug)]
pub struct Args {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Number of accounts to derive.
    #[arg(long, short = 'l', default_value_t = 10)]
    pub limit: u32,

    /// Prompt for the mnemonic and passphrase (hidden input).
    #[arg(long, default_value_t = false)]
    pub prompt: bool,

    /// Generate a new random mnemonic.
    #[arg(long, short = 'g', default_value_t = false)]
    pub generate: bool,

    /// Use this mnemonic phrase.
    #[arg(long, short = 'm', value_parser = cli_output::parse_secret)]
    pub mnemonic: Option<Zeroizing<String>>,

    /// BIP39 passphrase (empty when omitted with --mnemonic).
    #[arg(long, short = 'p', value_parser = cli_output::parse_secret)]
    pub passphrase: Option<Zeroizing<String>>,

    /// Generate a random passphrase too (with --generate).
    #[arg(long, default_value_t = false)]
    pub generate_passphrase: bool,

    /// Mnemonic length for --generate: 12, 15, 21 or 24 words.
    #[arg(long, short = 'w', value_parser = parse_word_count, default_value = "24")]
    pub words: WordCount,

    /// Save keys.toml and addresses.txt into this (empty or new) directory.
    #[arg(long, short = 'o')]
    pub output_dir: Option<PathBuf>,

    /// Encrypt keys.toml with a password.
    #[arg(long, default_value_t = false)]
    pub encrypt: bool,
}

fn conflict(msg: &str) -> eyre::Report {
    MnemonicToolError::ParameterConflict(msg.to_owned()).into()
}

impl Args {
    pub fn validate(&self) -> eyre::Result<()> {
        let methods = [self.prompt, self.generate, self.mnemonic.is_some()]
            .into_iter()
            .filter(|m| *m)
            .count();
        if methods == 0 {
            cli_output::print_derive_examples();
            return Err(conflict(
                "no input method; pass one of --prompt, --generate or --mnemonic",
            ));
        }
        if methods > 1 {
            return Err(conflict(
                "--prompt, --generate and --mnemonic are mutually exclusive",
            ));
        }
        if self.prompt && self.passphrase.is_some() {
            return Err(conflict(
                "--passphrase cannot be combined with --prompt (the passphrase is prompted)",
            ));
        }
        if self.generate_passphrase && !self.generate {
            return Err(conflict("--generate-passphrase requires --generate"));
        }
        if self.generate_passphrase && self.passphrase.is_some() {
            return Err(conflict(
                "--passphrase and --generate-passphrase are mutually exclusive",
            ));
        }
        if self.words != WordCount::TwentyFour && !self.generate {
            return Err(conflict("--words only applies with --generate"));
        }
        if self.encrypt && self.output_dir.is_none() {
            return Err(conflict("--encrypt requires --output-dir"));
        }
        if self.output_dir.is_some() && self.limit == 0 {
            return Err(conflict("--output-dir needs --limit of at least 1"));
        }
        self.target.validate()?;
        if let Some(dir) = &self.output_dir {
            fsutil::ensure_empty_or_absent(dir)?;
        }
        Ok(())
    }
}

/// Mnemonic and passphrase from whichever input method was chosen.
fn read_input(
    args: &Args,
    cfg: &ToolConfig,
) -> eyre::Result<(Zeroizing<String>, Zeroizing<String>)> {
    if args.prompt {
        let mnemonic = prompt_valid_mnemonic()?;
        let passphrase = cli_output::prompt_secret("Passphrase (empty for none)")?;
        return Ok((mnemonic, passphrase));
    }
    if args.generate {
        let mnemonic = Zeroizing::new(generate_mnemonic(args.words)?.as_str().to_owned());
        let passphrase = if args.generate_passphrase {
            generate_passphrase(cfg.passphrase.length)
        } else if let Some(p) = &args.passphrase {
            p.clone()
        } else {
            cli_output::prompt_secret_confirmed("Passphrase (empty for none)")?
        };
        return Ok((mnemonic, passphrase));
    }
    let mnemonic = args
        .mnemonic
        .clone()
        .ok_or_else(|| conflict("no input method"))?;
    let passphrase = args.passphrase.clone().unwrap_or_default();
    Ok((mnemonic, passphrase))
}

struct Saved<'a> {
    dir: &'a Path,
    coin: Coin,
    template: &'a str,
    options: ChainOptions,
    mnemonic: &'a str,
    passphrase: &'a str,
    accounts: &'a [DerivedAccount],
}

fn save(keystore: &Keystore, s: &Saved<'_>) -> eyre::Result<()> {
    fsutil::prepare_output_dir(s.dir)?;

    let mut record = BatchRecord::new(
        RecordKind::Derive,
        s.coin,
        s.template,
        s.options,
        &uuid::Uuid::new_v4().to_string(),
    );
    record.mnemonic = Some(Zeroizing::new(s.mnemonic.to_owned()));
    record.passphrase = Some(Zeroizing::new(s.passphrase.to_owned()));
    record.accounts = s.accounts.iter().map(AccountRecord::from_derived).collect();
    keystore.store(&s.dir.join(KEYS_FILE), &record)?;

    let addresses: String = s
        .accounts
        .iter()
        .map(|a| format!("{}\n", a.address))
        .collect();
    fsutil::write_string_atomic_restrictive(
        &s.dir.join(ADDRESSES_FILE),
        &addresses,
        fsutil::MODE_FILE_PRIVATE,
    )?;

    tracing::info!(
        coin = %s.coin,
        accounts = s.accounts.len(),
        encrypted = keystore.encrypts(),
        dir = %s.dir.display(),
        "derived keys saved"
    );
    Ok(())
}

pub fn run(args: &Args, cfg: &ToolConfig) -> eyre::Result<()> {
    let keystore = match &args.output_dir {
        Some(_) => Some(keystore_for(args.encrypt, cfg)?),
        None => None,
    };
    let (mnemonic, passphrase) = read_input(args, cfg)?;
    let template = template_for(args.target.coin, args.target.derivation_path.as_deref())?;
    let options = args.target.options(cfg);

    let accounts = derive_accounts(&DeriveRequest {
        coin: args.target.coin,
        mnemonic: &mnemonic,
        passphrase: &passphrase,
        template: Some(template.as_str()),
        limit: args.limit,
        options,
    })?;

    let (Some(dir), Some(keystore)) = (&args.output_dir, keystore) else {
        let out = cli_output::render_keys(
            &KeysView {
                mnemonic: Some(mnemonic.as_str()),
                passphrase: Some(passphrase.as_str()),
                seed_hex: None,
                accounts: &accounts,
            },
            Columns::KEYS,
        );
        return cli_output::stdout_write(&out);
    };

    save(
        &keystore,
        &Saved {
            dir,
            coin: args.target.coin,
            template: template.as_str(),
            options,
            mnemonic: &mnemonic,
            passphrase: &passphrase,
            accounts: &accounts,
        },
    )?;
    cli_output::stderr_writeln(&format!(
        "saved {} accounts to {}{}",
        accounts.len(),
        dir.join(KEYS_FILE).display(),
        if keystore.encrypts() { " (encrypted)" } else { "" }
    ));
    let out = cli_output::render_keys(
        &KeysView {
            mnemonic: None,
            passphrase: None,
            seed_hex: None,
            accounts: &accounts,
        },
        Columns::PUBLIC,
    );
    cli_output::stdout_write(&out)
}
