//! CLI subcommands. Each one validates its arguments up front (no crypto, no I/O beyond
//! directory checks) and only then runs.

pub mod batch;
pub mod derive;
pub mod new;
pub mod show;
pub mod verify_batch2;

use crate::{
    account::template_for,
    chains::{BtcAddressType, ChainOptions, Coin},
    cli_output,
    config::ToolConfig,
    errors::MnemonicToolError,
    keystore::Keystore,
};
use clap::Subcommand;

/// Which chain, which path, how to render BTC addresses.
#[derive(clap::Args, Debug, Clone)]
pub struct TargetArgs {
    #[arg(long, short = 'c', value_enum, ignore_case = true, default_value_t = Coin::Eth)]
    pub coin: Coin,

    /// Path template with exactly one `{i}` placeholder, e.g. "m/44'/60'/0'/0/{i}".
    /// Defaults to the coin's standard path.
    #[arg(long)]
    pub derivation_path: Option<String>,

    /// Bitcoin address type [default: from config, `auto` picks by path purpose].
    #[arg(long, value_enum)]
    pub btc_address_type: Option<BtcAddressType>,
}

impl TargetArgs {
    pub fn validate(&self) -> Result<(), MnemonicToolError> {
        template_for(self.coin, self.derivation_path.as_deref()).map(|_| ())
    }

    pub fn options(&self, cfg: &ToolConfig) -> ChainOptions {
        ChainOptions {
            btc_address_type: self.btc_address_type.unwrap_or(cfg.bitcoin.address_type),
        }
    }
}

/// Fix plaintext vs. encrypted output (asking for the password) before any secret exists.
pub fn keystore_for(encrypt: bool, cfg: &ToolConfig) -> eyre::Result<Keystore> {
    if encrypt {
        Ok(Keystore::encrypted(cli_output::encryption_password()?, cfg.kdf))
    } else {
        Ok(Keystore::plaintext())
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a new mnemonic (and passphrase) and print its accounts.
    New(new::Args),

    /// Print accounts for an existing mnemonic (prompts when missing or invalid).
    Show(show::Args),

    /// Derive accounts from a prompted, generated or given mnemonic, optionally saving them.
    Derive(derive::Args),

    /// Write N files, each with one fresh mnemonic + passphrase and L accounts.
    #[command(name = "batch1")]
    Batch1(batch::BatchArgs),

    /// Write N files, each with L independent mnemonics (one account each).
    #[command(name = "batch2")]
    Batch2(batch::BatchArgs),

    /// Re-derive every account in a batch folder and compare it with what was written.
    #[command(name = "verify-batch2")]
    VerifyBatch2(verify_batch2::Args),

    /// Print resolved paths (useful for debugging).
    Paths,
}

impl Command {
    /// Parameter checks that must pass before any secret is generated or read.
    pub fn validate(&self) -> eyre::Result<()> {
        match self {
            Self::New(a) => a.target.validate().map_err(Into::into),
            Self::Show(a) => a.target.validate().map_err(Into::into),
            Self::Derive(a) => a.validate(),
            Self::Batch1(a) | Self::Batch2(a) => a.validate(),
            Self::VerifyBatch2(a) => a.validate(),
            Self::Paths => Ok(()),
        }
    }

    /// `paths` is the only command that never sees key material.
    pub const fn handles_secrets(&self) -> bool {
        !matches!(self, Self::Paths)
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::New(_) => "new",
            Self::Show(_) => "show",
            Self::Derive(_) => "derive",
            Self::Batch1(_) => "batch1",
            Self::Batch2(_) => "batch2",
            Self::VerifyBatch2(_) => "verify-batch2",
            Self::Paths => "paths",
        }
    }
}
