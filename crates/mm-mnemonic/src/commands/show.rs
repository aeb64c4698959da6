use super::TargetArgs;
use crate::{
    account::{derive_accounts, DeriveRequest},
    cli_output::{self, Columns, KeysView},
    config::ToolConfig,
    mnemonic::is_valid_mnemonic,
};
use zeroize::Zeroizing;

#[derive(clap::Args, Debug)]
pub struct Args {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Number of accounts to derive.
    #[arg(long, short = 'l', default_value_t = 10)]
    pub limit: u32,

    /// Mnemonic phrase. Prompted (hidden) when missing or invalid.
    #[arg(long, short = 'm', value_parser = cli_output::parse_secret)]
    pub mnemonic: Option<Zeroizing<String>>,

    /// BIP39 passphrase. Prompted (hidden) when missing; may be empty.
    #[arg(long, short = 'p', value_parser = cli_output::parse_secret)]
    pub passphrase: Option<Zeroizing<String>>,
}

/// Ask until the user enters a checksum-valid mnemonic. Only a closed stdin ends the loop.
pub fn prompt_valid_mnemonic() -> eyre::Result<Zeroizing<String>> {
    loop {
        let entered = cli_output::prompt_secret("Mnemonic")?;
        if is_valid_mnemonic(&entered) {
            return Ok(entered);
        }
        cli_output::stderr_writeln("invalid mnemonic");
    }
}

pub fn run(args: Args, cfg: &ToolConfig) -> eyre::Result<()> {
    let mnemonic = match args.mnemonic {
        Some(m) if is_valid_mnemonic(&m) => m,
        Some(_) => {
            cli_output::stderr_writeln("invalid mnemonic");
            prompt_valid_mnemonic()?
        }
        None => prompt_valid_mnemonic()?,
    };
    let passphrase = match args.passphrase {
        Some(p) => p,
        None => cli_output::prompt_secret("Passphrase")?,
    };

    let accounts = derive_accounts(&DeriveRequest {
        coin: args.target.coin,
        mnemonic: &mnemonic,
        passphrase: &passphrase,
        template: args.target.derivation_path.as_deref(),
        limit: args.limit,
        options: args.target.options(cfg),
    })?;

    let out = cli_output::render_keys(
        &KeysView {
            mnemonic: Some(mnemonic.as_str()),
            passphrase: Some(passphrase.as_str()),
            seed_hex: None,
            accounts: &accounts,
        },
        Columns::KEYS,
    );
    cli_output::stdout_write(&out)
}
