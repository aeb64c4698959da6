use super::TargetArgs;
use crate::{
    account::{derive_accounts, DeriveRequest},
    cli_output::{self, parse_columns, Columns, KeysView},
    config::ToolConfig,
    mnemonic::{generate_mnemonic, parse_word_count, WordCount},
    passphrase::generate_passphrase,
};
use zeroize::Zeroizing;

#[derive(clap::Args, Debug)]
pub struct Args {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Number of accounts to derive.
    #[arg(long, short = 'l', default_value_t = 10)]
    pub limit: u32,

    /// Mnemonic length: 12, 15, 21 or 24 words.
    #[arg(long, short = 'w', value_parser = parse_word_count, default_value = "24")]
    pub words: WordCount,

    /// Use an empty BIP39 passphrase instead of generating one.
    #[arg(long, default_value_t = false)]
    pub no_passphrase: bool,

    /// What to print: `all`, or a comma list of mnemonic,passphrase,seed,path,address,private.
    #[arg(long, value_parser = parse_columns, default_value = "all")]
    pub columns: Columns,
}

pub fn run(args: &Args, cfg: &ToolConfig) -> eyre::Result<()> {
    let mnemonic = generate_mnemonic(args.words)?;
    let passphrase = if args.no_passphrase {
        Zeroizing::new(String::new())
    } else {
        generate_passphrase(cfg.passphrase.length)
    };

    let accounts = derive_accounts(&DeriveRequest {
        coin: args.target.coin,
        mnemonic: mnemonic.as_str(),
        passphrase: &passphrase,
        template: args.target.derivation_path.as_deref(),
        limit: args.limit,
        options: args.target.options(cfg),
    })?;

    let seed_hex = if args.columns.seed {
        Some(Zeroizing::new(hex::encode(
            mnemonic.to_seed(&passphrase)?.as_bytes(),
        )))
    } else {
        None
    };

    tracing::info!(
        coin = %args.target.coin,
        words = args.words.words(),
        accounts = accounts.len(),
        "mnemonic generated"
    );

    let out = cli_output::render_keys(
        &KeysView {
            mnemonic: Some(mnemonic.as_str()),
            passphrase: Some(passphrase.as_str()),
            seed_hex: seed_hex.as_deref().map(String::as_str),
            accounts: &accounts,
        },
        args.columns,
    );
    cli_output::stdout_write(&out)
}
