use super::{keystore_for, TargetArgs};
use crate::{
    batch::{self, BatchParams, BatchSummary},
    cli_output,
    config::ToolConfig,
    fsutil,
    mnemonic::{parse_word_count, OsEntropy, WordCount},
};
use std::{fmt::Write as _, path::PathBuf};

#[derive(clap::Args, Debug)]
pub struct BatchArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Number of files to write.
    #[arg(long, short = 'b', value_parser = clap::value_parser!(u32).range(1..))]
    pub batches: u32,

    /// Accounts per file.
    #[arg(long, short = 'l', value_parser = clap::value_parser!(u32).range(1..))]
    pub limit: u32,

    /// Empty (or new) directory that receives the files.
    #[arg(long, short = 'o')]
    pub output_dir: PathBuf,

    /// Mnemonic length: 12, 15, 21 or 24 words.
    #[arg(long, short = 'w', value_parser = parse_word_count, default_value = "24")]
    pub words: WordCount,

    /// Encrypt every file with one password.
    #[arg(long, default_value_t = false)]
    pub encrypt: bool,
}

impl BatchArgs {
    pub fn validate(&self) -> eyre::Result<()> {
        self.target.validate()?;
        fsutil::ensure_empty_or_absent(&self.output_dir)
    }

    fn params<'a>(&'a self, cfg: &ToolConfig) -> BatchParams<'a> {
        BatchParams {
            batches: self.batches,
            limit: self.limit,
            coin: self.target.coin,
            template: self.target.derivation_path.as_deref(),
            words: self.words,
            options: self.target.options(cfg),
            passphrase_len: cfg.passphrase.length,
            output_dir: &self.output_dir,
        }
    }
}

fn summary_text(summary: &BatchSummary, encrypted: bool) -> String {
    let mut out = String::new();
    for f in &summary.files {
        let _infallible = writeln!(out, "{}", f.display());
    }
    let _infallible = writeln!(
        out,
        "wrote {} files{} (run {})",
        summary.files.len(),
        if encrypted { ", encrypted" } else { "" },
        summary.run_id
    );
    out
}

pub fn run_batch1(args: &BatchArgs, cfg: &ToolConfig) -> eyre::Result<()> {
    let keystore = keystore_for(args.encrypt, cfg)?;
    let summary = batch::run_batch1(&args.params(cfg), &keystore, &mut OsEntropy)?;
    cli_output::stdout_write(&summary_text(&summary, keystore.encrypts()))
}

pub fn run_batch2(args: &BatchArgs, cfg: &ToolConfig) -> eyre::Result<()> {
    let keystore = keystore_for(args.encrypt, cfg)?;
    let summary = batch::run_batch2(&args.params(cfg), &keystore, &mut OsEntropy)?;
    cli_output::stdout_write(&summary_text(&summary, keystore.encrypts()))
}
