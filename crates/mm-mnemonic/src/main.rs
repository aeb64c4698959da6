#![recursion_limit = "256"]
#![expect(
    clippy::multiple_crate_versions,
    reason = "transitive dependency duplication"
)]

use clap::Parser;
use eyre::Context as _;
use tracing_subscriber::prelude::*;

mod account;
mod batch;
mod chains;
mod cli_output;
mod commands;
mod config;
mod errors;
mod fsutil;
mod keystore;
mod mnemonic;
mod network;
mod passphrase;
mod path_template;
mod paths;
mod store;
mod verify;

use commands::Command;

/// Offline BIP39 account derivation for BTC, ETH, SOL and TRX.
#[derive(Parser, Debug)]
#[command(name = "mm-mnemonic", version)]
struct Cli {
    /// Run even when the host has network connectivity.
    #[arg(long, global = true, default_value_t = false)]
    allow_internet_risk: bool,

    #[command(subcommand)]
    cmd: Command,
}

fn init_logging(paths: &paths::ToolPaths) -> tracing_appender::non_blocking::WorkerGuard {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env();
    let file_name = paths
        .log_file
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("mm-mnemonic.log.jsonl");
    let file_appender = tracing_appender::rolling::never(&paths.data_dir, file_name);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_filter(env_filter.clone());
    let file_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(file_writer)
        .with_filter(env_filter);

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();

    guard
}

async fn run(cli: Cli, paths: &paths::ToolPaths) -> eyre::Result<()> {
    let cfg = store::ConfigStore::new(paths).load()?;
    cli.cmd.validate()?;

    if cli.cmd.handles_secrets() {
        let probe = network::TcpProbe::from_config(&cfg.network);
        network::check_network_security(&probe, cli.allow_internet_risk).await?;
    }

    match cli.cmd {
        Command::New(args) => commands::new::run(&args, &cfg),
        Command::Show(args) => commands::show::run(args, &cfg),
        Command::Derive(args) => commands::derive::run(&args, &cfg),
        Command::Batch1(args) => commands::batch::run_batch1(&args, &cfg).context("batch1 failed"),
        Command::Batch2(args) => commands::batch::run_batch2(&args, &cfg).context("batch2 failed"),
        Command::VerifyBatch2(args) => commands::verify_batch2::run(&args),
        Command::Paths => {
            use std::io::Write as _;
            let s = serde_json::to_string(&serde_json::json!({
              "config_dir": paths.config_dir,
              "data_dir": paths.data_dir,
              "log_file": paths.log_file,
              "config_file": paths.config_file(),
            }))
            .context("serialize paths")?;
            writeln!(std::io::stdout().lock(), "{s}").context("write paths")?;
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let paths = paths::ToolPaths::discover()?;
    fsutil::ensure_private_dir(&paths.data_dir).context("create data dir")?;
    let _log_guard = init_logging(&paths);

    let command = cli.cmd.name();
    let res = run(cli, &paths).await;
    if let Err(e) = &res {
        let code = errors::domain_error(e).map_or("internal", errors::MnemonicToolError::code);
        tracing::error!(command, code, "command failed");
    }
    res
}
