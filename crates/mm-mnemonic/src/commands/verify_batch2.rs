use crate::{cli_output, errors::MnemonicToolError, verify};
use std::path::PathBuf;

#[derive(clap::Args, Debug)]
pub struct Args {
    /// Folder written by batch1/batch2.
    pub directory: PathBuf,
}

impl Args {
    pub fn validate(&self) -> eyre::Result<()> {
        if !self.directory.is_dir() {
            return Err(MnemonicToolError::Persistence(format!(
                "not a directory: {}",
                self.directory.display()
            ))
            .into());
        }
        Ok(())
    }
}

pub fn run(args: &Args) -> eyre::Result<()> {
    let mut password = cli_output::decryption_password;
    let report = verify::verify_directory(&args.directory, &mut password)?;
    if report.files.is_empty() {
        eyre::bail!("no files to verify in {}", args.directory.display());
    }
    cli_output::stdout_write(&cli_output::render_verify_report(&report))?;
    if !report.is_success() {
        eyre::bail!(
            "verification failed: {} of {} files failed, {} accounts failed",
            report.failed_files(),
            report.files.len(),
            report.failed_accounts()
        );
    }
    Ok(())
}
