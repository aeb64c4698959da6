use assert_cmd::Command;
use eyre::Context as _;
use tempfile::TempDir;

/// Isolated config/data dirs plus a config with cheap Argon2 costs so encrypted runs stay fast.
pub struct TestEnv {
    pub config_dir: TempDir,
    pub data_dir: TempDir,
}

impl TestEnv {
    pub fn new() -> eyre::Result<Self> {
        let config_dir = tempfile::tempdir()?;
        let data_dir = tempfile::tempdir()?;
        std::fs::write(
            config_dir.path().join("config.toml"),
            "[kdf]\nm_cost_kib = 64\nt_cost = 1\np_cost = 1\n\n[network]\nprobe_timeout_ms = 300\n",
        )
        .context("write test config")?;
        Ok(Self {
            config_dir,
            data_dir,
        })
    }

    /// The binary with isolated dirs; the network guard still runs.
    pub fn bare_cmd(&self) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("mm-mnemonic"));
        cmd.env("MM_MNEMONIC_CONFIG_DIR", self.config_dir.path())
            .env("MM_MNEMONIC_DATA_DIR", self.data_dir.path())
            .env_remove("MM_MNEMONIC_PASSWORD")
            .env_remove("MM_MNEMONIC_PROBE_TARGETS")
            .env_remove("MM_MNEMONIC_PROBE_TIMEOUT_MS")
            .env_remove("MM_MNEMONIC_BTC_ADDRESS_TYPE")
            .env_remove("RUST_LOG");
        cmd
    }

    /// The binary with the network guard overridden, for tests of everything else.
    pub fn cmd(&self) -> Command {
        let mut cmd = self.bare_cmd();
        cmd.arg("--allow-internet-risk");
        cmd
    }
}
