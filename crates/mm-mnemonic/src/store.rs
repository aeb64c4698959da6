use crate::{chains::BtcAddressType, config::ToolConfig, paths::ToolPaths};
use eyre::Context as _;
use std::{fs, path::PathBuf};

/// Read-only view over `config.toml`. A missing file means defaults; nothing is written.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

/// Apply environment variable overrides on top of the file.
fn apply_env_overrides(cfg: &mut ToolConfig) -> eyre::Result<()> {
    /// Helper: if an env var is set and non-empty, apply `setter` with the trimmed value.
    fn apply_env(var: &str, setter: impl FnOnce(&str) -> eyre::Result<()>) -> eyre::Result<()> {
        if let Ok(u) = std::env::var(var) {
            let t = u.trim();
            if !t.is_empty() {
                setter(t).with_context(|| format!("invalid {var}"))?;
            }
        }
        Ok(())
    }

    apply_env("MM_MNEMONIC_PROBE_TARGETS", |v| {
        cfg.network.probe_targets = v
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned)
            .collect();
        Ok(())
    })?;
    apply_env("MM_MNEMONIC_PROBE_TIMEOUT_MS", |v| {
        cfg.network.probe_timeout_ms = v.parse().context("expected milliseconds")?;
        Ok(())
    })?;
    apply_env("MM_MNEMONIC_BTC_ADDRESS_TYPE", |v| {
        cfg.bitcoin.address_type = BtcAddressType::parse(v)
            .ok_or_else(|| eyre::eyre!("unknown address type `{v}`"))?;
        Ok(())
    })
}

impl ConfigStore {
    pub fn new(paths: &ToolPaths) -> Self {
        Self {
            path: paths.config_file(),
        }
    }

    pub fn load(&self) -> eyre::Result<ToolConfig> {
        let mut cfg = if self.path.exists() {
            let s = fs::read_to_string(&self.path).context("read config.toml")?;
            toml::from_str(&s).context("parse config.toml")?
        } else {
            ToolConfig::default()
        };
        apply_env_overrides(&mut cfg)?;
        cfg.validate()
            .with_context(|| format!("invalid configuration in {}", self.path.display()))?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths_in(dir: &std::path::Path) -> ToolPaths {
        ToolPaths {
            config_dir: dir.to_path_buf(),
            data_dir: dir.to_path_buf(),
            log_file: dir.join("log.jsonl"),
        }
    }

    #[test]
    fn missing_file_gives_defaults_without_writing() -> eyre::Result<()> {
        let dir = tempfile::tempdir()?;
        let paths = paths_in(dir.path());
        let cfg = ConfigStore::new(&paths).load()?;
        assert_eq!(cfg.passphrase.length, ToolConfig::default().passphrase.length);
        assert!(!paths.config_file().exists(), "load must not create config.toml");
        Ok(())
    }

    #[test]
    fn reads_file_values() -> eyre::Result<()> {
        let dir = tempfile::tempdir()?;
        let paths = paths_in(dir.path());
        fs::write(
            paths.config_file(),
            "[passphrase]\nlength = 48\n[kdf]\nm_cost_kib = 1024\nt_cost = 1\np_cost = 1\n",
        )?;
        let cfg = ConfigStore::new(&paths).load()?;
        assert_eq!(cfg.passphrase.length, 48);
        assert_eq!(cfg.kdf.m_cost_kib, 1024);
        Ok(())
    }

    #[test]
    fn invalid_file_is_an_error() -> eyre::Result<()> {
        let dir = tempfile::tempdir()?;
        let paths = paths_in(dir.path());
        fs::write(paths.config_file(), "[passphrase]\nlength = 3\n")?;
        assert!(ConfigStore::new(&paths).load().is_err(), "too short");
        Ok(())
    }
}
