use crate::{chains::BtcAddressType, keystore::crypto::KdfParams, passphrase};
use eyre::Context as _;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PROBE_TARGETS: [&str; 3] = ["1.1.1.1:53", "8.8.8.8:53", "9.9.9.9:53"];
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 1500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// `host:port` endpoints; reaching any of them means the host is online.
    pub probe_targets: Vec<String>,
    pub probe_timeout_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            probe_targets: DEFAULT_PROBE_TARGETS.iter().map(|s| (*s).to_owned()).collect(),
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BitcoinConfig {
    pub address_type: BtcAddressType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PassphraseConfig {
    /// Length of generated passphrases.
    pub length: usize,
}

impl Default for PassphraseConfig {
    fn default() -> Self {
        Self {
            length: passphrase::DEFAULT_LENGTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ToolConfig {
    pub network: NetworkConfig,
    /// Argon2id costs for newly encrypted files.
    pub kdf: KdfParams,
    pub bitcoin: BitcoinConfig,
    pub passphrase: PassphraseConfig,
}

impl ToolConfig {
    pub fn validate(&self) -> eyre::Result<()> {
        if self.passphrase.length < passphrase::MIN_LENGTH {
            eyre::bail!(
                "passphrase.length must be at least {} (got {})",
                passphrase::MIN_LENGTH,
                self.passphrase.length
            );
        }
        if self.network.probe_timeout_ms == 0 {
            eyre::bail!("network.probe_timeout_ms must be positive");
        }
        self.kdf.check().context("config [kdf]")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() -> eyre::Result<()> {
        let cfg: ToolConfig = toml::from_str(
            r#"
[bitcoin]
address_type = "p2tr"

[network]
probe_timeout_ms = 200
"#,
        )?;
        assert_eq!(cfg.bitcoin.address_type, BtcAddressType::P2tr);
        assert_eq!(cfg.network.probe_timeout_ms, 200);
        assert_eq!(cfg.network.probe_targets.len(), DEFAULT_PROBE_TARGETS.len());
        assert_eq!(cfg.kdf, KdfParams::default());
        assert_eq!(cfg.passphrase.length, passphrase::DEFAULT_LENGTH);
        cfg.validate()
    }

    #[test]
    fn rejects_short_passphrases_and_zero_costs() {
        let mut cfg = ToolConfig::default();
        cfg.passphrase.length = 4;
        assert!(cfg.validate().is_err(), "short passphrase");

        let mut cfg = ToolConfig::default();
        cfg.kdf.t_cost = 0;
        assert!(cfg.validate().is_err(), "zero t_cost");

        let mut cfg = ToolConfig::default();
        cfg.kdf.m_cost_kib = crate::keystore::crypto::MAX_M_COST_KIB + 1;
        assert!(cfg.validate().is_err(), "memory cost above the ceiling");
    }
}
