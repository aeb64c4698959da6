//! Per-chain key and address derivation.
//!
//! Every deriver is a pure function of `(seed, path, options)`; there is no I/O here.

pub mod bitcoin;
pub mod evm;
pub mod solana;
pub mod tron;

use crate::{
    errors::MnemonicToolError,
    mnemonic::Seed,
    path_template::{ConcretePath, PathTemplate},
};
use ::bitcoin::{
    bip32::{ChildNumber, DerivationPath, Xpriv},
    secp256k1::{All, Secp256k1, SecretKey},
    NetworkKind,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroizing;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum, Default,
)]
#[serde(rename_all = "UPPERCASE")]
#[value(rename_all = "UPPERCASE")]
pub enum Coin {
    Btc,
    #[default]
    Eth,
    Sol,
    Trx,
}

impl Coin {
    pub const ALL: [Self; 4] = [Self::Btc, Self::Eth, Self::Sol, Self::Trx];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Btc => "BTC",
            Self::Eth => "ETH",
            Self::Sol => "SOL",
            Self::Trx => "TRX",
        }
    }

    /// Path template used when the caller does not supply one.
    pub const fn default_template(self) -> &'static str {
        match self {
            Self::Btc => "m/84'/0'/0'/0/{i}",
            Self::Eth => "m/44'/60'/0'/0/{i}",
            Self::Sol => "m/44'/501'/{i}'/0'",
            Self::Trx => "m/44'/195'/0'/0/{i}",
        }
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bitcoin output script family used to render the address.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum, Default,
)]
#[serde(rename_all = "kebab-case")]
#[value(rename_all = "kebab-case")]
pub enum BtcAddressType {
    /// Pick from the purpose level of the path (44, 49, 84, 86).
    #[default]
    Auto,
    P2pkh,
    #[serde(rename = "p2sh-p2wpkh")]
    #[value(name = "p2sh-p2wpkh")]
    P2shP2wpkh,
    P2wpkh,
    P2tr,
}

impl BtcAddressType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::P2pkh => "p2pkh",
            Self::P2shP2wpkh => "p2sh-p2wpkh",
            Self::P2wpkh => "p2wpkh",
            Self::P2tr => "p2tr",
        }
    }

    /// Parse the config/env spelling (case-insensitive, `_` accepted for `-`).
    pub fn parse(s: &str) -> Option<Self> {
        let norm = s.trim().to_ascii_lowercase().replace('_', "-");
        [
            Self::Auto,
            Self::P2pkh,
            Self::P2shP2wpkh,
            Self::P2wpkh,
            Self::P2tr,
        ]
        .into_iter()
        .find(|t| t.as_str() == norm)
    }
}

impl fmt::Display for BtcAddressType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChainOptions {
    pub btc_address_type: BtcAddressType,
}

/// Address plus private key in the coin's conventional text encoding.
pub struct KeyPair {
    pub address: String,
    pub private_key: Zeroizing<String>,
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

pub fn derive(
    coin: Coin,
    seed: &Seed,
    path: &ConcretePath,
    options: ChainOptions,
) -> Result<KeyPair, MnemonicToolError> {
    match coin {
        Coin::Btc => bitcoin::derive(seed, path, options.btc_address_type),
        Coin::Eth => evm::derive(seed, path),
        Coin::Sol => solana::derive(seed, path),
        Coin::Trx => tron::derive(seed, path),
    }
}

/// Reject templates the coin's curve cannot derive, before any seed work.
pub fn check_template(coin: Coin, template: &PathTemplate) -> Result<(), MnemonicToolError> {
    match coin {
        Coin::Sol if !template.all_hardened() => Err(MnemonicToolError::chain(
            Coin::Sol.as_str(),
            template.as_str(),
            "SOL uses ed25519 (SLIP-0010), which only supports hardened levels",
        )),
        Coin::Btc | Coin::Eth | Coin::Sol | Coin::Trx => Ok(()),
    }
}

pub(crate) fn bip32_path(
    coin: Coin,
    path: &ConcretePath,
) -> Result<DerivationPath, MnemonicToolError> {
    let children = path
        .levels()
        .iter()
        .map(|c| {
            if c.hardened {
                ChildNumber::from_hardened_idx(c.index)
            } else {
                ChildNumber::from_normal_idx(c.index)
            }
            .map_err(|e| MnemonicToolError::chain(coin.as_str(), path, e.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(DerivationPath::from(children))
}

/// BIP32 secp256k1 child secret key for `path`.
pub(crate) fn secp256k1_secret(
    coin: Coin,
    secp: &Secp256k1<All>,
    seed: &Seed,
    path: &ConcretePath,
) -> Result<SecretKey, MnemonicToolError> {
    let err = |e: ::bitcoin::bip32::Error| MnemonicToolError::chain(coin.as_str(), path, e.to_string());
    let master = Xpriv::new_master(NetworkKind::Main, seed.as_bytes()).map_err(err)?;
    let child = master.derive_priv(secp, &bip32_path(coin, path)?).map_err(err)?;
    Ok(child.private_key)
}

#[cfg(test)]
pub(crate) mod test_vectors {
    use crate::mnemonic::{MnemonicPhrase, Seed};

    pub const ABANDON_ABOUT: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    pub fn abandon_seed() -> eyre::Result<Seed> {
        MnemonicPhrase::parse(ABANDON_ABOUT)?.to_seed("")
    }
}
