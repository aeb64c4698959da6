use super::{secp256k1_secret, Coin, KeyPair};
use crate::{errors::MnemonicToolError, mnemonic::Seed, path_template::ConcretePath};
use alloy::signers::local::PrivateKeySigner;
use bitcoin::secp256k1::Secp256k1;
use zeroize::Zeroizing;

/// EIP-55 checksummed address and `0x`-prefixed hex private key.
pub fn derive(seed: &Seed, path: &ConcretePath) -> Result<KeyPair, MnemonicToolError> {
    let secp = Secp256k1::new();
    let sk = secp256k1_secret(Coin::Eth, &secp, seed, path)?;
    let secret = Zeroizing::new(sk.secret_bytes());
    let signer = PrivateKeySigner::from_slice(secret.as_slice())
        .map_err(|e| MnemonicToolError::chain("ETH", path, e.to_string()))?;
    Ok(KeyPair {
        address: signer.address().to_checksum(None),
        private_key: Zeroizing::new(format!("0x{}", hex::encode(secret.as_slice()))),
    })
}
