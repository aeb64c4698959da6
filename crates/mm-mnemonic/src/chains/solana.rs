use super::KeyPair;
use crate::{errors::MnemonicToolError, mnemonic::Seed, path_template::ConcretePath};
use ed25519_dalek::SigningKey;
use hmac::{Hmac, Mac as _};
use sha2::Sha512;
use zeroize::Zeroizing;

type HmacSha512 = Hmac<Sha512>;

const HARDENED_OFFSET: u32 = 0x8000_0000;

struct ExtendedKey {
    key: Zeroizing<[u8; 32]>,
    chain_code: Zeroizing<[u8; 32]>,
}

fn split_digest(digest: &[u8]) -> ExtendedKey {
    let mut key = Zeroizing::new([0_u8; 32]);
    let mut chain_code = Zeroizing::new([0_u8; 32]);
    let (il, ir) = digest.split_at(32.min(digest.len()));
    key.copy_from_slice(il);
    chain_code.copy_from_slice(ir);
    ExtendedKey { key, chain_code }
}

fn hmac_node(key: &[u8], parts: &[&[u8]], path: &ConcretePath) -> Result<ExtendedKey, MnemonicToolError> {
    let mut mac = HmacSha512::new_from_slice(key)
        .map_err(|e| MnemonicToolError::chain("SOL", path, e.to_string()))?;
    for p in parts {
        mac.update(p);
    }
    Ok(split_digest(&mac.finalize().into_bytes()))
}

/// SLIP-0010 ed25519 derivation. Only hardened levels exist on this curve.
fn slip10_secret(seed: &Seed, path: &ConcretePath) -> Result<Zeroizing<[u8; 32]>, MnemonicToolError> {
    if let Some(level) = path.first_unhardened() {
        return Err(MnemonicToolError::chain(
            "SOL",
            path,
            format!("level {level} is not hardened; ed25519 derivation requires hardened levels"),
        ));
    }

    let mut node = hmac_node(b"ed25519 seed", &[seed.as_bytes().as_slice()], path)?;
    for level in path.levels() {
        let index = level.index | HARDENED_OFFSET;
        node = hmac_node(
            node.chain_code.as_slice(),
            &[[0_u8].as_slice(), node.key.as_slice(), index.to_be_bytes().as_slice()],
            path,
        )?;
    }
    Ok(node.key)
}

/// Base58 public key address; private key is Base58 of `secret || public`.
pub fn derive(seed: &Seed, path: &ConcretePath) -> Result<KeyPair, MnemonicToolError> {
    let secret = slip10_secret(seed, path)?;
    let signing = SigningKey::from_bytes(&secret);
    let public = signing.verifying_key().to_bytes();

    let mut keypair = Zeroizing::new([0_u8; 64]);
    let (sk_half, pk_half) = keypair.split_at_mut(32);
    sk_half.copy_from_slice(secret.as_slice());
    pk_half.copy_from_slice(&public);

    Ok(KeyPair {
        address: bs58::encode(public).into_string(),
        private_key: Zeroizing::new(bs58::encode(keypair.as_slice()).into_string()),
    })
}
