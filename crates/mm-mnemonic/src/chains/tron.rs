use super::{secp256k1_secret, Coin, KeyPair};
use crate::{errors::MnemonicToolError, mnemonic::Seed, path_template::ConcretePath};
use alloy::primitives::keccak256;
use bitcoin::secp256k1::{PublicKey, Secp256k1};
use zeroize::Zeroizing;

/// Mainnet address version byte.
const ADDRESS_PREFIX: u8 = 0x41;

/// Base58Check `T...` address and lowercase hex private key.
pub fn derive(seed: &Seed, path: &ConcretePath) -> Result<KeyPair, MnemonicToolError> {
    let secp = Secp256k1::new();
    let sk = secp256k1_secret(Coin::Trx, &secp, seed, path)?;
    let uncompressed = PublicKey::from_secret_key(&secp, &sk).serialize_uncompressed();
    Ok(KeyPair {
        address: address_from_uncompressed(&uncompressed),
        private_key: Zeroizing::new(hex::encode(sk.secret_bytes())),
    })
}

/// `0x41 || keccak256(X || Y)[12..]`, Base58Check encoded.
fn address_from_uncompressed(pubkey: &[u8; 65]) -> String {
    let [_tag, xy @ ..] = pubkey;
    let hash = keccak256(xy);
    let mut payload = Vec::with_capacity(21);
    payload.push(ADDRESS_PREFIX);
    payload.extend_from_slice(hash.get(12..).unwrap_or_default());
    bitcoin::base58::encode_check(&payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{chains::test_vectors::abandon_seed, path_template::resolve};

    #[test]
    fn vectors_abandon_about() -> eyre::Result<()> {
        let seed = abandon_seed()?;
        let kp0 = derive(&seed, &resolve("m/44'/195'/0'/0/{i}", 0)?)?;
        assert_eq!(kp0.address, "TUEZSdKsoDHQMeZwihtdoBiN46zxhGWYdH");
        assert_eq!(
            kp0.private_key.as_str(),
            "b5a4cea271ff424d7c31dc12a3e43e401df7a40d7412a15750f3f0b6b5449a28"
        );
        let kp1 = derive(&seed, &resolve("m/44'/195'/0'/0/{i}", 1)?)?;
        assert_eq!(kp1.address, "TSeJkUh4Qv67VNFwY8LaAxERygNdy6NQZK");
        Ok(())
    }
}
