use super::{secp256k1_secret, BtcAddressType, Coin, KeyPair};
use crate::{errors::MnemonicToolError, mnemonic::Seed, path_template::ConcretePath};
use bitcoin::{
    secp256k1::Secp256k1, Address, CompressedPublicKey, KnownHrp, Network, PrivateKey,
};
use zeroize::Zeroizing;

/// Concrete script type for `requested`, inferring from the BIP43 purpose when `Auto`.
pub fn resolve_address_type(requested: BtcAddressType, path: &ConcretePath) -> BtcAddressType {
    match requested {
        BtcAddressType::Auto => match path.purpose() {
            Some(44) => BtcAddressType::P2pkh,
            Some(49) => BtcAddressType::P2shP2wpkh,
            Some(86) => BtcAddressType::P2tr,
            _ => BtcAddressType::P2wpkh,
        },
        BtcAddressType::P2pkh
        | BtcAddressType::P2shP2wpkh
        | BtcAddressType::P2wpkh
        | BtcAddressType::P2tr => requested,
    }
}

/// Mainnet address and compressed WIF for `path`.
pub fn derive(
    seed: &Seed,
    path: &ConcretePath,
    address_type: BtcAddressType,
) -> Result<KeyPair, MnemonicToolError> {
    let secp = Secp256k1::new();
    let sk = secp256k1_secret(Coin::Btc, &secp, seed, path)?;
    let private = PrivateKey::new(sk, Network::Bitcoin);
    let cpk = CompressedPublicKey::try_from(private.public_key(&secp))
        .map_err(|e| MnemonicToolError::chain("BTC", path, e.to_string()))?;

    let address = match resolve_address_type(address_type, path) {
        BtcAddressType::P2pkh => Address::p2pkh(cpk.pubkey_hash(), Network::Bitcoin),
        BtcAddressType::P2shP2wpkh => Address::p2shwpkh(&cpk, Network::Bitcoin),
        BtcAddressType::P2tr => {
            let (internal, _parity) = cpk.0.x_only_public_key();
            Address::p2tr(&secp, internal, None, KnownHrp::Mainnet)
        }
        BtcAddressType::P2wpkh | BtcAddressType::Auto => Address::p2wpkh(&cpk, KnownHrp::Mainnet),
    };

    Ok(KeyPair {
        address: address.to_string(),
        private_key: Zeroizing::new(private.to_wif()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{chains::test_vectors::abandon_seed, path_template::resolve};

    fn btc(template: &str, index: u32, kind: BtcAddressType) -> eyre::Result<KeyPair> {
        Ok(derive(&abandon_seed()?, &resolve(template, index)?, kind)?)
    }

    #[test]
    fn bip84_vectors_abandon_about() -> eyre::Result<()> {
        let kp0 = btc("m/84'/0'/0'/0/{i}", 0, BtcAddressType::Auto)?;
        assert_eq!(kp0.address, "bc1qcr8te4kr609gcawutmrza0j4xv80jy8z306fyu");
        assert_eq!(
            kp0.private_key.as_str(),
            "KyZpNDKnfs94vbrwhJneDi77V6jF64PWPF8x5cdJb8ifgg2DUc9d"
        );
        let kp1 = btc("m/84'/0'/0'/0/{i}", 1, BtcAddressType::Auto)?;
        assert_eq!(kp1.address, "bc1qnjg0jd8228aq7egyzacy8cys3knf9xvrerkf9g");
        Ok(())
    }

    #[test]
    fn bip44_infers_legacy_address() -> eyre::Result<()> {
        let kp = btc("m/44'/0'/0'/0/{i}", 0, BtcAddressType::Auto)?;
        assert_eq!(kp.address, "1LqBGSKuX5yYUonjxT5qGfpUsXKYYWeabA");
        assert_eq!(
            kp.private_key.as_str(),
            "L4p2b9VAf8k5aUahF1JCJUzZkgNEAqLfq8DDdQiyAprQAKSbu8hf"
        );
        Ok(())
    }

    #[test]
    fn explicit_type_overrides_purpose() -> eyre::Result<()> {
        let nested = btc("m/84'/0'/0'/0/{i}", 0, BtcAddressType::P2shP2wpkh)?;
        assert!(nested.address.starts_with('3'), "{}", nested.address);
        let taproot = btc("m/84'/0'/0'/0/{i}", 0, BtcAddressType::P2tr)?;
        assert!(taproot.address.starts_with("bc1p"), "{}", taproot.address);
        Ok(())
    }

    #[test]
    fn auto_follows_the_purpose_level() -> eyre::Result<()> {
        let cases = [
            ("m/44'/0'/0'/0/{i}", BtcAddressType::P2pkh),
            ("m/49'/0'/0'/0/{i}", BtcAddressType::P2shP2wpkh),
            ("m/84'/0'/0'/0/{i}", BtcAddressType::P2wpkh),
            ("m/86'/0'/0'/0/{i}", BtcAddressType::P2tr),
            ("m/0'/0'/{i}", BtcAddressType::P2wpkh),
        ];
        for (template, expected) in cases {
            let p = resolve(template, 0)?;
            assert_eq!(resolve_address_type(BtcAddressType::Auto, &p), expected, "{template}");
        }
        Ok(())
    }
}
