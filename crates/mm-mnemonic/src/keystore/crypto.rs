use crate::errors::MnemonicToolError;
use aes_gcm::{
    aead::{Aead as _, KeyInit as _},
    Aes256Gcm, Nonce,
};
use argon2::{Algorithm, Argon2, Params, Version};
use base64::Engine as _;
use eyre::Context as _;
use rand::Rng as _;
use secrecy::{ExposeSecret as _, SecretString};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

pub const KDF_NAME: &str = "argon2id";
pub const CIPHER_NAME: &str = "aes-256-gcm";

const NONCE_LEN: usize = 12;
pub const SALT_LEN: usize = 16;

/// Upper bounds on Argon2id costs. Costs come from files on disk, so anything above
/// these is treated as corruption rather than handed to the allocator.
pub const MAX_M_COST_KIB: u32 = 4 * 1024 * 1024;
pub const MAX_T_COST: u32 = 64;
pub const MAX_P_COST: u32 = 16;

/// Argon2id cost parameters. Stored next to the ciphertext so a file stays decryptable
/// after the configured defaults change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KdfParams {
    pub m_cost_kib: u32,
    pub t_cost: u32,
    pub p_cost: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        // argon2 0.5 defaults, frozen so dependency updates cannot change them.
        Self {
            m_cost_kib: 19 * 1024,
            t_cost: 2,
            p_cost: 1,
        }
    }
}

impl KdfParams {
    /// Reject costs outside `1..=MAX_*` (and memory below Argon2's `8 * p_cost` floor).
    pub fn check(self) -> Result<(), MnemonicToolError> {
        let ok = (1..=MAX_T_COST).contains(&self.t_cost)
            && (1..=MAX_P_COST).contains(&self.p_cost)
            && self.m_cost_kib >= 8 * self.p_cost
            && self.m_cost_kib <= MAX_M_COST_KIB;
        if ok {
            return Ok(());
        }
        Err(MnemonicToolError::Persistence(format!(
            "argon2 costs out of range (m_cost_kib={}, t_cost={}, p_cost={}; limits \
             m_cost_kib<={MAX_M_COST_KIB}, t_cost<={MAX_T_COST}, p_cost<={MAX_P_COST})",
            self.m_cost_kib, self.t_cost, self.p_cost
        )))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CryptoBox {
    pub nonce_b64: String,
    pub ciphertext_b64: String,
}

pub fn fill_random(buf: &mut [u8]) {
    let mut rng = rand::rng();
    rng.fill_bytes(buf);
}

pub fn random_salt16() -> [u8; SALT_LEN] {
    let mut s = [0_u8; SALT_LEN];
    fill_random(&mut s);
    s
}

pub fn derive_password_key(
    password: &SecretString,
    salt: &[u8],
    params: KdfParams,
) -> eyre::Result<Zeroizing<[u8; 32]>> {
    params.check()?;
    let params = Params::new(params.m_cost_kib, params.t_cost, params.p_cost, Some(32))
        .map_err(|e| eyre::eyre!("argon2 params: {e}"))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
    let mut out = Zeroizing::new([0_u8; 32]);
    argon2
        .hash_password_into(password.expose_secret().as_bytes(), salt, out.as_mut_slice())
        .map_err(|e| eyre::eyre!("argon2 hash: {e}"))?;
    Ok(out)
}

pub fn encrypt_aes_gcm(key32: &[u8; 32], plaintext: &[u8]) -> eyre::Result<CryptoBox> {
    let cipher = Aes256Gcm::new_from_slice(key32).context("aes init")?;
    let mut nonce = [0_u8; NONCE_LEN];
    fill_random(&mut nonce);
    let ct = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|e| eyre::eyre!("aes encrypt: {e}"))?;

    Ok(CryptoBox {
        nonce_b64: base64::engine::general_purpose::STANDARD.encode(nonce),
        ciphertext_b64: base64::engine::general_purpose::STANDARD.encode(ct),
    })
}

pub fn decrypt_aes_gcm(key32: &[u8; 32], b: &CryptoBox) -> eyre::Result<Zeroizing<Vec<u8>>> {
    let cipher = Aes256Gcm::new_from_slice(key32).context("aes init")?;
    let nonce = base64::engine::general_purpose::STANDARD
        .decode(&b.nonce_b64)
        .context("decode nonce")?;
    if nonce.len() != NONCE_LEN {
        eyre::bail!("invalid nonce length");
    }
    let ct = base64::engine::general_purpose::STANDARD
        .decode(&b.ciphertext_b64)
        .context("decode ciphertext")?;

    let pt = cipher
        .decrypt(Nonce::from_slice(&nonce), ct.as_ref())
        .map_err(|e| eyre::eyre!("aes decrypt (wrong password or corrupted file): {e}"))?;
    Ok(Zeroizing::new(pt))
}
