//! On-disk batch records, in clear TOML or inside an Argon2id + AES-256-GCM envelope.

pub mod crypto;

use crate::{
    account::DerivedAccount,
    chains::{BtcAddressType, ChainOptions, Coin},
    errors::MnemonicToolError,
    fsutil,
};
use base64::Engine as _;
use chrono::SecondsFormat;
use crypto::{CryptoBox, KdfParams};
use eyre::Context as _;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::{fmt, fs, path::Path};
use zeroize::Zeroizing;

pub const RECORD_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// One mnemonic + passphrase shared by every account in the file.
    Batch1,
    /// One independent mnemonic per account, empty passphrase.
    Batch2,
    Derive,
}

impl RecordKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Batch1 => "batch1",
            Self::Batch2 => "batch2",
            Self::Derive => "derive",
        }
    }
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountRecord {
    pub index: u32,
    pub path: String,
    pub address: String,
    pub private_key: Zeroizing<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mnemonic: Option<Zeroizing<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passphrase: Option<Zeroizing<String>>,
}

impl AccountRecord {
    pub fn from_derived(a: &DerivedAccount) -> Self {
        Self {
            index: a.index,
            path: a.path.clone(),
            address: a.address.clone(),
            private_key: a.private_key.clone(),
            mnemonic: None,
            passphrase: None,
        }
    }
}

impl fmt::Debug for AccountRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountRecord")
            .field("index", &self.index)
            .field("path", &self.path)
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchRecord {
    pub version: u32,
    pub kind: RecordKind,
    pub coin: Coin,
    /// Template, with the `{i}` placeholder.
    pub derivation_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub btc_address_type: Option<BtcAddressType>,
    pub created_at: String,
    pub run_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mnemonic: Option<Zeroizing<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passphrase: Option<Zeroizing<String>>,
    #[serde(default)]
    pub accounts: Vec<AccountRecord>,
}

impl BatchRecord {
    /// Header for a new record created now; secrets and accounts are filled in by the caller.
    pub fn new(
        kind: RecordKind,
        coin: Coin,
        derivation_path: &str,
        options: ChainOptions,
        run_id: &str,
    ) -> Self {
        Self {
            version: RECORD_VERSION,
            kind,
            coin,
            derivation_path: derivation_path.to_owned(),
            btc_address_type: (coin == Coin::Btc).then_some(options.btc_address_type),
            created_at: chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            run_id: run_id.to_owned(),
            mnemonic: None,
            passphrase: None,
            accounts: vec![],
        }
    }
}

impl fmt::Debug for BatchRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchRecord")
            .field("version", &self.version)
            .field("kind", &self.kind)
            .field("coin", &self.coin)
            .field("derivation_path", &self.derivation_path)
            .field("run_id", &self.run_id)
            .field("accounts", &self.accounts)
            .finish_non_exhaustive()
    }
}

/// The only content of an encrypted file: enough to re-derive the key and open the box.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub kdf: String,
    pub m_cost_kib: u32,
    pub t_cost: u32,
    pub p_cost: u32,
    pub salt_b64: String,
    pub cipher: String,
    pub nonce_b64: String,
    pub ciphertext_b64: String,
}

#[derive(Serialize, Deserialize)]
struct EncryptedFile {
    encryption: Envelope,
}

pub enum StoredFile {
    Plain(Box<BatchRecord>),
    Encrypted(Envelope),
}

impl StoredFile {
    pub const fn is_encrypted(&self) -> bool {
        matches!(self, Self::Encrypted(_))
    }

    /// Resolve to a record, decrypting with `password` when needed.
    pub fn open(self, password: Option<&SecretString>) -> eyre::Result<BatchRecord> {
        match self {
            Self::Plain(r) => Ok(*r),
            Self::Encrypted(env) => {
                let password = password.ok_or_else(|| {
                    MnemonicToolError::Persistence("file is encrypted; a password is required".into())
                })?;
                let plaintext = open_envelope(&env, password)?;
                let text = std::str::from_utf8(&plaintext).context("decrypted record is not utf-8")?;
                toml::from_str(text).context("parse decrypted record")
            }
        }
    }
}

fn seal(plaintext: &[u8], password: &SecretString, kdf: KdfParams) -> eyre::Result<Envelope> {
    let salt = crypto::random_salt16();
    let key = crypto::derive_password_key(password, &salt, kdf)?;
    let sealed = crypto::encrypt_aes_gcm(&key, plaintext)?;
    Ok(Envelope {
        kdf: crypto::KDF_NAME.to_owned(),
        m_cost_kib: kdf.m_cost_kib,
        t_cost: kdf.t_cost,
        p_cost: kdf.p_cost,
        salt_b64: base64::engine::general_purpose::STANDARD.encode(salt),
        cipher: crypto::CIPHER_NAME.to_owned(),
        nonce_b64: sealed.nonce_b64,
        ciphertext_b64: sealed.ciphertext_b64,
    })
}

fn open_envelope(env: &Envelope, password: &SecretString) -> eyre::Result<Zeroizing<Vec<u8>>> {
    if env.kdf != crypto::KDF_NAME || env.cipher != crypto::CIPHER_NAME {
        eyre::bail!("unsupported encryption scheme: {} / {}", env.kdf, env.cipher);
    }
    let salt = base64::engine::general_purpose::STANDARD
        .decode(&env.salt_b64)
        .context("decode salt")?;
    let kdf = KdfParams {
        m_cost_kib: env.m_cost_kib,
        t_cost: env.t_cost,
        p_cost: env.p_cost,
    };
    let key = crypto::derive_password_key(password, &salt, kdf)?;
    let sealed = CryptoBox {
        nonce_b64: env.nonce_b64.clone(),
        ciphertext_b64: env.ciphertext_b64.clone(),
    };
    crypto::decrypt_aes_gcm(&key, &sealed).map_err(|e| {
        eyre::Report::new(MnemonicToolError::Persistence(
            "cannot decrypt file (wrong password or corrupted file)".into(),
        ))
        .wrap_err(e.to_string())
    })
}

/// Writes records either in the clear or sealed under one password.
///
/// The choice is fixed at construction, so no file of a run can end up in the other form.
pub struct Keystore {
    password: Option<SecretString>,
    kdf: KdfParams,
}

impl Keystore {
    pub const fn plaintext() -> Self {
        Self {
            password: None,
            kdf: KdfParams {
                m_cost_kib: 0,
                t_cost: 0,
                p_cost: 0,
            },
        }
    }

    pub const fn encrypted(password: SecretString, kdf: KdfParams) -> Self {
        Self {
            password: Some(password),
            kdf,
        }
    }

    pub const fn encrypts(&self) -> bool {
        self.password.is_some()
    }

    /// Serialize (and seal) in memory, then write atomically with private permissions.
    pub fn store(&self, path: &Path, record: &BatchRecord) -> eyre::Result<()> {
        let text = Zeroizing::new(toml::to_string(record).context("serialize record")?);
        let out = match &self.password {
            Some(pw) => {
                let encryption = seal(text.as_bytes(), pw, self.kdf)?;
                Zeroizing::new(
                    toml::to_string(&EncryptedFile { encryption })
                        .context("serialize envelope")?,
                )
            }
            None => text,
        };
        fsutil::write_string_atomic_restrictive(path, &out, fsutil::MODE_FILE_PRIVATE)
            .with_context(|| format!("write {}", path.display()))
    }
}

/// Read a record file without decrypting it.
pub fn read_file(path: &Path) -> eyre::Result<StoredFile> {
    let text = Zeroizing::new(
        fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?,
    );
    let table: toml::Table = toml::from_str(&text)
        .with_context(|| format!("parse {} as TOML", path.display()))?;
    if table.contains_key("encryption") {
        let f: EncryptedFile = table
            .try_into()
            .with_context(|| format!("parse encryption envelope in {}", path.display()))?;
        return Ok(StoredFile::Encrypted(f.encryption));
    }
    let record: BatchRecord = table
        .try_into()
        .with_context(|| format!("parse record in {}", path.display()))?;
    Ok(StoredFile::Plain(Box::new(record)))
}

pub fn load_record(path: &Path, password: Option<&SecretString>) -> eyre::Result<BatchRecord> {
    read_file(path)?.open(password)
}
