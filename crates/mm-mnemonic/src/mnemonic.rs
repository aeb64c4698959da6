use crate::errors::MnemonicToolError;
use bip39::{Language, Mnemonic};
use eyre::Context as _;
use rand::Rng as _;
use std::fmt;
use zeroize::Zeroizing;

/// Where generated mnemonics and passphrases get their randomness from.
///
/// Production code uses [`OsEntropy`]; tests plug in a deterministic source so batch
/// runs can be replayed.
pub trait EntropySource {
    fn fill(&mut self, buf: &mut [u8]);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&mut self, buf: &mut [u8]) {
        rand::rng().fill_bytes(buf);
    }
}

/// Word counts supported for generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WordCount {
    Twelve,
    Fifteen,
    TwentyOne,
    #[default]
    TwentyFour,
}

impl WordCount {
    pub const ALL: [Self; 4] = [Self::Twelve, Self::Fifteen, Self::TwentyOne, Self::TwentyFour];

    pub const fn words(self) -> usize {
        match self {
            Self::Twelve => 12,
            Self::Fifteen => 15,
            Self::TwentyOne => 21,
            Self::TwentyFour => 24,
        }
    }

    pub const fn entropy_bits(self) -> usize {
        match self {
            Self::Twelve => 128,
            Self::Fifteen => 160,
            Self::TwentyOne => 224,
            Self::TwentyFour => 256,
        }
    }

    pub const fn entropy_bytes(self) -> usize {
        self.entropy_bits() / 8
    }
}

impl fmt::Display for WordCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.words())
    }
}

impl TryFrom<usize> for WordCount {
    type Error = String;

    fn try_from(n: usize) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|w| w.words() == n)
            .ok_or_else(|| format!("words must be one of: 12, 15, 21, 24 (got {n})"))
    }
}

/// clap value parser for `--words`.
pub fn parse_word_count(s: &str) -> Result<WordCount, String> {
    let n: usize = s
        .trim()
        .parse()
        .map_err(|e| format!("invalid word count `{s}`: {e}"))?;
    WordCount::try_from(n)
}

/// A checksum-valid English mnemonic, stored in its normalized form
/// (single spaces, lowercase). The phrase is wiped from memory on drop.
#[derive(Clone)]
pub struct MnemonicPhrase {
    phrase: Zeroizing<String>,
    words: usize,
}

impl fmt::Debug for MnemonicPhrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MnemonicPhrase")
            .field("words", &self.words)
            .finish_non_exhaustive()
    }
}

/// 64-byte BIP39 seed, wiped on drop.
pub struct Seed(Zeroizing<[u8; 64]>);

impl Seed {
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

fn normalize(candidate: &str) -> Zeroizing<String> {
    let words: Vec<&str> = candidate.split_whitespace().collect();
    Zeroizing::new(words.join(" ").to_lowercase())
}

impl MnemonicPhrase {
    /// Generate a fresh mnemonic with `words` words from `source`.
    pub fn generate(words: WordCount, source: &mut impl EntropySource) -> eyre::Result<Self> {
        let mut entropy = Zeroizing::new(vec![0_u8; words.entropy_bytes()]);
        source.fill(&mut entropy);
        let mnemonic =
            Mnemonic::from_entropy_in(Language::English, &entropy).context("mnemonic from entropy")?;
        Ok(Self {
            phrase: Zeroizing::new(mnemonic.to_string()),
            words: words.words(),
        })
    }

    /// Validate `candidate` against the English wordlist and its checksum.
    pub fn parse(candidate: &str) -> Result<Self, MnemonicToolError> {
        let phrase = normalize(candidate);
        match Mnemonic::parse_in_normalized(Language::English, &phrase) {
            Ok(m) => Ok(Self {
                words: m.word_count(),
                phrase,
            }),
            Err(e) => Err(MnemonicToolError::InvalidMnemonic(e.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.phrase
    }

    pub const fn word_count(&self) -> usize {
        self.words
    }

    /// BIP39 seed: PBKDF2-HMAC-SHA512, 2048 rounds, salt `"mnemonic" + passphrase`.
    ///
    /// The passphrase is NFKD-normalized first, as BIP39 requires.
    pub fn to_seed(&self, passphrase: &str) -> eyre::Result<Seed> {
        let m = Mnemonic::parse_in_normalized(Language::English, &self.phrase)
            .context("re-parse validated mnemonic")?;
        Ok(Seed(Zeroizing::new(m.to_seed(passphrase))))
    }
}

/// Pure classification: never panics, never errors.
pub fn is_valid_mnemonic(candidate: &str) -> bool {
    MnemonicPhrase::parse(candidate).is_ok()
}

/// Generate a fresh mnemonic from the OS CSPRNG.
pub fn generate_mnemonic(words: WordCount) -> eyre::Result<MnemonicPhrase> {
    MnemonicPhrase::generate(words, &mut OsEntropy)
}
