use crate::mnemonic::{EntropySource, OsEntropy};
use zeroize::Zeroizing;

pub const DEFAULT_LENGTH: usize = 32;
pub const MIN_LENGTH: usize = 16;

const ALPHABET: &[u8; 62] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Largest multiple of the alphabet size that fits in a byte; bytes at or above it are
/// discarded so every character is equally likely.
const ACCEPT_BELOW: u8 = 248;

/// Random alphanumeric passphrase of `len` characters (~5.95 bits each).
pub fn generate_passphrase_with(len: usize, source: &mut impl EntropySource) -> Zeroizing<String> {
    let mut out = Zeroizing::new(String::with_capacity(len));
    let mut buf = Zeroizing::new([0_u8; 64]);
    while out.len() < len {
        source.fill(buf.as_mut_slice());
        for &b in buf.iter() {
            if out.len() == len {
                break;
            }
            if b >= ACCEPT_BELOW {
                continue;
            }
            if let Some(&c) = ALPHABET.get(usize::from(b) % ALPHABET.len()) {
                out.push(char::from(c));
            }
        }
    }
    out
}

pub fn generate_passphrase(len: usize) -> Zeroizing<String> {
    generate_passphrase_with(len, &mut OsEntropy)
}
