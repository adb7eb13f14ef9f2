//! BIP-39 recovery phrases.
//!
//! Phrases are 12 English words (128 bits of entropy plus a 4-bit
//! checksum). Input is whitespace-normalized and lowercased before parsing.

use bip39::{Language, Mnemonic};
use rand::RngCore;
use zeroize::Zeroizing;

use cryptovault_core::constants::{MNEMONIC_ENTROPY_BYTES, MNEMONIC_WORDS};

use crate::error::WalletError;
use crate::keys::Seed;

/// Collapse runs of whitespace and lowercase the phrase.
pub fn normalize_phrase(phrase: &str) -> Zeroizing<String> {
    Zeroizing::new(
        phrase
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase(),
    )
}

/// Generate a fresh 12-word phrase from the OS RNG.
pub fn generate_mnemonic() -> Result<Zeroizing<String>, WalletError> {
    let mut entropy = Zeroizing::new([0u8; MNEMONIC_ENTROPY_BYTES]);
    rand::rngs::OsRng.fill_bytes(&mut entropy[..]);
    let m = Mnemonic::from_entropy_in(Language::English, &entropy[..])
        .map_err(|e| WalletError::InvalidMnemonic(e.to_string()))?;
    Ok(Zeroizing::new(m.to_string()))
}

/// Parse a phrase, requiring exactly 12 words and a valid checksum.
pub fn parse_mnemonic(phrase: &str) -> Result<Mnemonic, WalletError> {
    let normalized = normalize_phrase(phrase);
    let m = Mnemonic::parse_in(Language::English, normalized.as_str())
        .map_err(|e| WalletError::InvalidMnemonic(e.to_string()))?;
    if m.word_count() != MNEMONIC_WORDS {
        return Err(WalletError::InvalidMnemonic(format!(
            "expected {MNEMONIC_WORDS} words, got {}",
            m.word_count()
        )));
    }
    Ok(m)
}

/// Whether `candidate` is a valid 12-word phrase. Never errors.
pub fn validate_mnemonic(candidate: &str) -> bool {
    parse_mnemonic(candidate).is_ok()
}

/// Stretch a phrase into the 64-byte BIP-39 seed.
///
/// PBKDF2-HMAC-SHA512, 2048 rounds, salt `"mnemonic" || passphrase`.
pub fn derive_seed(phrase: &str, passphrase: &str) -> Result<Seed, WalletError> {
    let m = parse_mnemonic(phrase)?;
    Ok(Seed::from_bytes(m.to_seed(passphrase)))
}
