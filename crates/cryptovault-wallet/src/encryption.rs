//! Password-based wallet encryption.
//!
//! PBKDF2-HMAC-SHA256 stretches the password into an AES-256 key; the
//! record JSON is sealed with AES-256-GCM.
//!
//! # Stored form
//! ```text
//! {"encryptedData": hex(nonce (12) || ciphertext || tag (16)),
//!  "salt":          hex(salt (16)),
//!  "iterations":    10000}
//! ```
//! `iterations` may be absent in older blobs and then defaults to 10 000.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::debug;
use zeroize::Zeroizing;

use cryptovault_core::constants::MIN_PBKDF2_ITERATIONS;

use crate::error::WalletError;
use crate::record::WalletRecord;

/// Salt length in bytes.
const SALT_LEN: usize = 16;

/// AES-GCM nonce length in bytes.
const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag length in bytes.
const TAG_LEN: usize = 16;

/// Upper bound accepted when reading a stored blob.
pub const MAX_PBKDF2_ITERATIONS: u32 = 10_000_000;

fn default_iterations() -> u32 {
    MIN_PBKDF2_ITERATIONS
}

/// The only form of wallet secret that reaches storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedWallet {
    pub encrypted_data: String,
    pub salt: String,
    #[serde(default = "default_iterations")]
    pub iterations: u32,
}

impl EncryptedWallet {
    pub fn to_json(&self) -> Result<String, WalletError> {
        serde_json::to_string(self).map_err(|e| WalletError::Serialization(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, WalletError> {
        serde_json::from_str(json).map_err(|e| WalletError::CorruptedFile(e.to_string()))
    }
}

/// Clamp a requested iteration count into the accepted range.
pub fn effective_iterations(requested: u32) -> u32 {
    requested.clamp(MIN_PBKDF2_ITERATIONS, MAX_PBKDF2_ITERATIONS)
}

/// Derive a 256-bit key from a password and salt.
pub fn derive_key(password: &[u8], salt: &[u8], iterations: u32) -> Zeroizing<[u8; 32]> {
    let mut key = Zeroizing::new([0u8; 32]);
    pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, effective_iterations(iterations), &mut key[..]);
    key
}

/// Seal arbitrary bytes. Returns `(salt, nonce || ciphertext || tag)`.
pub fn encrypt_bytes(
    plaintext: &[u8],
    password: &[u8],
    iterations: u32,
) -> Result<([u8; SALT_LEN], Vec<u8>), WalletError> {
    let mut salt = [0u8; SALT_LEN];
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);

    let key = derive_key(password, &salt, iterations);
    let cipher = Aes256Gcm::new_from_slice(&key[..])
        .map_err(|e| WalletError::Encryption(e.to_string()))?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|e| WalletError::Encryption(e.to_string()))?;

    let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    sealed.extend_from_slice(&nonce_bytes);
    sealed.extend_from_slice(&ciphertext);
    Ok((salt, sealed))
}

/// Open bytes sealed by [`encrypt_bytes`].
///
/// Wrong password and tampered data both yield [`WalletError::InvalidPassword`].
pub fn decrypt_bytes(
    sealed: &[u8],
    salt: &[u8],
    password: &[u8],
    iterations: u32,
) -> Result<Zeroizing<Vec<u8>>, WalletError> {
    if sealed.len() < NONCE_LEN + TAG_LEN {
        return Err(WalletError::CorruptedFile(format!(
            "encrypted data too short: {} < {}",
            sealed.len(),
            NONCE_LEN + TAG_LEN
        )));
    }
    let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);

    let key = derive_key(password, salt, iterations);
    let cipher = Aes256Gcm::new_from_slice(&key[..])
        .map_err(|e| WalletError::Encryption(e.to_string()))?;
    cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map(Zeroizing::new)
        .map_err(|_| WalletError::InvalidPassword)
}

/// Encrypt a wallet record under `password`.
///
/// `iterations` below the 10 000 floor are raised to it.
pub fn encrypt(
    record: &WalletRecord,
    password: &str,
    iterations: u32,
) -> Result<EncryptedWallet, WalletError> {
    let json = record.to_json()?;
    let iterations = effective_iterations(iterations);
    let (salt, sealed) = encrypt_bytes(json.as_bytes(), password.as_bytes(), iterations)?;
    debug!(iterations, bytes = sealed.len(), "Wallet record encrypted");
    Ok(EncryptedWallet {
        encrypted_data: hex::encode(sealed),
        salt: hex::encode(salt),
        iterations,
    })
}

/// Decrypt a wallet record, with the reason on failure.
pub fn try_decrypt(
    encrypted: &EncryptedWallet,
    password: &str,
) -> Result<WalletRecord, WalletError> {
    if encrypted.iterations > MAX_PBKDF2_ITERATIONS {
        return Err(WalletError::CorruptedFile(format!(
            "iteration count {} exceeds {MAX_PBKDF2_ITERATIONS}",
            encrypted.iterations
        )));
    }
    let sealed = hex::decode(encrypted.encrypted_data.trim())
        .map_err(|e| WalletError::CorruptedFile(e.to_string()))?;
    let salt = hex::decode(encrypted.salt.trim())
        .map_err(|e| WalletError::CorruptedFile(e.to_string()))?;
    let plaintext = decrypt_bytes(&sealed, &salt, password.as_bytes(), encrypted.iterations)?;
    let json = std::str::from_utf8(&plaintext)
        .map_err(|e| WalletError::CorruptedFile(e.to_string()))?;
    WalletRecord::from_json(json).map_err(|e| WalletError::CorruptedFile(e.to_string()))
}

/// Decrypt a wallet record.
///
/// Any failure (wrong password, tampered or malformed data) is `None`.
pub fn decrypt(encrypted: &EncryptedWallet, password: &str) -> Option<WalletRecord> {
    try_decrypt(encrypted, password).ok()
}
