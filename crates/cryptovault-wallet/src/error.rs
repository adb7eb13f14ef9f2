//! Wallet error types.

use cryptovault_core::error::{AddressError, CryptoError, NetworkError, StorageError, UnitsError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur in wallet operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    /// Selected outputs cannot cover amount plus fee.
    #[error("insufficient funds: have {have}, need {need}")]
    InsufficientFunds {
        /// Available value in the smallest unit.
        have: u64,
        /// Required amount plus fee.
        need: u64,
    },

    /// The indexer returned no spendable outputs.
    #[error("no UTXOs available")]
    NoUtxos,

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Invalid BIP-39 mnemonic phrase.
    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    /// The signing key does not control the claimed source address.
    #[error("private key does not match address {expected} (derives {derived})")]
    KeyAddressMismatch { expected: String, derived: String },

    /// Indexer data disagrees with the previous transaction it served.
    #[error("previous transaction check failed: {0}")]
    PreviousTransaction(String),

    #[error("key derivation: {0}")]
    KeyDerivation(String),

    #[error("encryption: {0}")]
    Encryption(String),

    /// Wrong password or tampered ciphertext; the two are not distinguished.
    #[error("invalid password or corrupted wallet data")]
    InvalidPassword,

    /// Stored blob is not a well-formed encrypted wallet.
    #[error("corrupted wallet: {0}")]
    CorruptedFile(String),

    /// No wallet has been stored in the vault.
    #[error("no wallet found")]
    NoWallet,

    #[error("build error: {0}")]
    BuildError(String),

    #[error("serialization: {0}")]
    Serialization(String),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Address(#[from] AddressError),

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Units(#[from] UnitsError),
}

/// Coarse classification of a [`WalletError`] for callers and UIs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    InsufficientFunds,
    CryptoFailure,
    DecryptionFailure,
    NetworkFailure,
    Storage,
    Unsupported,
}

impl WalletError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WalletError::InsufficientFunds { .. } | WalletError::NoUtxos => {
                ErrorKind::InsufficientFunds
            }
            WalletError::InvalidAmount(_)
            | WalletError::InvalidAddress(_)
            | WalletError::InvalidMnemonic(_)
            | WalletError::KeyAddressMismatch { .. }
            | WalletError::PreviousTransaction(_)
            | WalletError::BuildError(_)
            | WalletError::Address(_)
            | WalletError::Units(_) => ErrorKind::Validation,
            WalletError::KeyDerivation(_)
            | WalletError::Encryption(_)
            | WalletError::Serialization(_)
            | WalletError::Crypto(_) => ErrorKind::CryptoFailure,
            WalletError::InvalidPassword | WalletError::CorruptedFile(_) => {
                ErrorKind::DecryptionFailure
            }
            WalletError::Network(NetworkError::Unsupported(_)) | WalletError::Unsupported(_) => {
                ErrorKind::Unsupported
            }
            WalletError::Network(_) => ErrorKind::NetworkFailure,
            WalletError::NoWallet | WalletError::Storage(_) => ErrorKind::Storage,
        }
    }
}
