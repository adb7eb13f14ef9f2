//! # cryptovault-wallet: multi-chain HD wallet core.
//!
//! Derives one key per chain from a BIP-39 phrase, encrypts the resulting
//! wallet record for local storage, and builds and signs legacy P2PKH
//! transactions for the UTXO chains.
//!
//! # Modules
//!
//! - [`error`]: `WalletError` and its `ErrorKind` classifier
//! - [`mnemonic`]: BIP-39 phrase generation, validation, seed stretch
//! - [`keys`]: secp256k1 backend, BIP-32 derivation, `ChainKey`
//! - [`record`]: `WalletRecord` assembly
//! - [`password`]: password strength scoring
//! - [`encryption`]: PBKDF2 + AES-256-GCM wallet cipher
//! - [`vault`]: file and in-memory stores, `LocalVault`
//! - [`coin_selection`]: UTXO selection strategies
//! - [`builder`]: transaction builder and signer
//! - [`send`]: fetch/select/verify/sign/broadcast pipeline
//! - [`session`]: unlocked wallet context

pub mod builder;
pub mod coin_selection;
pub mod encryption;
pub mod error;
pub mod keys;
pub mod mnemonic;
pub mod password;
pub mod record;
pub mod send;
pub mod session;
pub mod vault;

pub use builder::{SignedTransaction, TransactionBuilder, UnsignedTransaction};
pub use coin_selection::{CoinSelection, CoinSelector, SelectionStrategy};
pub use encryption::{EncryptedWallet, decrypt, encrypt};
pub use error::{ErrorKind, WalletError};
pub use keys::{ChainKey, Seed, init_crypto_backend};
pub use mnemonic::{derive_seed, generate_mnemonic, validate_mnemonic};
pub use password::{PasswordStrength, validate_password_strength};
pub use record::WalletRecord;
pub use send::{SendOutcome, SendRequest, SendState};
pub use session::{ChainServices, Session};
pub use vault::{FileStore, LocalVault, MemoryStore};
