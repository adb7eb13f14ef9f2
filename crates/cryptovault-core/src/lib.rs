//! # cryptovault-core
//! Chain parameters, address encoding, hashing and the trait seams shared
//! by the CryptoVault wallet, network and CLI crates.

pub mod address;
pub mod chain;
pub mod constants;
pub mod crypto;
pub mod error;
pub mod relay;
pub mod traits;
pub mod types;
pub mod units;
