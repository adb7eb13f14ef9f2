//! Integration test suite for CryptoVault.
//!
//! Exercises the wallet, vault, builder and relay together against
//! in-process mock indexers and broadcast providers.

pub mod helpers;
