//! The wallet record: recovery phrase, addresses and exportable keys.
//!
//! This is the plaintext the wallet cipher encrypts. It is never written
//! to storage unencrypted.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop};

use cryptovault_core::chain::{Chain, PerChain};

use crate::error::WalletError;
use crate::keys::ChainKey;
use crate::mnemonic::{derive_seed, generate_mnemonic, normalize_phrase};

/// Mnemonic plus per-chain address and private key.
///
/// JSON shape:
/// `{"mnemonic": "..", "addresses": {"btc","ltc","eth"}, "privateKeys": {"btc","ltc","eth"}}`
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
pub struct WalletRecord {
    pub mnemonic: String,
    pub addresses: PerChain<String>,
    /// WIF for BTC/LTC, `0x` hex for ETH.
    pub private_keys: PerChain<String>,
}

impl WalletRecord {
    /// Generate a new wallet from a fresh random phrase.
    pub fn generate() -> Result<Self, WalletError> {
        let phrase = generate_mnemonic()?;
        Self::from_mnemonic(&phrase)
    }

    /// Rebuild a wallet from its recovery phrase alone.
    ///
    /// Same phrase, same addresses and keys.
    pub fn from_mnemonic(phrase: &str) -> Result<Self, WalletError> {
        let normalized = normalize_phrase(phrase);
        let seed = derive_seed(&normalized, "")?;
        let keys = PerChain::try_from_fn(|chain| ChainKey::derive(&seed, chain))?;

        let addresses = PerChain::try_from_fn(|chain| keys[chain].address())?;
        let private_keys = PerChain::try_from_fn(|chain| {
            keys[chain].export_private_key().map(|k| k.to_string())
        })?;

        debug!(
            btc = %addresses.btc,
            ltc = %addresses.ltc,
            eth = %addresses.eth,
            "Wallet keys derived"
        );

        Ok(Self {
            mnemonic: normalized.to_string(),
            addresses,
            private_keys,
        })
    }

    pub fn address(&self, chain: Chain) -> &str {
        &self.addresses[chain]
    }

    /// Signing key for `chain`, re-imported from the stored export.
    pub fn chain_key(&self, chain: Chain) -> Result<ChainKey, WalletError> {
        ChainKey::import(chain, &self.private_keys[chain])
    }

    /// Serialize to JSON for the cipher.
    pub fn to_json(&self) -> Result<zeroize::Zeroizing<String>, WalletError> {
        serde_json::to_string(self)
            .map(zeroize::Zeroizing::new)
            .map_err(|e| WalletError::Serialization(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, WalletError> {
        serde_json::from_str(json).map_err(|e| WalletError::Serialization(e.to_string()))
    }
}

impl fmt::Debug for WalletRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletRecord")
            .field("mnemonic", &"[REDACTED]")
            .field("addresses", &self.addresses)
            .field("private_keys", &"[REDACTED]")
            .finish()
    }
}
