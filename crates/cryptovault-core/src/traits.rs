//! Trait seams between the wallet core and its collaborators.
//!
//! - [`ChainIndexer`]: read-only chain data (cryptovault-network implements)
//! - [`BroadcastProvider`]: one relay endpoint (cryptovault-network implements)
//! - [`VaultStore`]: durable key-value storage (cryptovault-wallet implements)
//!
//! Indexer and provider responses are untrusted input.

use async_trait::async_trait;

use crate::chain::Chain;
use crate::error::{NetworkError, StorageError};
use crate::types::{TxSummary, Utxo};

/// Read access to one chain's explorer/indexer.
#[async_trait]
pub trait ChainIndexer: Send + Sync {
    /// The chain this indexer serves.
    fn chain(&self) -> Chain;

    /// Unspent outputs paying to `address`, in indexer order.
    async fn utxos(&self, address: &str) -> Result<Vec<Utxo>, NetworkError>;

    /// Raw hex of a confirmed or mempool transaction.
    async fn raw_transaction(&self, txid: &str) -> Result<String, NetworkError>;

    /// Confirmed balance in the smallest unit.
    async fn balance(&self, address: &str) -> Result<u128, NetworkError>;

    /// Most recent transactions touching `address`, newest first.
    async fn history(&self, address: &str, limit: usize) -> Result<Vec<TxSummary>, NetworkError>;
}

/// A single broadcast endpoint.
///
/// One attempt per call; retry and fallback belong to the relay.
#[async_trait]
pub trait BroadcastProvider: Send + Sync {
    /// Short name used in logs and aggregated errors.
    fn name(&self) -> &str;

    /// Submit a signed raw transaction and return the txid the endpoint
    /// reports.
    async fn broadcast(&self, raw_hex: &str) -> Result<String, NetworkError>;
}

/// Durable string key-value storage for the encrypted wallet blob.
///
/// A missing key is `Ok(None)`, not an error. Deleting a missing key
/// succeeds.
pub trait VaultStore: Send + Sync {
    fn put(&self, key: &str, blob: &str) -> Result<(), StorageError>;

    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Whether `key` currently holds a value.
    ///
    /// Default implementation delegates to [`get`](Self::get).
    fn contains(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.get(key)?.is_some())
    }
}
