//! An unlocked wallet.
//!
//! A [`Session`] is created by unlocking the vault and owns the decrypted
//! record until [`Session::lock`] (or drop) zeroizes it. Sends on the same
//! chain are serialized so two concurrent sends never pick the same UTXOs.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;
use zeroize::Zeroizing;

use cryptovault_core::chain::{Chain, PerChain};
use cryptovault_core::relay::BroadcastRelay;
use cryptovault_core::traits::ChainIndexer;
use cryptovault_core::types::TxSummary;

use crate::error::WalletError;
use crate::record::WalletRecord;
use crate::send::{SendOutcome, SendPipeline, SendRequest, SendState};
use crate::vault::LocalVault;

/// Network collaborators for one chain.
#[derive(Clone)]
pub struct ChainServices {
    pub indexer: Arc<dyn ChainIndexer>,
    pub relay: BroadcastRelay,
}

impl ChainServices {
    pub fn new(indexer: Arc<dyn ChainIndexer>, relay: BroadcastRelay) -> Self {
        Self { indexer, relay }
    }
}

impl std::fmt::Debug for ChainServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainServices")
            .field("chain", &self.indexer.chain())
            .field("relay", &self.relay)
            .finish()
    }
}

/// Decrypted wallet plus per-chain services.
pub struct Session {
    record: WalletRecord,
    services: PerChain<ChainServices>,
    send_locks: PerChain<Mutex<()>>,
}

impl Session {
    /// Decrypt the vault's wallet and open a session on it.
    pub fn unlock(
        vault: &LocalVault,
        password: &str,
        services: PerChain<ChainServices>,
    ) -> Result<Self, WalletError> {
        let record = vault.unlock(password)?;
        info!(btc = %record.addresses.btc, "Wallet unlocked");
        Ok(Self::from_record(record, services))
    }

    /// Open a session on an already-decrypted record.
    pub fn from_record(record: WalletRecord, services: PerChain<ChainServices>) -> Self {
        Self {
            record,
            services,
            send_locks: PerChain::from_fn(|_| Mutex::new(())),
        }
    }

    /// End the session. The record is zeroized on drop.
    pub fn lock(self) {
        info!("Wallet locked");
    }

    pub fn record(&self) -> &WalletRecord {
        &self.record
    }

    pub fn addresses(&self) -> &PerChain<String> {
        &self.record.addresses
    }

    pub fn address(&self, chain: Chain) -> &str {
        self.record.address(chain)
    }

    /// Exportable private keys: WIF for BTC/LTC, `0x` hex for ETH.
    pub fn export_keys(&self) -> Zeroizing<PerChain<String>> {
        Zeroizing::new(self.record.private_keys.clone())
    }

    pub fn mnemonic(&self) -> &str {
        &self.record.mnemonic
    }

    pub fn services(&self, chain: Chain) -> &ChainServices {
        &self.services[chain]
    }

    /// Balance of the wallet's own address, smallest unit.
    pub async fn balance(&self, chain: Chain) -> Result<u128, WalletError> {
        Ok(self.services[chain].indexer.balance(self.address(chain)).await?)
    }

    /// Most recent transactions of the wallet's own address.
    pub async fn history(&self, chain: Chain, limit: usize) -> Result<Vec<TxSummary>, WalletError> {
        Ok(self.services[chain]
            .indexer
            .history(self.address(chain), limit)
            .await?)
    }

    /// Send `amount` from the wallet's own address on `chain` to `to`.
    pub async fn send(&self, chain: Chain, to: &str, amount: u64, fee: u64) -> SendOutcome {
        let request = SendRequest::new(chain, self.address(chain), to, amount).with_fee(fee);
        self.send_request(&request).await
    }

    /// Run `request` with this wallet's key for its chain.
    ///
    /// Holds the chain's send lock for the whole pipeline.
    pub async fn send_request(&self, request: &SendRequest) -> SendOutcome {
        let chain = request.chain;
        let _guard = self.send_locks[chain].lock().await;

        let key = match self.record.chain_key(chain) {
            Ok(k) => k,
            Err(e) => return SendOutcome::failed(&e, SendState::Idle),
        };
        let services = &self.services[chain];
        SendPipeline::new(services.indexer.as_ref(), &services.relay)
            .execute(request, &key)
            .await
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("record", &self.record)
            .field("services", &self.services)
            .finish()
    }
}
