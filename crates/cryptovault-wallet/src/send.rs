//! The send pipeline for UTXO chains.
//!
//! ```text
//! Idle -> UtxosFetched -> PrevTxFetched -> Built -> Signed -> Broadcast
//! ```
//!
//! Every step before broadcast is local or read-only; a failure anywhere
//! aborts without submitting anything. The indexer is untrusted, so each
//! spent output is checked against its previous transaction before signing.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use cryptovault_core::chain::Chain;
use cryptovault_core::constants::DEFAULT_FLAT_FEE;
use cryptovault_core::relay::BroadcastRelay;
use cryptovault_core::traits::ChainIndexer;

use crate::builder::{
    SignedTransaction, TransactionBuilder, check_ownership, check_previous_output, sender_script,
};
use crate::coin_selection::SelectionStrategy;
use crate::error::{ErrorKind, WalletError};
use crate::keys::ChainKey;

/// Progress of a single send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SendState {
    Idle,
    UtxosFetched,
    PrevTxFetched,
    Built,
    Signed,
    Broadcast,
}

/// What to send, from where, to whom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendRequest {
    pub chain: Chain,
    pub from: String,
    pub to: String,
    /// Smallest unit.
    pub amount: u64,
    pub fee: u64,
    pub strategy: SelectionStrategy,
}

impl SendRequest {
    pub fn new(chain: Chain, from: impl Into<String>, to: impl Into<String>, amount: u64) -> Self {
        Self {
            chain,
            from: from.into(),
            to: to.into(),
            amount,
            fee: DEFAULT_FLAT_FEE,
            strategy: SelectionStrategy::default(),
        }
    }

    pub fn with_fee(mut self, fee: u64) -> Self {
        self.fee = fee;
        self
    }

    pub fn with_strategy(mut self, strategy: SelectionStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}

/// Structured result at the pipeline boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub txid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
    /// Last state reached.
    pub state: SendState,
}

impl SendOutcome {
    pub fn succeeded(txid: impl Into<String>) -> Self {
        Self {
            success: true,
            txid: Some(txid.into()),
            error: None,
            kind: None,
            state: SendState::Broadcast,
        }
    }

    pub fn failed(error: &WalletError, state: SendState) -> Self {
        Self {
            success: false,
            txid: None,
            error: Some(error.to_string()),
            kind: Some(error.kind()),
            state,
        }
    }
}

/// Drives one send through fetch, select, check, build, sign and broadcast.
pub struct SendPipeline<'a> {
    indexer: &'a dyn ChainIndexer,
    relay: &'a BroadcastRelay,
    state: SendState,
}

impl<'a> SendPipeline<'a> {
    pub fn new(indexer: &'a dyn ChainIndexer, relay: &'a BroadcastRelay) -> Self {
        Self {
            indexer,
            relay,
            state: SendState::Idle,
        }
    }

    pub fn state(&self) -> SendState {
        self.state
    }

    /// Run every step up to and including signing. Nothing is submitted.
    pub async fn prepare(
        &mut self,
        request: &SendRequest,
        key: &ChainKey,
    ) -> Result<SignedTransaction, WalletError> {
        let chain = request.chain;
        if self.indexer.chain() != chain || self.relay.chain() != chain || key.chain() != chain {
            return Err(WalletError::BuildError(format!(
                "{chain} send wired to indexer {} / relay {} / key {}",
                self.indexer.chain(),
                self.relay.chain(),
                key.chain()
            )));
        }

        let mut builder = TransactionBuilder::new(chain);
        builder
            .add_recipient(&request.to, request.amount)?
            .set_fee(request.fee)
            .set_strategy(request.strategy);
        check_ownership(key, &request.from)?;
        let from = request.from.trim();

        info!(
            %chain,
            from,
            to = %request.to.trim(),
            amount = request.amount,
            fee = request.fee,
            "Starting send"
        );

        let utxos = self.indexer.utxos(from).await?;
        self.state = SendState::UtxosFetched;
        debug!(%chain, count = utxos.len(), "UTXOs fetched");

        let selection = builder.select(&utxos)?;
        let sender_script = sender_script(chain, from)?;
        for utxo in &selection.selected {
            let raw = self.indexer.raw_transaction(&utxo.txid).await?;
            check_previous_output(utxo, &raw, &sender_script)?;
        }
        self.state = SendState::PrevTxFetched;
        debug!(%chain, inputs = selection.selected.len(), "Previous outputs verified");

        let unsigned = builder.build(selection, from)?;
        self.state = SendState::Built;

        let signed = TransactionBuilder::sign(unsigned, key)?;
        self.state = SendState::Signed;
        Ok(signed)
    }

    /// Prepare, then broadcast through the relay. Returns the relay's txid.
    pub async fn run(
        &mut self,
        request: &SendRequest,
        key: &ChainKey,
    ) -> Result<String, WalletError> {
        let signed = self.prepare(request, key).await?;
        let txid = self.relay.try_broadcast(&signed.raw_hex).await?;
        self.state = SendState::Broadcast;
        if !txid.eq_ignore_ascii_case(&signed.txid) {
            warn!(
                chain = %request.chain,
                local = %signed.txid,
                reported = %txid,
                "Relay reported a different txid"
            );
        }
        info!(chain = %request.chain, %txid, fee = signed.fee, "Transaction broadcast");
        Ok(txid)
    }

    /// [`run`](Self::run) folded into a [`SendOutcome`].
    pub async fn execute(mut self, request: &SendRequest, key: &ChainKey) -> SendOutcome {
        match self.run(request, key).await {
            Ok(txid) => SendOutcome::succeeded(txid),
            Err(e) => {
                warn!(chain = %request.chain, state = ?self.state, error = %e, "Send failed");
                SendOutcome::failed(&e, self.state)
            }
        }
    }
}

/// Send `request` signed by `key` through `indexer` and `relay`.
pub async fn send_transaction(
    request: &SendRequest,
    key: &ChainKey,
    indexer: &dyn ChainIndexer,
    relay: &BroadcastRelay,
) -> SendOutcome {
    SendPipeline::new(indexer, relay).execute(request, key).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bitcoin::absolute::LockTime;
    use bitcoin::consensus::encode::serialize_hex;
    use bitcoin::transaction::Version;
    use bitcoin::{Amount, Transaction, TxIn, TxOut};
    use cryptovault_core::error::NetworkError;
    use cryptovault_core::traits::BroadcastProvider;
    use cryptovault_core::types::{TxSummary, Utxo};
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;

    use crate::mnemonic::derive_seed;

    const ABANDON: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
    const LTC_ADDR: &str = "LUWPbpM43E2p7ZSh8cyTBEkvpHmr3cB8Ez";

    struct MockIndexer {
        utxos: Vec<Utxo>,
        raw: HashMap<String, String>,
    }

    #[async_trait]
    impl ChainIndexer for MockIndexer {
        fn chain(&self) -> Chain {
            Chain::Ltc
        }
        async fn utxos(&self, _: &str) -> Result<Vec<Utxo>, NetworkError> {
            Ok(self.utxos.clone())
        }
        async fn raw_transaction(&self, txid: &str) -> Result<String, NetworkError> {
            self.raw
                .get(txid)
                .cloned()
                .ok_or_else(|| NetworkError::Status { status: 404, body: "not found".into() })
        }
        async fn balance(&self, _: &str) -> Result<u128, NetworkError> {
            Ok(self.utxos.iter().map(|u| u.value as u128).sum())
        }
        async fn history(&self, _: &str, _: usize) -> Result<Vec<TxSummary>, NetworkError> {
            Ok(Vec::new())
        }
    }

    struct RecordingProvider {
        accept: bool,
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl BroadcastProvider for RecordingProvider {
        fn name(&self) -> &str {
            "recording"
        }
        async fn broadcast(&self, raw_hex: &str) -> Result<String, NetworkError> {
            self.seen.lock().push(raw_hex.to_string());
            if self.accept {
                let tx: Transaction = bitcoin::consensus::encode::deserialize_hex(raw_hex)
                    .map_err(|e| NetworkError::Rejected(e.to_string()))?;
                Ok(tx.compute_txid().to_string())
            } else {
                Err(NetworkError::Rejected("mempool full".into()))
            }
        }
    }

    fn key() -> ChainKey {
        ChainKey::derive(&derive_seed(ABANDON, "").unwrap(), Chain::Ltc).unwrap()
    }

    fn recipient() -> String {
        ChainKey::from_secret_bytes(Chain::Ltc, &[9u8; 32])
            .unwrap()
            .address()
            .unwrap()
    }

    fn funded(values: &[u64]) -> MockIndexer {
        let script = crate::builder::sender_script(Chain::Ltc, LTC_ADDR).unwrap();
        let prev = Transaction {
            version: Version::ONE,
            lock_time: LockTime::ZERO,
            input: vec![TxIn::default()],
            output: values
                .iter()
                .map(|v| TxOut {
                    value: Amount::from_sat(*v),
                    script_pubkey: script.clone(),
                })
                .collect(),
        };
        let txid = prev.compute_txid().to_string();
        let utxos = values
            .iter()
            .enumerate()
            .map(|(i, v)| Utxo {
                txid: txid.clone(),
                vout: i as u32,
                value: *v,
            })
            .collect();
        let mut raw = HashMap::new();
        raw.insert(txid, serialize_hex(&prev));
        MockIndexer { utxos, raw }
    }

    fn relay(accept: bool) -> (BroadcastRelay, Arc<RecordingProvider>) {
        let p = Arc::new(RecordingProvider {
            accept,
            seen: Mutex::new(Vec::new()),
        });
        (BroadcastRelay::new(Chain::Ltc, vec![p.clone()]), p)
    }

    #[tokio::test]
    async fn happy_path_broadcasts_signed_tx() {
        let indexer = funded(&[40_000, 40_000]);
        let (relay, provider) = relay(true);
        let req = SendRequest::new(Chain::Ltc, LTC_ADDR, recipient(), 50_000);
        let outcome = send_transaction(&req, &key(), &indexer, &relay).await;
        assert!(outcome.success, "{outcome:?}");
        assert_eq!(outcome.state, SendState::Broadcast);
        assert_eq!(outcome.txid.as_ref().unwrap().len(), 64);
        assert_eq!(provider.seen.lock().len(), 1);
    }

    #[tokio::test]
    async fn prepare_stops_at_signed() {
        let indexer = funded(&[100_000]);
        let (relay, provider) = relay(true);
        let req = SendRequest::new(Chain::Ltc, LTC_ADDR, recipient(), 50_000).with_fee(5_000);
        let mut pipeline = SendPipeline::new(&indexer, &relay);
        let signed = pipeline.prepare(&req, &key()).await.unwrap();
        assert_eq!(pipeline.state(), SendState::Signed);
        assert_eq!(signed.fee, 5_000);
        assert!(provider.seen.lock().is_empty());
    }

    #[tokio::test]
    async fn insufficient_funds_never_broadcasts() {
        let indexer = funded(&[20_000]);
        let (relay, provider) = relay(true);
        let req = SendRequest::new(Chain::Ltc, LTC_ADDR, recipient(), 50_000);
        let outcome = send_transaction(&req, &key(), &indexer, &relay).await;
        assert!(!outcome.success);
        assert_eq!(outcome.kind, Some(ErrorKind::InsufficientFunds));
        assert_eq!(outcome.state, SendState::UtxosFetched);
        assert!(provider.seen.lock().is_empty());
    }

    #[tokio::test]
    async fn wrong_key_fails_before_fetching() {
        let indexer = funded(&[100_000]);
        let (relay, provider) = relay(true);
        let req = SendRequest::new(Chain::Ltc, recipient(), LTC_ADDR, 50_000);
        let outcome = send_transaction(&req, &key(), &indexer, &relay).await;
        assert_eq!(outcome.kind, Some(ErrorKind::Validation));
        assert_eq!(outcome.state, SendState::Idle);
        assert!(provider.seen.lock().is_empty());
    }

    #[tokio::test]
    async fn lying_indexer_is_caught() {
        let mut indexer = funded(&[100_000]);
        indexer.utxos[0].value = 900_000;
        let (relay, provider) = relay(true);
        let req = SendRequest::new(Chain::Ltc, LTC_ADDR, recipient(), 500_000);
        let outcome = send_transaction(&req, &key(), &indexer, &relay).await;
        assert!(!outcome.success);
        assert_eq!(outcome.kind, Some(ErrorKind::Validation));
        assert!(outcome.error.unwrap().contains("previous transaction"));
        assert!(provider.seen.lock().is_empty());
    }

    #[tokio::test]
    async fn repeated_outpoint_never_signed() {
        let mut indexer = funded(&[60_000]);
        let again = indexer.utxos[0].clone();
        indexer.utxos.push(again);
        let (relay, provider) = relay(true);
        let req = SendRequest::new(Chain::Ltc, LTC_ADDR, recipient(), 100_000);
        let outcome = send_transaction(&req, &key(), &indexer, &relay).await;
        assert!(!outcome.success);
        assert_eq!(outcome.kind, Some(ErrorKind::Validation));
        assert_eq!(outcome.state, SendState::UtxosFetched);
        assert!(outcome.error.unwrap().contains("more than once"));
        assert!(provider.seen.lock().is_empty());
    }

    #[tokio::test]
    async fn malformed_txid_never_signed() {
        let mut indexer = funded(&[60_000]);
        indexer.utxos[0].txid = "not-a-txid".into();
        let (relay, provider) = relay(true);
        let req = SendRequest::new(Chain::Ltc, LTC_ADDR, recipient(), 10_000);
        let outcome = send_transaction(&req, &key(), &indexer, &relay).await;
        assert_eq!(outcome.kind, Some(ErrorKind::Validation));
        assert_eq!(outcome.state, SendState::UtxosFetched);
        assert!(provider.seen.lock().is_empty());
    }

    #[tokio::test]
    async fn relay_failure_reported_after_signing() {
        let indexer = funded(&[100_000]);
        let (relay, provider) = relay(false);
        let req = SendRequest::new(Chain::Ltc, LTC_ADDR, recipient(), 50_000);
        let outcome = send_transaction(&req, &key(), &indexer, &relay).await;
        assert!(!outcome.success);
        assert_eq!(outcome.kind, Some(ErrorKind::NetworkFailure));
        assert_eq!(outcome.state, SendState::Signed);
        assert!(outcome.error.unwrap().contains("mempool full"));
        assert_eq!(provider.seen.lock().len(), 1);
    }

    #[test]
    fn outcome_json_shape() {
        let ok = serde_json::to_value(SendOutcome::succeeded("ab")).unwrap();
        assert_eq!(ok["success"], true);
        assert_eq!(ok["txid"], "ab");
        assert!(ok.get("error").is_none());

        let failed = SendOutcome::failed(&WalletError::NoUtxos, SendState::UtxosFetched);
        let err = serde_json::to_value(failed).unwrap();
        assert_eq!(err["success"], false);
        assert_eq!(err["kind"], "insufficient_funds");
        assert_eq!(err["state"], "utxos_fetched");
    }
}
