//! Shared fixtures: the reference phrase, mock indexers and providers.

use std::collections::HashMap;

use async_trait::async_trait;
use bitcoin::absolute::LockTime;
use bitcoin::consensus::encode::{deserialize_hex, serialize_hex};
use bitcoin::transaction::Version;
use bitcoin::{Amount, Transaction, TxIn, TxOut};
use parking_lot::Mutex;

use cryptovault_core::chain::Chain;
use cryptovault_core::error::NetworkError;
use cryptovault_core::traits::{BroadcastProvider, ChainIndexer};
use cryptovault_core::types::{TxStatus, TxSummary, Utxo};
use cryptovault_wallet::builder::sender_script;

/// The all-zero-entropy BIP-39 phrase.
pub const ABANDON: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

pub const BTC_ADDR: &str = "1LqBGSKuX5yYUonjxT5qGfpUsXKYYWeabA";
pub const LTC_ADDR: &str = "LUWPbpM43E2p7ZSh8cyTBEkvpHmr3cB8Ez";
pub const ETH_ADDR: &str = "0x9858EfFD232B4033E47d90003D41EC34EcaEda94";

/// Decode a broadcast payload.
pub fn decode_tx(raw_hex: &str) -> Transaction {
    deserialize_hex(raw_hex).expect("broadcast payload is a transaction")
}

/// Serves a fixed UTXO set and the raw transactions that fund it.
pub struct MockIndexer {
    pub chain: Chain,
    pub utxos: Vec<Utxo>,
    pub raw: HashMap<String, String>,
    pub history: Vec<TxSummary>,
    pub utxo_calls: Mutex<usize>,
}

impl MockIndexer {
    pub fn empty(chain: Chain) -> Self {
        Self {
            chain,
            utxos: Vec::new(),
            raw: HashMap::new(),
            history: Vec::new(),
            utxo_calls: Mutex::new(0),
        }
    }

    /// One previous transaction paying `values` to `owner`, one output each.
    pub fn funded(chain: Chain, owner: &str, values: &[u64]) -> Self {
        let script = sender_script(chain, owner).expect("owner is a P2PKH address");
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
        let mut indexer = Self::empty(chain);
        indexer.utxos = values
            .iter()
            .enumerate()
            .map(|(i, v)| Utxo {
                txid: txid.clone(),
                vout: i as u32,
                value: *v,
            })
            .collect();
        indexer.raw.insert(txid.clone(), serialize_hex(&prev));
        indexer.history.push(TxSummary {
            chain,
            hash: txid,
            from: String::new(),
            to: owner.to_string(),
            value: values.iter().map(|v| *v as u128).sum(),
            fee: 0,
            timestamp: Some(1_700_000_000),
            status: TxStatus::Confirmed,
        });
        indexer
    }
}

#[async_trait]
impl ChainIndexer for MockIndexer {
    fn chain(&self) -> Chain {
        self.chain
    }

    async fn utxos(&self, _address: &str) -> Result<Vec<Utxo>, NetworkError> {
        *self.utxo_calls.lock() += 1;
        Ok(self.utxos.clone())
    }

    async fn raw_transaction(&self, txid: &str) -> Result<String, NetworkError> {
        self.raw.get(txid).cloned().ok_or_else(|| NetworkError::Status {
            status: 404,
            body: format!("{txid} not found"),
        })
    }

    async fn balance(&self, _address: &str) -> Result<u128, NetworkError> {
        Ok(self.utxos.iter().map(|u| u.value as u128).sum())
    }

    async fn history(&self, _address: &str, limit: usize) -> Result<Vec<TxSummary>, NetworkError> {
        Ok(self.history.iter().take(limit).cloned().collect())
    }
}

/// Broadcast endpoint that either accepts (returning the real txid) or
/// rejects every payload, recording what it saw.
pub struct ScriptedProvider {
    pub name: &'static str,
    pub reject_with: Option<NetworkError>,
    pub seen: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn accepting(name: &'static str) -> Self {
        Self {
            name,
            reject_with: None,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn rejecting(name: &'static str, error: NetworkError) -> Self {
        Self {
            name,
            reject_with: Some(error),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().len()
    }
}

#[async_trait]
impl BroadcastProvider for ScriptedProvider {
    fn name(&self) -> &str {
        self.name
    }

    async fn broadcast(&self, raw_hex: &str) -> Result<String, NetworkError> {
        self.seen.lock().push(raw_hex.to_string());
        match &self.reject_with {
            Some(e) => Err(e.clone()),
            None => {
                let tx: Transaction = deserialize_hex(raw_hex)
                    .map_err(|e| NetworkError::Rejected(e.to_string()))?;
                Ok(tx.compute_txid().to_string())
            }
        }
    }
}
