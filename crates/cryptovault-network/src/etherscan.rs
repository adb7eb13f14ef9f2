//! Etherscan adapter for Ethereum balance and history.
//!
//! Ethereum is an account chain; UTXO queries are unsupported.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use cryptovault_core::chain::Chain;
use cryptovault_core::error::NetworkError;
use cryptovault_core::traits::ChainIndexer;
use cryptovault_core::types::{TxStatus, TxSummary, Utxo};

use crate::config::NetworkConfig;
use crate::http::{HttpClient, url_with_query};

/// Etherscan envelope: `status` is `"1"` on success, `result` is the payload
/// or an error string.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Envelope {
    status: String,
    message: String,
    result: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct EthTx {
    hash: String,
    from: String,
    to: String,
    value: String,
    time_stamp: String,
    is_error: String,
    gas_used: String,
    gas_price: String,
}

fn parse_u128(s: &str) -> u128 {
    s.trim().parse().unwrap_or(0)
}

/// Unwrap the envelope; "No transactions found" is an empty success.
fn payload(env: Envelope) -> Result<Value, NetworkError> {
    if env.status == "1" {
        return Ok(env.result);
    }
    if env.message.starts_with("No transactions found") {
        return Ok(Value::Array(Vec::new()));
    }
    let detail = match &env.result {
        Value::String(s) if !s.is_empty() => s.clone(),
        _ => env.message,
    };
    Err(NetworkError::Rejected(detail))
}

fn balance_from(env: Envelope) -> Result<u128, NetworkError> {
    match payload(env)? {
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| NetworkError::Malformed(format!("balance {s:?} is not an integer"))),
        Value::Number(n) => n
            .as_u64()
            .map(u128::from)
            .ok_or_else(|| NetworkError::Malformed(format!("balance {n} is not an integer"))),
        other => Err(NetworkError::Malformed(format!("unexpected balance payload: {other}"))),
    }
}

fn history_from(env: Envelope, limit: usize) -> Result<Vec<TxSummary>, NetworkError> {
    let txs: Vec<EthTx> = match payload(env)? {
        Value::Array(items) => items
            .into_iter()
            .map(|v| serde_json::from_value(v).unwrap_or_default())
            .collect(),
        other => {
            return Err(NetworkError::Malformed(format!(
                "unexpected history payload: {other}"
            )));
        }
    };
    Ok(txs
        .into_iter()
        .take(limit)
        .map(|tx| TxSummary {
            chain: Chain::Eth,
            fee: parse_u128(&tx.gas_used).saturating_mul(parse_u128(&tx.gas_price)),
            value: parse_u128(&tx.value),
            timestamp: tx.time_stamp.trim().parse().ok(),
            status: if tx.is_error == "1" {
                TxStatus::Failed
            } else {
                TxStatus::Confirmed
            },
            hash: tx.hash,
            from: tx.from,
            to: tx.to,
        })
        .collect())
}

/// [`ChainIndexer`] for Ethereum over the Etherscan account API.
#[derive(Clone)]
pub struct EtherscanIndexer {
    http: HttpClient,
    url: String,
    api_key: Option<String>,
}

impl EtherscanIndexer {
    pub fn new(config: &NetworkConfig, http: HttpClient) -> Self {
        Self {
            http,
            url: config.etherscan_url.clone(),
            api_key: config.etherscan_api_key.clone(),
        }
    }

    async fn account_query(&self, params: &[(&str, &str)]) -> Result<Envelope, NetworkError> {
        let mut query: Vec<(&str, &str)> = vec![("module", "account")];
        query.extend_from_slice(params);
        if let Some(key) = &self.api_key {
            query.push(("apikey", key.as_str()));
        }
        self.http.get_json(url_with_query(&self.url, &query)?).await
    }
}

impl std::fmt::Debug for EtherscanIndexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EtherscanIndexer")
            .field("url", &self.url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[async_trait]
impl ChainIndexer for EtherscanIndexer {
    fn chain(&self) -> Chain {
        Chain::Eth
    }

    async fn utxos(&self, _address: &str) -> Result<Vec<Utxo>, NetworkError> {
        Err(NetworkError::Unsupported("Ethereum has no UTXOs".into()))
    }

    async fn raw_transaction(&self, _txid: &str) -> Result<String, NetworkError> {
        Err(NetworkError::Unsupported("raw transactions are not fetched for Ethereum".into()))
    }

    async fn balance(&self, address: &str) -> Result<u128, NetworkError> {
        let env = self
            .account_query(&[("action", "balance"), ("address", address), ("tag", "latest")])
            .await?;
        balance_from(env)
    }

    async fn history(&self, address: &str, limit: usize) -> Result<Vec<TxSummary>, NetworkError> {
        let offset = limit.to_string();
        let env = self
            .account_query(&[
                ("action", "txlist"),
                ("address", address),
                ("startblock", "0"),
                ("endblock", "99999999"),
                ("page", "1"),
                ("offset", offset.as_str()),
                ("sort", "desc"),
            ])
            .await?;
        history_from(env, limit)
    }
}
