//! BlockCypher explorer adapter for Bitcoin and Litecoin.
//!
//! Endpoints under `{base}/{coin}/main`:
//! - `addrs/{address}?unspentOnly=true&limit=50`: spendable outputs
//! - `txs/{txid}?includeHex=true`: raw previous transaction
//! - `addrs/{address}/balance`: confirmed balance
//! - `addrs/{address}/full?limit=N`: recent transactions
//! - `txs/push`: broadcast

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use cryptovault_core::chain::Chain;
use cryptovault_core::error::NetworkError;
use cryptovault_core::traits::{BroadcastProvider, ChainIndexer};
use cryptovault_core::types::{TxStatus, TxSummary, Utxo};

use crate::config::NetworkConfig;
use crate::http::{HttpClient, url_with_query};

/// Cap on outputs requested per UTXO query.
const UTXO_LIMIT: &str = "50";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AddressUtxos {
    txrefs: Vec<TxRef>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TxRef {
    tx_hash: String,
    /// -1 for input refs.
    tx_output_n: i64,
    value: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawTx {
    hex: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AddressBalance {
    balance: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AddressFull {
    txs: Vec<FullTx>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FullTx {
    hash: String,
    inputs: Vec<Endpoint>,
    outputs: Vec<FullOutput>,
    confirmed: Option<String>,
    received: Option<String>,
    confirmations: u64,
    fees: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Endpoint {
    addresses: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FullOutput {
    addresses: Option<Vec<String>>,
    value: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PushResponse {
    tx: Option<PushedTx>,
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PushedTx {
    hash: String,
}

fn first_address(list: &Option<Vec<String>>) -> String {
    list.as_ref()
        .and_then(|a| a.first())
        .cloned()
        .unwrap_or_default()
}

fn parse_timestamp(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.timestamp())
}

fn utxos_from(body: AddressUtxos) -> Vec<Utxo> {
    body.txrefs
        .into_iter()
        .filter(|r| !r.tx_hash.is_empty() && r.tx_output_n >= 0)
        .filter_map(|r| {
            u32::try_from(r.tx_output_n).ok().map(|vout| Utxo {
                txid: r.tx_hash,
                vout,
                value: r.value,
            })
        })
        .collect()
}

fn history_from(chain: Chain, body: AddressFull, limit: usize) -> Vec<TxSummary> {
    body.txs
        .into_iter()
        .take(limit)
        .map(|tx| {
            let first_out = tx.outputs.first();
            let status = if tx.confirmed.is_some() || tx.confirmations > 0 {
                TxStatus::Confirmed
            } else {
                TxStatus::Pending
            };
            TxSummary {
                chain,
                hash: tx.hash,
                from: tx.inputs.first().map(|i| first_address(&i.addresses)).unwrap_or_default(),
                to: first_out.map(|o| first_address(&o.addresses)).unwrap_or_default(),
                value: first_out.map(|o| o.value as u128).unwrap_or(0),
                fee: tx.fees as u128,
                timestamp: parse_timestamp(tx.confirmed.as_deref().or(tx.received.as_deref())),
                status,
            }
        })
        .collect()
}

fn pushed_txid(body: PushResponse) -> Result<String, NetworkError> {
    match body.tx {
        Some(tx) if !tx.hash.is_empty() => Ok(tx.hash),
        _ => Err(NetworkError::Rejected(
            body.error.unwrap_or_else(|| "response carried no tx hash".into()),
        )),
    }
}

/// `btc/main` or `ltc/main`.
fn coin_path(chain: Chain) -> Result<&'static str, NetworkError> {
    match chain {
        Chain::Btc => Ok("btc/main"),
        Chain::Ltc => Ok("ltc/main"),
        Chain::Eth => Err(NetworkError::Unsupported(format!(
            "BlockCypher adapter does not serve {chain}"
        ))),
    }
}

/// Shared base URL and token handling for the indexer and push provider.
#[derive(Clone)]
struct Api {
    http: HttpClient,
    root: String,
    token: Option<String>,
}

impl Api {
    fn new(chain: Chain, config: &NetworkConfig, http: HttpClient) -> Result<Self, NetworkError> {
        Ok(Self {
            http,
            root: format!("{}/{}", config.blockcypher_url.trim_end_matches('/'), coin_path(chain)?),
            token: config.blockcypher_token.clone(),
        })
    }

    fn url(&self, path: &str, query: &[(&str, &str)]) -> Result<reqwest::Url, NetworkError> {
        let mut params: Vec<(&str, &str)> = query.to_vec();
        if let Some(token) = &self.token {
            params.push(("token", token.as_str()));
        }
        url_with_query(&format!("{}/{path}", self.root), &params)
    }
}

impl std::fmt::Debug for Api {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Api")
            .field("root", &self.root)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// [`ChainIndexer`] over BlockCypher.
#[derive(Clone, Debug)]
pub struct BlockCypherIndexer {
    chain: Chain,
    api: Api,
}

impl BlockCypherIndexer {
    /// Errors with `Unsupported` for chains BlockCypher is not wired for.
    pub fn new(
        chain: Chain,
        config: &NetworkConfig,
        http: HttpClient,
    ) -> Result<Self, NetworkError> {
        Ok(Self {
            chain,
            api: Api::new(chain, config, http)?,
        })
    }
}

#[async_trait]
impl ChainIndexer for BlockCypherIndexer {
    fn chain(&self) -> Chain {
        self.chain
    }

    async fn utxos(&self, address: &str) -> Result<Vec<Utxo>, NetworkError> {
        let url = self.api.url(
            &format!("addrs/{address}"),
            &[("unspentOnly", "true"), ("limit", UTXO_LIMIT)],
        )?;
        let utxos = utxos_from(self.api.http.get_json(url).await?);
        debug!(chain = %self.chain, address, count = utxos.len(), "UTXOs fetched");
        Ok(utxos)
    }

    async fn raw_transaction(&self, txid: &str) -> Result<String, NetworkError> {
        let url = self.api.url(&format!("txs/{txid}"), &[("includeHex", "true")])?;
        let body: RawTx = self.api.http.get_json(url).await?;
        if body.hex.is_empty() {
            return Err(NetworkError::Malformed(format!("no hex for transaction {txid}")));
        }
        Ok(body.hex)
    }

    async fn balance(&self, address: &str) -> Result<u128, NetworkError> {
        let url = self.api.url(&format!("addrs/{address}/balance"), &[])?;
        let body: AddressBalance = self.api.http.get_json(url).await?;
        Ok(body.balance as u128)
    }

    async fn history(&self, address: &str, limit: usize) -> Result<Vec<TxSummary>, NetworkError> {
        let limit_str = limit.to_string();
        let url = self.api.url(&format!("addrs/{address}/full"), &[("limit", limit_str.as_str())])?;
        Ok(history_from(self.chain, self.api.http.get_json(url).await?, limit))
    }
}

/// BlockCypher `txs/push` broadcast endpoint.
#[derive(Clone, Debug)]
pub struct BlockCypherProvider {
    api: Api,
}

impl BlockCypherProvider {
    pub fn new(
        chain: Chain,
        config: &NetworkConfig,
        http: HttpClient,
    ) -> Result<Self, NetworkError> {
        Ok(Self {
            api: Api::new(chain, config, http)?,
        })
    }
}

#[async_trait]
impl BroadcastProvider for BlockCypherProvider {
    fn name(&self) -> &str {
        "blockcypher"
    }

    async fn broadcast(&self, raw_hex: &str) -> Result<String, NetworkError> {
        let url = self.api.url("txs/push", &[])?;
        pushed_txid(self.api.http.post_json(url, &json!({ "tx": raw_hex })).await?)
    }
}
