//! Litecoin push endpoints used as broadcast fallbacks.
//!
//! Each provider makes exactly one request per call and reports the txid
//! the endpoint returns.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use cryptovault_core::error::NetworkError;
use cryptovault_core::traits::BroadcastProvider;

use crate::config::NetworkConfig;
use crate::http::{HttpClient, url_with_query};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SoChainResponse {
    status: String,
    message: Option<String>,
    data: Option<SoChainData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SoChainData {
    txid: String,
}

fn sochain_txid(body: SoChainResponse) -> Result<String, NetworkError> {
    match body.data {
        Some(data) if body.status == "success" && !data.txid.is_empty() => Ok(data.txid),
        _ => Err(NetworkError::Rejected(
            body.message.unwrap_or_else(|| "SoChain broadcast failed".into()),
        )),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct InsightResponse {
    txid: String,
}

fn insight_txid(body: InsightResponse) -> Result<String, NetworkError> {
    if body.txid.is_empty() {
        Err(NetworkError::Malformed("Insight response carried no txid".into()))
    } else {
        Ok(body.txid)
    }
}

/// chainz answers in plain text: the txid, or a message mentioning "error".
fn chainz_txid(text: &str) -> Result<String, NetworkError> {
    let trimmed = text.trim().trim_matches('"');
    if trimmed.is_empty() || trimmed.to_ascii_lowercase().contains("error") {
        Err(NetworkError::Rejected(trimmed.to_string()))
    } else {
        Ok(trimmed.to_string())
    }
}

/// SoChain v2 `send_tx/LTC`.
#[derive(Clone, Debug)]
pub struct SoChainProvider {
    http: HttpClient,
    url: String,
}

impl SoChainProvider {
    pub fn new(config: &NetworkConfig, http: HttpClient) -> Self {
        Self {
            http,
            url: format!("{}/send_tx/LTC", config.sochain_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl BroadcastProvider for SoChainProvider {
    fn name(&self) -> &str {
        "sochain"
    }

    async fn broadcast(&self, raw_hex: &str) -> Result<String, NetworkError> {
        let url = url_with_query(&self.url, &[])?;
        sochain_txid(self.http.post_json(url, &json!({ "tx_hex": raw_hex })).await?)
    }
}

/// LiteCore Insight `tx/send`, with high fees allowed.
#[derive(Clone, Debug)]
pub struct InsightProvider {
    http: HttpClient,
    url: String,
}

impl InsightProvider {
    pub fn new(config: &NetworkConfig, http: HttpClient) -> Self {
        Self {
            http,
            url: format!("{}/tx/send", config.insight_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl BroadcastProvider for InsightProvider {
    fn name(&self) -> &str {
        "insight"
    }

    async fn broadcast(&self, raw_hex: &str) -> Result<String, NetworkError> {
        let url = url_with_query(&self.url, &[])?;
        let payload = json!({ "rawtx": raw_hex, "allowHighFees": true });
        insight_txid(self.http.post_json(url, &payload).await?)
    }
}

/// chainz.cryptoid `pushtx`, form-encoded.
#[derive(Clone, Debug)]
pub struct ChainzProvider {
    http: HttpClient,
    url: String,
}

impl ChainzProvider {
    pub fn new(config: &NetworkConfig, http: HttpClient) -> Self {
        Self {
            http,
            url: config.chainz_url.clone(),
        }
    }
}

#[async_trait]
impl BroadcastProvider for ChainzProvider {
    fn name(&self) -> &str {
        "chainz"
    }

    async fn broadcast(&self, raw_hex: &str) -> Result<String, NetworkError> {
        let url = url_with_query(&self.url, &[("q", "pushtx")])?;
        // Raw transactions are plain hex, so the form body needs no escaping.
        if !raw_hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(NetworkError::Rejected("transaction is not hex".into()));
        }
        let text = self.http.post_form_text(url, format!("hex={raw_hex}")).await?;
        chainz_txid(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::decode_json;

    #[test]
    fn sochain_success_and_failure() {
        let ok: SoChainResponse =
            decode_json(r#"{"status":"success","data":{"network":"LTC","txid":"abc"}}"#).unwrap();
        assert_eq!(sochain_txid(ok).unwrap(), "abc");

        let body = r#"{"status":"fail","message":"bad-txns-inputs-missingorspent","data":{}}"#;
        let fail: SoChainResponse = decode_json(body).unwrap();
        assert_eq!(
            sochain_txid(fail).unwrap_err(),
            NetworkError::Rejected("bad-txns-inputs-missingorspent".into())
        );

        let empty: SoChainResponse = decode_json("{}").unwrap();
        assert!(sochain_txid(empty).is_err());
    }

    #[test]
    fn insight_requires_txid() {
        let ok: InsightResponse = decode_json(r#"{"txid":"def"}"#).unwrap();
        assert_eq!(insight_txid(ok).unwrap(), "def");
        let empty: InsightResponse = decode_json("{}").unwrap();
        assert!(matches!(insight_txid(empty), Err(NetworkError::Malformed(_))));
    }

    #[test]
    fn chainz_text_responses() {
        assert_eq!(chainz_txid("  \"0123abcd\"\n").unwrap(), "0123abcd");
        assert!(chainz_txid("Error: missing inputs").is_err());
        assert!(chainz_txid("tx rejected: error 16").is_err());
        assert!(chainz_txid("   ").is_err());
    }

    #[test]
    fn provider_urls() {
        let cfg = NetworkConfig::default();
        let http = HttpClient::new(cfg.timeout).unwrap();
        assert_eq!(
            SoChainProvider::new(&cfg, http.clone()).url,
            "https://sochain.com/api/v2/send_tx/LTC"
        );
        assert_eq!(
            InsightProvider::new(&cfg, http.clone()).url,
            "https://insight.litecore.io/api/tx/send"
        );
        assert_eq!(ChainzProvider::new(&cfg, http).name(), "chainz");
    }

    #[tokio::test]
    async fn chainz_refuses_non_hex_before_sending() {
        let cfg = NetworkConfig::default();
        let p = ChainzProvider::new(&cfg, HttpClient::new(cfg.timeout).unwrap());
        assert_eq!(
            p.broadcast("00&evil=1").await.unwrap_err(),
            NetworkError::Rejected("transaction is not hex".into())
        );
    }
}
