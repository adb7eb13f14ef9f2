//! Explorer endpoints and HTTP settings.

use std::time::Duration;

/// Base URLs, API tokens and timeout for every explorer the wallet talks to.
#[derive(Clone)]
pub struct NetworkConfig {
    /// BlockCypher API root, without the coin segment.
    pub blockcypher_url: String,
    pub blockcypher_token: Option<String>,
    /// Etherscan `api` endpoint.
    pub etherscan_url: String,
    pub etherscan_api_key: Option<String>,
    /// SoChain v2 API root.
    pub sochain_url: String,
    /// LiteCore Insight API root.
    pub insight_url: String,
    /// chainz.cryptoid LTC API endpoint.
    pub chainz_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            blockcypher_url: "https://api.blockcypher.com/v1".to_string(),
            blockcypher_token: None,
            etherscan_url: "https://api.etherscan.io/api".to_string(),
            etherscan_api_key: None,
            sochain_url: "https://sochain.com/api/v2".to_string(),
            insight_url: "https://insight.litecore.io/api".to_string(),
            chainz_url: "https://chainz.cryptoid.info/ltc/api.dws".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl NetworkConfig {
    /// Mainnet preset.
    pub fn mainnet() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// Tokens are credentials; keep them out of logs.
impl std::fmt::Debug for NetworkConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |t: &Option<String>| t.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("NetworkConfig")
            .field("blockcypher_url", &self.blockcypher_url)
            .field("blockcypher_token", &redact(&self.blockcypher_token))
            .field("etherscan_url", &self.etherscan_url)
            .field("etherscan_api_key", &redact(&self.etherscan_api_key))
            .field("sochain_url", &self.sochain_url)
            .field("insight_url", &self.insight_url)
            .field("chainz_url", &self.chainz_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}
