//! Per-chain indexer and relay wiring.
//!
//! | Chain | Indexer     | Relay (in order)                           |
//! |-------|-------------|--------------------------------------------|
//! | BTC   | BlockCypher | BlockCypher                                |
//! | LTC   | BlockCypher | SoChain, Insight, BlockCypher, chainz      |
//! | ETH   | Etherscan   | none: "Ethereum broadcasting not yet implemented" |

use std::sync::Arc;

use cryptovault_core::chain::Chain;
use cryptovault_core::error::NetworkError;
use cryptovault_core::relay::BroadcastRelay;
use cryptovault_core::traits::{BroadcastProvider, ChainIndexer};

use crate::blockcypher::{BlockCypherIndexer, BlockCypherProvider};
use crate::config::NetworkConfig;
use crate::etherscan::EtherscanIndexer;
use crate::http::HttpClient;
use crate::providers::{ChainzProvider, InsightProvider, SoChainProvider};

/// Reason the ETH relay gives for every broadcast.
pub const ETH_BROADCAST_UNSUPPORTED: &str = "Ethereum broadcasting not yet implemented";

/// The default indexer for `chain`.
pub fn indexer_for(
    chain: Chain,
    config: &NetworkConfig,
    http: &HttpClient,
) -> Result<Arc<dyn ChainIndexer>, NetworkError> {
    let indexer: Arc<dyn ChainIndexer> = match chain {
        Chain::Btc | Chain::Ltc => Arc::new(BlockCypherIndexer::new(chain, config, http.clone())?),
        Chain::Eth => Arc::new(EtherscanIndexer::new(config, http.clone())),
    };
    Ok(indexer)
}

/// The default broadcast fallback chain for `chain`.
pub fn relay_for(
    chain: Chain,
    config: &NetworkConfig,
    http: &HttpClient,
) -> Result<BroadcastRelay, NetworkError> {
    let providers: Vec<Arc<dyn BroadcastProvider>> = match chain {
        Chain::Btc => vec![Arc::new(BlockCypherProvider::new(chain, config, http.clone())?)],
        Chain::Ltc => vec![
            Arc::new(SoChainProvider::new(config, http.clone())),
            Arc::new(InsightProvider::new(config, http.clone())),
            Arc::new(BlockCypherProvider::new(chain, config, http.clone())?),
            Arc::new(ChainzProvider::new(config, http.clone())),
        ],
        Chain::Eth => return Ok(BroadcastRelay::unsupported(chain, ETH_BROADCAST_UNSUPPORTED)),
    };
    Ok(BroadcastRelay::new(chain, providers))
}
