//! # cryptovault-network: HTTP explorer clients.
//!
//! Implements [`cryptovault_core::traits::ChainIndexer`] over BlockCypher
//! (BTC, LTC) and Etherscan (ETH), and
//! [`cryptovault_core::traits::BroadcastProvider`] over the public push
//! endpoints. [`presets`] wires them into per-chain indexers and fallback
//! relays.
//!
//! Explorer responses are untrusted: missing fields default to zero or
//! empty and never panic.

pub mod blockcypher;
pub mod config;
pub mod etherscan;
pub mod http;
pub mod presets;
pub mod providers;

pub use blockcypher::{BlockCypherIndexer, BlockCypherProvider};
pub use config::NetworkConfig;
pub use etherscan::EtherscanIndexer;
pub use http::HttpClient;
pub use presets::{indexer_for, relay_for};
pub use providers::{ChainzProvider, InsightProvider, SoChainProvider};
