//! CLI configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use cryptovault_core::constants::{DEFAULT_FLAT_FEE, MIN_PBKDF2_ITERATIONS};
use cryptovault_network::NetworkConfig;
use cryptovault_wallet::FileStore;

#[derive(Clone, Debug)]
pub struct Config {
    /// Directory holding the encrypted wallet.
    pub vault_dir: PathBuf,
    /// Broadcast real transactions instead of simulating them.
    pub enable_real_tx: bool,
    /// Explorer endpoints, tokens and HTTP timeout.
    pub network: NetworkConfig,
    /// Flat fee for Bitcoin sends, in satoshis.
    pub btc_fee: u64,
    /// Flat fee for Litecoin sends, in litoshis.
    pub ltc_fee: u64,
    /// PBKDF2 rounds used when saving the wallet.
    pub pbkdf2_iterations: u32,
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => bail!("{name} must be a boolean, got {other:?}"),
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let vault_dir = lookup("CRYPTOVAULT_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(FileStore::default_dir);

        let enable_real_tx = match lookup("CRYPTOVAULT_ENABLE_REAL_TX") {
            Some(v) => parse_bool("CRYPTOVAULT_ENABLE_REAL_TX", &v)?,
            None => false,
        };

        let mut network = NetworkConfig::mainnet();
        if let Some(url) = lookup("CRYPTOVAULT_BLOCKCYPHER_URL") {
            network.blockcypher_url = url;
        }
        network.blockcypher_token =
            lookup("CRYPTOVAULT_BLOCKCYPHER_TOKEN").filter(|t| !t.is_empty());
        if let Some(url) = lookup("CRYPTOVAULT_ETHERSCAN_URL") {
            network.etherscan_url = url;
        }
        network.etherscan_api_key =
            lookup("CRYPTOVAULT_ETHERSCAN_API_KEY").filter(|t| !t.is_empty());

        if let Some(secs) = lookup("CRYPTOVAULT_HTTP_TIMEOUT_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .context("CRYPTOVAULT_HTTP_TIMEOUT_SECS must be a positive integer")?;
            if secs == 0 {
                bail!("CRYPTOVAULT_HTTP_TIMEOUT_SECS must be a positive integer");
            }
            network = network.with_timeout(Duration::from_secs(secs));
        }

        let btc_fee: u64 = lookup("CRYPTOVAULT_BTC_FEE")
            .unwrap_or_else(|| DEFAULT_FLAT_FEE.to_string())
            .trim()
            .parse()
            .context("CRYPTOVAULT_BTC_FEE must be an integer number of satoshis")?;

        let ltc_fee: u64 = lookup("CRYPTOVAULT_LTC_FEE")
            .unwrap_or_else(|| DEFAULT_FLAT_FEE.to_string())
            .trim()
            .parse()
            .context("CRYPTOVAULT_LTC_FEE must be an integer number of litoshis")?;

        let pbkdf2_iterations: u32 = lookup("CRYPTOVAULT_PBKDF2_ITERATIONS")
            .unwrap_or_else(|| MIN_PBKDF2_ITERATIONS.to_string())
            .trim()
            .parse()
            .context("CRYPTOVAULT_PBKDF2_ITERATIONS must be a positive integer")?;
        if pbkdf2_iterations < MIN_PBKDF2_ITERATIONS {
            bail!("CRYPTOVAULT_PBKDF2_ITERATIONS must be at least {MIN_PBKDF2_ITERATIONS}");
        }

        Ok(Config {
            vault_dir,
            enable_real_tx,
            network,
            btc_fee,
            ltc_fee,
            pbkdf2_iterations,
        })
    }
}
