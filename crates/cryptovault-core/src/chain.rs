//! Supported chains and their fixed network parameters.
//!
//! [`Chain`] is a closed set. Everything keyed by chain goes through
//! [`PerChain`], so adding a chain forces every match and every per-chain
//! map in the workspace to be updated at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;
use zeroize::Zeroize;

use crate::error::AddressError;

/// Address model of a chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChainKind {
    /// Bitcoin-style unspent outputs, Base58Check P2PKH addresses.
    Utxo,
    /// Ethereum-style accounts, `0x` hex addresses.
    Account,
}

/// Version bytes for a UTXO chain.
#[derive(Debug, PartialEq, Eq)]
pub struct UtxoParams {
    /// P2PKH address version byte.
    pub p2pkh_version: u8,
    /// Accepted P2SH version bytes (first is the current one).
    pub p2sh_versions: &'static [u8],
    /// WIF private-key version byte.
    pub wif_version: u8,
    /// Bech32 human-readable prefix. Informational only; segwit outputs
    /// are not produced.
    pub bech32_hrp: &'static str,
}

/// Fixed per-chain parameters.
#[derive(Debug, PartialEq, Eq)]
pub struct ChainParams {
    /// Display name.
    pub name: &'static str,
    /// BIP-44 coin type.
    pub coin_type: u32,
    /// Full BIP-44 derivation path of the wallet's single key.
    pub derivation_path: &'static str,
    /// Number of decimals of the smallest unit.
    pub decimals: u32,
    /// Present for UTXO chains.
    pub utxo: Option<UtxoParams>,
}

pub const BITCOIN: ChainParams = ChainParams {
    name: "Bitcoin",
    coin_type: 0,
    derivation_path: "m/44'/0'/0'/0/0",
    decimals: 8,
    utxo: Some(UtxoParams {
        p2pkh_version: 0x00,
        p2sh_versions: &[0x05],
        wif_version: 0x80,
        bech32_hrp: "bc",
    }),
};

pub const LITECOIN: ChainParams = ChainParams {
    name: "Litecoin",
    coin_type: 2,
    derivation_path: "m/44'/2'/0'/0/0",
    decimals: 8,
    utxo: Some(UtxoParams {
        p2pkh_version: 0x30,
        // 0x05 is the legacy P2SH prefix still accepted by Litecoin wallets.
        p2sh_versions: &[0x32, 0x05],
        wif_version: 0xB0,
        bech32_hrp: "ltc",
    }),
};

pub const ETHEREUM: ChainParams = ChainParams {
    name: "Ethereum",
    coin_type: 60,
    derivation_path: "m/44'/60'/0'/0/0",
    decimals: 18,
    utxo: None,
};

/// A supported chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Btc,
    Ltc,
    Eth,
}

impl Chain {
    /// Every supported chain, in display order.
    pub const ALL: [Chain; 3] = [Chain::Btc, Chain::Ltc, Chain::Eth];

    /// Ticker symbol (`BTC`, `LTC`, `ETH`).
    pub fn symbol(&self) -> &'static str {
        match self {
            Chain::Btc => "BTC",
            Chain::Ltc => "LTC",
            Chain::Eth => "ETH",
        }
    }

    /// Fixed network parameters.
    pub fn params(&self) -> &'static ChainParams {
        match self {
            Chain::Btc => &BITCOIN,
            Chain::Ltc => &LITECOIN,
            Chain::Eth => &ETHEREUM,
        }
    }

    pub fn kind(&self) -> ChainKind {
        match self {
            Chain::Btc | Chain::Ltc => ChainKind::Utxo,
            Chain::Eth => ChainKind::Account,
        }
    }

    /// UTXO version bytes, or an error for account chains.
    pub fn utxo_params(&self) -> Result<&'static UtxoParams, AddressError> {
        self.params()
            .utxo
            .as_ref()
            .ok_or_else(|| AddressError::NotUtxoChain(self.symbol().to_string()))
    }

    pub fn derivation_path(&self) -> &'static str {
        self.params().derivation_path
    }

    pub fn decimals(&self) -> u32 {
        self.params().decimals
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.symbol())
    }
}

impl FromStr for Chain {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "btc" | "bitcoin" => Ok(Chain::Btc),
            "ltc" | "litecoin" => Ok(Chain::Ltc),
            "eth" | "ethereum" => Ok(Chain::Eth),
            _ => Err(AddressError::UnknownChain(s.to_string())),
        }
    }
}

/// One value per supported chain.
///
/// Serializes as `{"btc": .., "ltc": .., "eth": ..}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PerChain<T> {
    pub btc: T,
    pub ltc: T,
    pub eth: T,
}

impl<T> PerChain<T> {
    /// Build a map by evaluating `f` for every chain.
    pub fn from_fn(mut f: impl FnMut(Chain) -> T) -> Self {
        Self {
            btc: f(Chain::Btc),
            ltc: f(Chain::Ltc),
            eth: f(Chain::Eth),
        }
    }

    /// Fallible variant of [`from_fn`](Self::from_fn); stops at the first error.
    pub fn try_from_fn<E>(mut f: impl FnMut(Chain) -> Result<T, E>) -> Result<Self, E> {
        Ok(Self {
            btc: f(Chain::Btc)?,
            ltc: f(Chain::Ltc)?,
            eth: f(Chain::Eth)?,
        })
    }

    pub fn get(&self, chain: Chain) -> &T {
        match chain {
            Chain::Btc => &self.btc,
            Chain::Ltc => &self.ltc,
            Chain::Eth => &self.eth,
        }
    }

    pub fn get_mut(&mut self, chain: Chain) -> &mut T {
        match chain {
            Chain::Btc => &mut self.btc,
            Chain::Ltc => &mut self.ltc,
            Chain::Eth => &mut self.eth,
        }
    }

    /// Iterate `(chain, value)` pairs in [`Chain::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (Chain, &T)> {
        Chain::ALL.into_iter().map(move |c| (c, self.get(c)))
    }

    pub fn map<U>(&self, mut f: impl FnMut(Chain, &T) -> U) -> PerChain<U> {
        PerChain::from_fn(|c| f(c, self.get(c)))
    }
}

impl<T> Index<Chain> for PerChain<T> {
    type Output = T;

    fn index(&self, chain: Chain) -> &T {
        self.get(chain)
    }
}

impl<T> IndexMut<Chain> for PerChain<T> {
    fn index_mut(&mut self, chain: Chain) -> &mut T {
        self.get_mut(chain)
    }
}

impl<T: Zeroize> Zeroize for PerChain<T> {
    fn zeroize(&mut self) {
        self.btc.zeroize();
        self.ltc.zeroize();
        self.eth.zeroize();
    }
}
