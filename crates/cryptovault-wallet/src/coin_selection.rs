//! UTXO input selection.
//!
//! Outputs are considered in the order the indexer returned them. The
//! default [`SelectionStrategy::Accumulate`] keeps adding outputs until the
//! amount plus the flat fee is covered; [`SelectionStrategy::FirstOnly`]
//! spends the first output alone.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use cryptovault_core::types::Utxo;

use crate::error::WalletError;

/// How inputs are picked from the indexer's UTXO list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    /// Accumulate outputs in order until the target is covered.
    #[default]
    Accumulate,
    /// Spend only the first output; fail if it cannot cover the target.
    FirstOnly,
}

/// Inputs chosen for a send, with the fee and change breakdown.
///
/// `total == amount + fee + change` always holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinSelection {
    pub selected: Vec<Utxo>,
    /// Sum of the selected outputs.
    pub total: u64,
    /// Amount paid to the recipient.
    pub amount: u64,
    pub fee: u64,
    /// Returned to the sender; zero means no change output.
    pub change: u64,
}

pub struct CoinSelector;

/// Reject indexer UTXO lists with malformed txids or repeated outpoints.
///
/// A repeated `txid:vout` would be counted, and spent, twice.
pub fn check_utxo_set(utxos: &[Utxo]) -> Result<(), WalletError> {
    let mut seen = HashSet::with_capacity(utxos.len());
    for utxo in utxos {
        let txid = utxo.txid.trim();
        if txid.len() != 64 || !txid.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(WalletError::PreviousTransaction(format!(
                "{utxo}: txid is not 64 hex characters"
            )));
        }
        if !seen.insert((txid.to_ascii_lowercase(), utxo.vout)) {
            return Err(WalletError::PreviousTransaction(format!(
                "{utxo}: outpoint listed more than once"
            )));
        }
    }
    Ok(())
}

impl CoinSelector {
    /// Select inputs covering `amount + fee`.
    ///
    /// Errors: `NoUtxos` on an empty list, `PreviousTransaction` for a
    /// malformed list (see [`check_utxo_set`]), `InvalidAmount` for a zero
    /// amount or an overflowing target, `InsufficientFunds` when the
    /// strategy cannot reach the target.
    pub fn select(
        utxos: &[Utxo],
        amount: u64,
        fee: u64,
        strategy: SelectionStrategy,
    ) -> Result<CoinSelection, WalletError> {
        if utxos.is_empty() {
            return Err(WalletError::NoUtxos);
        }
        check_utxo_set(utxos)?;
        if amount == 0 {
            return Err(WalletError::InvalidAmount("amount must be non-zero".into()));
        }
        let need = amount
            .checked_add(fee)
            .ok_or_else(|| WalletError::InvalidAmount("amount plus fee overflows".into()))?;

        let candidates = match strategy {
            SelectionStrategy::Accumulate => utxos,
            SelectionStrategy::FirstOnly => &utxos[..1],
        };

        let mut selected = Vec::new();
        let mut total: u64 = 0;
        for utxo in candidates {
            selected.push(utxo.clone());
            total = total.saturating_add(utxo.value);
            if total >= need {
                return Ok(CoinSelection {
                    selected,
                    total,
                    amount,
                    fee,
                    change: total - need,
                });
            }
        }

        Err(WalletError::InsufficientFunds { have: total, need })
    }
}
