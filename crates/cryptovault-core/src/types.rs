//! Plain data shared between the wallet, indexers and relay.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::chain::Chain;

/// An unspent output reported by an indexer.
///
/// Indexers are untrusted; the builder checks every UTXO against its
/// previous transaction before signing.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Utxo {
    /// Transaction id, big-endian hex as shown by explorers.
    pub txid: String,
    /// Output index within that transaction.
    pub vout: u32,
    /// Value in the smallest unit.
    pub value: u64,
}

impl fmt::Display for Utxo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.txid, self.vout)
    }
}

/// Confirmation state of a historical transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Confirmed,
    Pending,
    Failed,
}

/// One entry in an address history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxSummary {
    pub chain: Chain,
    pub hash: String,
    pub from: String,
    pub to: String,
    /// Value moved, smallest unit.
    pub value: u128,
    /// Fee paid, smallest unit.
    pub fee: u128,
    /// Unix seconds; `None` when the indexer omits it.
    pub timestamp: Option<i64>,
    pub status: TxStatus,
}

/// Result of a broadcast attempt across the relay's providers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub txid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BroadcastOutcome {
    pub fn accepted(txid: impl Into<String>) -> Self {
        Self {
            success: true,
            txid: Some(txid.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            txid: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utxo_display() {
        let u = Utxo {
            txid: "ab".repeat(32),
            vout: 3,
            value: 1,
        };
        assert!(u.to_string().ends_with(":3"));
    }

    #[test]
    fn broadcast_outcome_json_shape() {
        let ok = serde_json::to_value(BroadcastOutcome::accepted("deadbeef")).unwrap();
        assert_eq!(ok, serde_json::json!({"success": true, "txid": "deadbeef"}));

        let failed = serde_json::to_value(BroadcastOutcome::failed("boom")).unwrap();
        assert_eq!(failed, serde_json::json!({"success": false, "error": "boom"}));
    }

    #[test]
    fn tx_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&TxStatus::Pending).unwrap(),
            "\"pending\""
        );
    }
}
