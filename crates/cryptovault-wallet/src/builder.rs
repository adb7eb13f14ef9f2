//! Legacy P2PKH transaction builder and signer for the UTXO chains.
//!
//! Provides a builder pattern for constructing transactions:
//! 1. Add recipients (address + amount)
//! 2. Select inputs and build an unsigned transaction with optional change
//! 3. Sign every input with the sender's key (SIGHASH_ALL, pre-segwit)
//!
//! Bitcoin and Litecoin share the transaction format, so one builder serves
//! both; only the address version bytes differ.

use bitcoin::absolute::LockTime;
use bitcoin::consensus::encode::{deserialize_hex, serialize_hex};
use bitcoin::hashes::Hash;
use bitcoin::script::Builder;
use bitcoin::secp256k1::Message;
use bitcoin::sighash::{EcdsaSighashType, SighashCache};
use bitcoin::transaction::Version;
use bitcoin::{
    Amount, OutPoint, PubkeyHash, ScriptBuf, ScriptHash, Sequence, Transaction, TxIn, TxOut, Txid,
    Witness,
};
use std::collections::HashSet;
use std::str::FromStr;
use tracing::debug;

use cryptovault_core::address::{Destination, decode_destination};
use cryptovault_core::chain::{Chain, ChainKind};
use cryptovault_core::constants::DEFAULT_FLAT_FEE;
use cryptovault_core::error::CryptoError;
use cryptovault_core::types::Utxo;

use crate::coin_selection::{CoinSelection, CoinSelector, SelectionStrategy};
use crate::error::WalletError;
use crate::keys::{ChainKey, init_crypto_backend};

/// A payment output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub address: String,
    pub destination: Destination,
    /// Smallest unit.
    pub amount: u64,
}

/// A transaction whose inputs are not yet signed.
#[derive(Debug, Clone)]
pub struct UnsignedTransaction {
    pub chain: Chain,
    /// The transaction with empty script sigs.
    pub tx: Transaction,
    /// The coin selection result used to build this transaction.
    pub selection: CoinSelection,
    /// Source address; also receives change.
    pub from: String,
    /// P2PKH script of `from`, which every spent output must pay to.
    pub sender_script: ScriptBuf,
}

/// A fully signed transaction ready for broadcast.
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    pub chain: Chain,
    pub tx: Transaction,
    /// Canonical serialization, hex-encoded.
    pub raw_hex: String,
    pub txid: String,
    pub fee: u64,
}

/// Builder for constructing and signing legacy transactions.
///
/// # Example
/// ```ignore
/// let mut builder = TransactionBuilder::new(Chain::Ltc);
/// builder.add_recipient("Lrecipient...", 50_000)?.set_fee(10_000);
/// let selection = builder.select(&utxos)?;
/// let unsigned = builder.build(selection, &from_address)?;
/// let signed = TransactionBuilder::sign(unsigned, &key)?;
/// ```
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    chain: Chain,
    recipients: Vec<Recipient>,
    fee: u64,
    strategy: SelectionStrategy,
}

/// Output script for a decoded destination.
pub fn script_for(destination: &Destination) -> ScriptBuf {
    match destination {
        Destination::P2pkh(h) => ScriptBuf::new_p2pkh(&PubkeyHash::from_byte_array(*h)),
        Destination::P2sh(h) => ScriptBuf::new_p2sh(&ScriptHash::from_byte_array(*h)),
    }
}

/// P2PKH script for `address`, which must be a P2PKH address on `chain`.
pub fn sender_script(chain: Chain, address: &str) -> Result<ScriptBuf, WalletError> {
    match decode_destination(chain, address.trim())? {
        Destination::P2pkh(h) => Ok(ScriptBuf::new_p2pkh(&PubkeyHash::from_byte_array(h))),
        Destination::P2sh(_) => Err(WalletError::InvalidAddress(format!(
            "{address} is a script address and cannot be a sender"
        ))),
    }
}

impl TransactionBuilder {
    /// Create a builder with the default flat fee and accumulate selection.
    pub fn new(chain: Chain) -> Self {
        Self {
            chain,
            recipients: Vec::new(),
            fee: DEFAULT_FLAT_FEE,
            strategy: SelectionStrategy::default(),
        }
    }

    pub fn chain(&self) -> Chain {
        self.chain
    }

    pub fn fee(&self) -> u64 {
        self.fee
    }

    /// Add a recipient. The address must decode for this chain.
    pub fn add_recipient(&mut self, address: &str, amount: u64) -> Result<&mut Self, WalletError> {
        self.require_utxo_chain()?;
        if amount == 0 {
            return Err(WalletError::InvalidAmount("recipient amount is zero".into()));
        }
        let address = address.trim();
        let destination = decode_destination(self.chain, address)
            .map_err(|e| WalletError::InvalidAddress(format!("{address}: {e}")))?;
        self.recipients.push(Recipient {
            address: address.to_string(),
            destination,
            amount,
        });
        Ok(self)
    }

    /// Override the flat fee (default: [`DEFAULT_FLAT_FEE`]).
    pub fn set_fee(&mut self, fee: u64) -> &mut Self {
        self.fee = fee;
        self
    }

    pub fn set_strategy(&mut self, strategy: SelectionStrategy) -> &mut Self {
        self.strategy = strategy;
        self
    }

    pub fn recipients(&self) -> &[Recipient] {
        &self.recipients
    }

    /// Sum of all recipient amounts.
    pub fn total_amount(&self) -> Result<u64, WalletError> {
        if self.recipients.is_empty() {
            return Err(WalletError::BuildError("no recipients".into()));
        }
        self.recipients.iter().try_fold(0u64, |acc, r| {
            acc.checked_add(r.amount)
                .ok_or_else(|| WalletError::InvalidAmount("total amount overflow".into()))
        })
    }

    /// Pick inputs from `utxos` covering every recipient plus the fee.
    pub fn select(&self, utxos: &[Utxo]) -> Result<CoinSelection, WalletError> {
        self.require_utxo_chain()?;
        CoinSelector::select(utxos, self.total_amount()?, self.fee, self.strategy)
    }

    /// Build the unsigned transaction spending `selection` from `from`.
    ///
    /// Change, when non-zero, goes back to `from`.
    pub fn build(
        &self,
        selection: CoinSelection,
        from: &str,
    ) -> Result<UnsignedTransaction, WalletError> {
        self.require_utxo_chain()?;
        let total_send = self.total_amount()?;
        if selection.amount != total_send || selection.fee != self.fee {
            return Err(WalletError::BuildError(
                "selection does not match builder recipients or fee".into(),
            ));
        }
        let spent = total_send
            .checked_add(selection.fee)
            .and_then(|v| v.checked_add(selection.change))
            .ok_or_else(|| WalletError::InvalidAmount("amount overflow".into()))?;
        if spent != selection.total {
            return Err(WalletError::BuildError(format!(
                "inputs {} != outputs plus fee {spent}",
                selection.total
            )));
        }

        let from = from.trim();
        let sender_script = sender_script(self.chain, from)?;

        let mut inputs = Vec::with_capacity(selection.selected.len());
        let mut spent_outpoints = HashSet::with_capacity(selection.selected.len());
        for utxo in &selection.selected {
            let txid = Txid::from_str(utxo.txid.trim())
                .map_err(|e| WalletError::BuildError(format!("utxo {utxo}: {e}")))?;
            let outpoint = OutPoint::new(txid, utxo.vout);
            if !spent_outpoints.insert(outpoint) {
                return Err(WalletError::BuildError(format!("input {outpoint} spent twice")));
            }
            inputs.push(TxIn {
                previous_output: outpoint,
                script_sig: ScriptBuf::new(),
                sequence: Sequence::MAX,
                witness: Witness::default(),
            });
        }

        let mut outputs = Vec::with_capacity(self.recipients.len() + 1);
        for r in &self.recipients {
            outputs.push(TxOut {
                value: Amount::from_sat(r.amount),
                script_pubkey: script_for(&r.destination),
            });
        }
        if selection.change > 0 {
            outputs.push(TxOut {
                value: Amount::from_sat(selection.change),
                script_pubkey: sender_script.clone(),
            });
        }

        let tx = Transaction {
            version: Version::ONE,
            lock_time: LockTime::ZERO,
            input: inputs,
            output: outputs,
        };

        debug!(
            chain = %self.chain,
            inputs = tx.input.len(),
            outputs = tx.output.len(),
            fee = selection.fee,
            change = selection.change,
            "Unsigned transaction built"
        );

        Ok(UnsignedTransaction {
            chain: self.chain,
            tx,
            selection,
            from: from.to_string(),
            sender_script,
        })
    }

    /// Sign every input with `key`.
    ///
    /// The key must control `unsigned.from`; otherwise nothing is signed.
    /// Each signature is verified immediately and a failure aborts.
    pub fn sign(
        unsigned: UnsignedTransaction,
        key: &ChainKey,
    ) -> Result<SignedTransaction, WalletError> {
        if key.chain() != unsigned.chain {
            return Err(WalletError::BuildError(format!(
                "{} key cannot sign a {} transaction",
                key.chain(),
                unsigned.chain
            )));
        }
        check_ownership(key, &unsigned.from)?;

        let secp = init_crypto_backend();
        let public = bitcoin::PublicKey::new(*key.public_key());
        let mut tx = unsigned.tx;

        let mut script_sigs = Vec::with_capacity(tx.input.len());
        {
            let cache = SighashCache::new(&tx);
            for index in 0..tx.input.len() {
                let sighash = cache
                    .legacy_signature_hash(
                        index,
                        &unsigned.sender_script,
                        EcdsaSighashType::All.to_u32(),
                    )
                    .map_err(|e| CryptoError::Signing(e.to_string()))?;
                let msg = Message::from_digest(sighash.to_byte_array());
                let signature = secp.sign_ecdsa(&msg, key.secret_key());
                secp.verify_ecdsa(&msg, &signature, key.public_key())
                    .map_err(|_| CryptoError::SignatureSelfCheck { index })?;

                let sig = bitcoin::ecdsa::Signature {
                    signature,
                    sighash_type: EcdsaSighashType::All,
                };
                script_sigs.push(
                    Builder::new()
                        .push_slice(sig.serialize())
                        .push_key(&public)
                        .into_script(),
                );
            }
        }
        for (input, script_sig) in tx.input.iter_mut().zip(script_sigs) {
            input.script_sig = script_sig;
        }

        let outputs_total = tx
            .output
            .iter()
            .try_fold(0u64, |acc, o| acc.checked_add(o.value.to_sat()))
            .ok_or_else(|| WalletError::InvalidAmount("output overflow".into()))?;
        let fee = unsigned
            .selection
            .total
            .checked_sub(outputs_total)
            .ok_or_else(|| WalletError::BuildError("outputs exceed inputs".into()))?;

        let raw_hex = serialize_hex(&tx);
        let txid = tx.compute_txid().to_string();
        debug!(chain = %unsigned.chain, %txid, bytes = raw_hex.len() / 2, "Transaction signed");

        Ok(SignedTransaction {
            chain: unsigned.chain,
            tx,
            raw_hex,
            txid,
            fee,
        })
    }

    fn require_utxo_chain(&self) -> Result<(), WalletError> {
        match self.chain.kind() {
            ChainKind::Utxo => Ok(()),
            ChainKind::Account => Err(WalletError::Unsupported(format!(
                "{} transactions are not built by this wallet",
                self.chain
            ))),
        }
    }
}

/// Fail unless `key` derives exactly the `from` address.
pub fn check_ownership(key: &ChainKey, from: &str) -> Result<(), WalletError> {
    let derived = key.address()?;
    if derived != from.trim() {
        return Err(WalletError::KeyAddressMismatch {
            expected: from.trim().to_string(),
            derived,
        });
    }
    Ok(())
}

/// Check an indexer-supplied UTXO against the raw previous transaction.
///
/// The transaction must hash to the UTXO's txid and its output at `vout`
/// must carry the UTXO's value and pay to `expected_script`.
pub fn check_previous_output(
    utxo: &Utxo,
    raw_hex: &str,
    expected_script: &ScriptBuf,
) -> Result<(), WalletError> {
    let prev: Transaction = deserialize_hex(raw_hex.trim())
        .map_err(|e| WalletError::PreviousTransaction(format!("{}: undecodable: {e}", utxo.txid)))?;

    let txid = prev.compute_txid().to_string();
    if !txid.eq_ignore_ascii_case(utxo.txid.trim()) {
        return Err(WalletError::PreviousTransaction(format!(
            "txid mismatch: indexer {} but transaction hashes to {txid}",
            utxo.txid
        )));
    }
    let output = prev.output.get(utxo.vout as usize).ok_or_else(|| {
        WalletError::PreviousTransaction(format!(
            "{utxo}: transaction has only {} outputs",
            prev.output.len()
        ))
    })?;
    if output.value.to_sat() != utxo.value {
        return Err(WalletError::PreviousTransaction(format!(
            "{utxo}: value {} but indexer reported {}",
            output.value.to_sat(),
            utxo.value
        )));
    }
    if &output.script_pubkey != expected_script {
        return Err(WalletError::PreviousTransaction(format!(
            "{utxo}: output does not pay to the sender"
        )));
    }
    Ok(())
}
