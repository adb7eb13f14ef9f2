//! Property tests over the wallet cipher, address codec and builder.

use proptest::prelude::*;

use cryptovault_core::address::{decode_p2pkh, encode_p2pkh};
use cryptovault_core::chain::Chain;
use cryptovault_core::crypto::hash160;
use cryptovault_core::types::Utxo;
use cryptovault_tests::helpers::ABANDON;
use cryptovault_wallet::{
    ChainKey, ErrorKind, TransactionBuilder, WalletError, WalletRecord, decrypt, encrypt,
};

fn utxos(values: &[u64]) -> Vec<Utxo> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| Utxo {
            txid: format!("{:064x}", i + 1),
            vout: i as u32,
            value: *v,
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn decrypt_inverts_encrypt(password in "[ -~]{1,40}") {
        let record = WalletRecord::from_mnemonic(ABANDON).unwrap();
        let sealed = encrypt(&record, &password, 10_000).unwrap();
        prop_assert_eq!(decrypt(&sealed, &password), Some(record));
    }

    #[test]
    fn other_password_fails(password in "[a-z]{8,16}", suffix in "[0-9]{1,4}") {
        let record = WalletRecord::from_mnemonic(ABANDON).unwrap();
        let sealed = encrypt(&record, &password, 10_000).unwrap();
        let wrong = format!("{password}{suffix}");
        prop_assert_eq!(decrypt(&sealed, &wrong), None);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn p2pkh_roundtrip(
        pubkey in proptest::collection::vec(any::<u8>(), 33),
        version in any::<u8>(),
    ) {
        let decoded = decode_p2pkh(&encode_p2pkh(&pubkey, version)).unwrap();
        prop_assert_eq!(decoded.version, version);
        prop_assert_eq!(decoded.hash160, hash160(&pubkey));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn signed_transactions_conserve_value(
        values in proptest::collection::vec(1_000u64..1_000_000, 1..5),
        amount_frac in 1u64..1_000,
        fee in 0u64..10_000,
    ) {
        let sender = ChainKey::from_secret_bytes(Chain::Ltc, &[7u8; 32]).unwrap();
        let recipient = ChainKey::from_secret_bytes(Chain::Ltc, &[8u8; 32])
            .unwrap()
            .address()
            .unwrap();
        let from = sender.address().unwrap();

        let total: u64 = values.iter().sum();
        let amount = (total.saturating_sub(fee) * amount_frac / 1_000).max(1);

        let mut builder = TransactionBuilder::new(Chain::Ltc);
        builder.add_recipient(&recipient, amount).unwrap().set_fee(fee);
        let selection = match builder.select(&utxos(&values)) {
            Ok(s) => s,
            Err(WalletError::InsufficientFunds { have, need }) => {
                prop_assert!(have < need);
                return Ok(());
            }
            Err(e) => return Err(TestCaseError::fail(e.to_string())),
        };
        let inputs: u64 = selection.selected.iter().map(|u| u.value).sum();

        let unsigned = builder.build(selection, &from).unwrap();
        let signed = TransactionBuilder::sign(unsigned, &sender).unwrap();
        let outputs: u64 = signed.tx.output.iter().map(|o| o.value.to_sat()).sum();

        prop_assert_eq!(inputs, outputs + fee);
        prop_assert_eq!(signed.fee, fee);
        prop_assert!(signed.tx.input.iter().all(|i| !i.script_sig.is_empty()));
    }

    #[test]
    fn overspend_is_insufficient_funds(
        values in proptest::collection::vec(1_000u64..100_000, 1..5),
        extra in 1u64..1_000_000,
    ) {
        let total: u64 = values.iter().sum();
        let recipient = ChainKey::from_secret_bytes(Chain::Btc, &[8u8; 32])
            .unwrap()
            .address()
            .unwrap();
        let mut builder = TransactionBuilder::new(Chain::Btc);
        builder.add_recipient(&recipient, total + extra).unwrap();
        let err = builder.select(&utxos(&values)).unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
    }
}
