//! Address and private-key encodings.
//!
//! UTXO chains use Base58Check over `version || payload`:
//!
//! ```text
//! P2PKH:  version (1) || RIPEMD160(SHA256(pubkey)) (20) || checksum (4)
//! WIF:    version (1) || secret key (32) || 0x01 || checksum (4)
//! ```
//!
//! The checksum is the first four bytes of double SHA-256 over everything
//! before it. Ethereum addresses are the last 20 bytes of the Keccak-256 of
//! the uncompressed public key (without its `0x04` prefix), rendered as `0x`
//! hex with EIP-55 mixed-case checksum.

use std::fmt;
use zeroize::Zeroizing;

use crate::chain::{Chain, ChainKind};
use crate::crypto::{checksum4, hash160, keccak256};
use crate::error::AddressError;

/// Length of a decoded P2PKH or P2SH payload (version + hash160 + checksum).
const BASE58_ADDRESS_LEN: usize = 1 + 20 + 4;

/// Length of a decoded compressed-key WIF payload.
const WIF_LEN: usize = 1 + 32 + 1 + 4;

/// Compressed public key marker appended to WIF payloads.
const WIF_COMPRESSED: u8 = 0x01;

/// Encode `payload` with a trailing 4-byte double-SHA-256 checksum.
pub fn base58check_encode(payload: &[u8]) -> String {
    let mut data = Vec::with_capacity(payload.len() + 4);
    data.extend_from_slice(payload);
    data.extend_from_slice(&checksum4(payload));
    bs58::encode(data).into_string()
}

/// Decode a Base58Check string and verify its checksum.
///
/// Returns the payload without the checksum.
pub fn base58check_decode(s: &str) -> Result<Vec<u8>, AddressError> {
    if s.is_empty() {
        return Err(AddressError::Empty);
    }
    let mut data = bs58::decode(s)
        .into_vec()
        .map_err(|e| AddressError::InvalidBase58(e.to_string()))?;
    if data.len() < 5 {
        return Err(AddressError::InvalidLength {
            expected: 5,
            got: data.len(),
        });
    }
    let split = data.len() - 4;
    if checksum4(&data[..split]) != data[split..] {
        return Err(AddressError::InvalidChecksum);
    }
    data.truncate(split);
    Ok(data)
}

/// A decoded legacy address: version byte and 20-byte hash.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct P2pkhAddress {
    pub version: u8,
    pub hash160: [u8; 20],
}

impl P2pkhAddress {
    /// Build from a serialized public key (compressed or uncompressed).
    pub fn from_pubkey(pubkey: &[u8], version: u8) -> Self {
        Self {
            version,
            hash160: hash160(pubkey),
        }
    }

    pub fn encode(&self) -> String {
        let mut payload = [0u8; 21];
        payload[0] = self.version;
        payload[1..].copy_from_slice(&self.hash160);
        base58check_encode(&payload)
    }
}

impl fmt::Display for P2pkhAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Encode a public key as a P2PKH address with the given version byte.
pub fn encode_p2pkh(pubkey: &[u8], version: u8) -> String {
    P2pkhAddress::from_pubkey(pubkey, version).encode()
}

/// Inverse of [`encode_p2pkh`]: recover the version byte and hash160.
///
/// The version byte is returned as found; callers that expect a specific
/// chain must compare it themselves (see [`decode_destination`]).
pub fn decode_p2pkh(address: &str) -> Result<P2pkhAddress, AddressError> {
    let payload = base58check_decode(address)?;
    if payload.len() != BASE58_ADDRESS_LEN - 4 {
        return Err(AddressError::InvalidLength {
            expected: BASE58_ADDRESS_LEN,
            got: payload.len() + 4,
        });
    }
    let mut hash = [0u8; 20];
    hash.copy_from_slice(&payload[1..]);
    Ok(P2pkhAddress {
        version: payload[0],
        hash160: hash,
    })
}

/// Output script type a recipient address decodes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Destination {
    /// Pay to public key hash.
    P2pkh([u8; 20]),
    /// Pay to script hash.
    P2sh([u8; 20]),
}

/// Decode a recipient address for a UTXO chain.
///
/// Accepts the chain's P2PKH version and any of its P2SH versions. Any
/// other version byte is rejected, so a Bitcoin address never passes as a
/// Litecoin one and vice versa.
pub fn decode_destination(chain: Chain, address: &str) -> Result<Destination, AddressError> {
    let params = chain.utxo_params()?;
    let decoded = decode_p2pkh(address)?;
    if decoded.version == params.p2pkh_version {
        Ok(Destination::P2pkh(decoded.hash160))
    } else if params.p2sh_versions.contains(&decoded.version) {
        Ok(Destination::P2sh(decoded.hash160))
    } else {
        Err(AddressError::InvalidVersion(decoded.version))
    }
}

/// Encode an Ethereum account address.
///
/// `pubkey` is the SEC1 uncompressed key: 65 bytes starting with `0x04`,
/// or the bare 64-byte `X || Y` form.
pub fn encode_account_address(pubkey: &[u8]) -> Result<String, AddressError> {
    let xy = match pubkey.len() {
        65 if pubkey[0] == 0x04 => &pubkey[1..],
        64 => pubkey,
        got => return Err(AddressError::InvalidLength { expected: 65, got }),
    };
    let digest = keccak256(xy);
    Ok(to_checksum_address(&digest[12..]))
}

/// Render 20 address bytes as `0x` hex with EIP-55 checksum casing.
pub fn to_checksum_address(addr: &[u8]) -> String {
    let lower = hex::encode(addr);
    let hash = keccak256(lower.as_bytes());
    let mut out = String::with_capacity(2 + lower.len());
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let nibble = (hash[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Parse a `0x` account address.
///
/// All-lowercase and all-uppercase hex are accepted without a checksum;
/// mixed case must match EIP-55 exactly.
pub fn decode_account_address(address: &str) -> Result<[u8; 20], AddressError> {
    let body = address
        .strip_prefix("0x")
        .ok_or(AddressError::MissingPrefix)?;
    if body.len() != 40 {
        return Err(AddressError::InvalidLength {
            expected: 40,
            got: body.len(),
        });
    }
    let mut bytes = [0u8; 20];
    hex::decode_to_slice(body, &mut bytes).map_err(|e| AddressError::InvalidHex(e.to_string()))?;

    let has_lower = body.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = body.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper && to_checksum_address(&bytes) != address {
        return Err(AddressError::InvalidChecksumCasing);
    }
    Ok(bytes)
}

/// Check whether `address` is a well-formed recipient for `chain`.
pub fn validate_address(chain: Chain, address: &str) -> bool {
    let address = address.trim();
    match chain.kind() {
        ChainKind::Utxo => decode_destination(chain, address).is_ok(),
        ChainKind::Account => decode_account_address(address).is_ok(),
    }
}

/// Encode a secret key in Wallet Import Format (compressed-key flavour).
pub fn encode_wif(secret: &[u8; 32], version: u8) -> String {
    let mut payload = Zeroizing::new([0u8; 34]);
    payload[0] = version;
    payload[1..33].copy_from_slice(secret);
    payload[33] = WIF_COMPRESSED;
    base58check_encode(&payload[..])
}

/// Decode a compressed-key WIF, requiring `expected_version`.
///
/// Uncompressed-key WIFs are refused: the wallet only derives addresses
/// from compressed public keys.
pub fn decode_wif(wif: &str, expected_version: u8) -> Result<Zeroizing<[u8; 32]>, AddressError> {
    let payload = Zeroizing::new(base58check_decode(wif.trim())?);
    match payload.len() {
        n if n == WIF_LEN - 4 => {}
        n if n == WIF_LEN - 5 => return Err(AddressError::UncompressedWif),
        n => {
            return Err(AddressError::InvalidLength {
                expected: WIF_LEN,
                got: n + 4,
            });
        }
    }
    if payload[0] != expected_version {
        return Err(AddressError::InvalidVersion(payload[0]));
    }
    if payload[33] != WIF_COMPRESSED {
        return Err(AddressError::InvalidWifFlag(payload[33]));
    }
    let mut secret = Zeroizing::new([0u8; 32]);
    secret.copy_from_slice(&payload[1..33]);
    Ok(secret)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BTC_PUBKEY: &str = "03aaeb52dd7494c361049de67cc680e83ebcbbbdbeb13637d92cd845f70308af5e";
    const LTC_PUBKEY: &str = "030fe9d8d0e15d432d1ae9b3c52f4cb6e37e3c7a41af0139783da09eab85a182dc";
    const BTC_SECRET: &str = "e284129cc0922579a535bbf4d1a3b25773090d28c909bc0fed73b5e0222cc372";
    const LTC_SECRET: &str = "4baa38b7623a40da63836cd9ee8c51d0b6273e766c88adde156fd5fec6e19008";

    fn secret(h: &str) -> [u8; 32] {
        let mut out = [0u8; 32];
        hex::decode_to_slice(h, &mut out).unwrap();
        out
    }

    #[test]
    fn p2pkh_btc_known_vector() {
        let pk = hex::decode(BTC_PUBKEY).unwrap();
        assert_eq!(encode_p2pkh(&pk, 0x00), "1LqBGSKuX5yYUonjxT5qGfpUsXKYYWeabA");
    }

    #[test]
    fn p2pkh_ltc_known_vector() {
        let pk = hex::decode(LTC_PUBKEY).unwrap();
        assert_eq!(encode_p2pkh(&pk, 0x30), "LUWPbpM43E2p7ZSh8cyTBEkvpHmr3cB8Ez");
    }

    #[test]
    fn decode_p2pkh_recovers_version_and_hash() {
        let decoded = decode_p2pkh("1LqBGSKuX5yYUonjxT5qGfpUsXKYYWeabA").unwrap();
        assert_eq!(decoded.version, 0x00);
        assert_eq!(
            hex::encode(decoded.hash160),
            "d986ed01b7a22225a70edbf2ba7cfb63a15cb3aa"
        );
        assert_eq!(decoded.to_string(), "1LqBGSKuX5yYUonjxT5qGfpUsXKYYWeabA");
    }

    #[test]
    fn decode_p2pkh_rejects_bad_checksum() {
        // Last character changed.
        let err = decode_p2pkh("1LqBGSKuX5yYUonjxT5qGfpUsXKYYWeabB").unwrap_err();
        assert_eq!(err, AddressError::InvalidChecksum);
    }

    #[test]
    fn decode_p2pkh_rejects_non_alphabet() {
        // '0' is not in the Bitcoin alphabet.
        let err = decode_p2pkh("1LqBGSKuX5yYUonjxT5qGfpUsXKYYWeab0").unwrap_err();
        assert!(matches!(err, AddressError::InvalidBase58(_)));
    }

    #[test]
    fn decode_p2pkh_rejects_wrong_length() {
        let short = base58check_encode(&[0x00; 10]);
        let err = decode_p2pkh(&short).unwrap_err();
        assert!(matches!(err, AddressError::InvalidLength { .. }));
    }

    #[test]
    fn decode_p2pkh_rejects_empty() {
        assert_eq!(decode_p2pkh("").unwrap_err(), AddressError::Empty);
    }

    #[test]
    fn leading_zero_bytes_become_ones() {
        let addr = P2pkhAddress {
            version: 0x00,
            hash160: [0u8; 20],
        };
        let s = addr.encode();
        assert!(s.starts_with(&"1".repeat(21)));
        assert_ne!(s.as_bytes()[21], b'1');
        assert_eq!(decode_p2pkh(&s).unwrap(), addr);
    }

    #[test]
    fn destination_respects_chain_versions() {
        let btc = "1LqBGSKuX5yYUonjxT5qGfpUsXKYYWeabA";
        let ltc = "LUWPbpM43E2p7ZSh8cyTBEkvpHmr3cB8Ez";
        assert!(matches!(
            decode_destination(Chain::Btc, btc).unwrap(),
            Destination::P2pkh(_)
        ));
        assert_eq!(
            decode_destination(Chain::Ltc, btc).unwrap_err(),
            AddressError::InvalidVersion(0x00)
        );
        assert_eq!(
            decode_destination(Chain::Btc, ltc).unwrap_err(),
            AddressError::InvalidVersion(0x30)
        );
    }

    #[test]
    fn destination_accepts_p2sh() {
        let h = [0x11u8; 20];
        let btc_p2sh = P2pkhAddress { version: 0x05, hash160: h }.encode();
        let ltc_p2sh = P2pkhAddress { version: 0x32, hash160: h }.encode();
        assert!(btc_p2sh.starts_with('3'));
        assert!(ltc_p2sh.starts_with('M'));
        assert_eq!(decode_destination(Chain::Btc, &btc_p2sh).unwrap(), Destination::P2sh(h));
        assert_eq!(decode_destination(Chain::Ltc, &ltc_p2sh).unwrap(), Destination::P2sh(h));
        // Legacy Litecoin P2SH prefix.
        assert_eq!(decode_destination(Chain::Ltc, &btc_p2sh).unwrap(), Destination::P2sh(h));
    }

    #[test]
    fn destination_on_account_chain_fails() {
        assert!(matches!(
            decode_destination(Chain::Eth, "1LqBGSKuX5yYUonjxT5qGfpUsXKYYWeabA"),
            Err(AddressError::NotUtxoChain(_))
        ));
    }

    #[test]
    fn eip55_reference_vectors() {
        for addr in [
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
            "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
            "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
        ] {
            let bytes = decode_account_address(addr).unwrap();
            assert_eq!(to_checksum_address(&bytes), addr);
        }
    }

    #[test]
    fn account_address_from_uncompressed_prefix_is_stripped() {
        let key = [0x04u8; 65];
        let with_prefix = encode_account_address(&key).unwrap();
        let bare = encode_account_address(&key[1..]).unwrap();
        assert_eq!(with_prefix, bare);
        assert!(with_prefix.starts_with("0x"));
        assert_eq!(with_prefix.len(), 42);
    }

    #[test]
    fn account_address_rejects_compressed_key() {
        let err = encode_account_address(&[0x02; 33]).unwrap_err();
        assert_eq!(err, AddressError::InvalidLength { expected: 65, got: 33 });
    }

    #[test]
    fn account_address_casing_rules() {
        let good = "0x9858EfFD232B4033E47d90003D41EC34EcaEda94";
        assert!(decode_account_address(good).is_ok());
        assert!(decode_account_address(&good.to_lowercase().replace("0X", "0x")).is_ok());
        assert!(decode_account_address(&format!("0x{}", good[2..].to_uppercase())).is_ok());
        // Flip the case of one letter.
        let bad = good.replacen("EfFD", "efFD", 1);
        assert_eq!(
            decode_account_address(&bad).unwrap_err(),
            AddressError::InvalidChecksumCasing
        );
        assert_eq!(
            decode_account_address("9858EfFD232B4033E47d90003D41EC34EcaEda94").unwrap_err(),
            AddressError::MissingPrefix
        );
        assert!(matches!(
            decode_account_address("0x9858"),
            Err(AddressError::InvalidLength { .. })
        ));
        assert!(matches!(
            decode_account_address("0xzz58effd232b4033e47d90003d41ec34ecaeda94"),
            Err(AddressError::InvalidHex(_))
        ));
    }

    #[test]
    fn validate_address_per_chain() {
        assert!(validate_address(Chain::Btc, "1LqBGSKuX5yYUonjxT5qGfpUsXKYYWeabA"));
        assert!(validate_address(Chain::Ltc, " LUWPbpM43E2p7ZSh8cyTBEkvpHmr3cB8Ez "));
        assert!(validate_address(Chain::Eth, "0x9858EfFD232B4033E47d90003D41EC34EcaEda94"));
        assert!(!validate_address(Chain::Eth, "1LqBGSKuX5yYUonjxT5qGfpUsXKYYWeabA"));
        assert!(!validate_address(Chain::Btc, "0x9858EfFD232B4033E47d90003D41EC34EcaEda94"));
        assert!(!validate_address(Chain::Ltc, ""));
    }

    #[test]
    fn wif_known_vectors() {
        assert_eq!(
            encode_wif(&secret(BTC_SECRET), 0x80),
            "L4p2b9VAf8k5aUahF1JCJUzZkgNEAqLfq8DDdQiyAprQAKSbu8hf"
        );
        assert_eq!(
            encode_wif(&secret(LTC_SECRET), 0xB0),
            "T5b4RiWRs7XG8xZ2bCHBoJcn4JrpMTbGRFYXgoZHd7nD8izwqhMK"
        );
    }

    #[test]
    fn wif_decode_roundtrip_and_version_check() {
        let wif = "T5b4RiWRs7XG8xZ2bCHBoJcn4JrpMTbGRFYXgoZHd7nD8izwqhMK";
        let key = decode_wif(wif, 0xB0).unwrap();
        assert_eq!(*key, secret(LTC_SECRET));
        assert_eq!(decode_wif(wif, 0x80).unwrap_err(), AddressError::InvalidVersion(0xB0));
    }

    #[test]
    fn wif_rejects_uncompressed_and_bad_flag() {
        let mut payload = vec![0x80];
        payload.extend_from_slice(&secret(BTC_SECRET));
        assert_eq!(
            decode_wif(&base58check_encode(&payload), 0x80).unwrap_err(),
            AddressError::UncompressedWif
        );

        payload.push(0x02);
        assert_eq!(
            decode_wif(&base58check_encode(&payload), 0x80).unwrap_err(),
            AddressError::InvalidWifFlag(0x02)
        );
    }

    #[test]
    fn wif_rejects_address_payload() {
        let err = decode_wif("1LqBGSKuX5yYUonjxT5qGfpUsXKYYWeabA", 0x80).unwrap_err();
        assert!(matches!(err, AddressError::InvalidLength { .. }));
    }
}
