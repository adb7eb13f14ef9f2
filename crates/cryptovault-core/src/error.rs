//! Error types shared across the CryptoVault crates.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("empty address")] Empty,
    #[error("invalid base58: {0}")] InvalidBase58(String),
    #[error("invalid length: expected {expected}, got {got}")]
    InvalidLength { expected: usize, got: usize },
    #[error("invalid checksum")] InvalidChecksum,
    #[error("invalid version byte: 0x{0:02x}")] InvalidVersion(u8),
    #[error("invalid hex: {0}")] InvalidHex(String),
    #[error("invalid checksum casing")] InvalidChecksumCasing,
    #[error("missing 0x prefix")] MissingPrefix,
    #[error("uncompressed-key WIF is not supported")] UncompressedWif,
    #[error("invalid WIF compression flag: 0x{0:02x}")] InvalidWifFlag(u8),
    #[error("{0} has no UTXO address format")] NotUtxoChain(String),
    #[error("unknown chain: {0}")] UnknownChain(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid private key")] InvalidPrivateKey,
    #[error("invalid public key")] InvalidPublicKey,
    #[error("key derivation failed: {0}")] KeyDerivation(String),
    #[error("invalid derivation path: {0}")] InvalidPath(String),
    #[error("signature self-check failed on input {index}")] SignatureSelfCheck { index: usize },
    #[error("signing failed: {0}")] Signing(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("request failed: {0}")] Request(String),
    #[error("timeout")] Timeout,
    #[error("HTTP {status}: {body}")] Status { status: u16, body: String },
    #[error("malformed response: {0}")] Malformed(String),
    #[error("rejected by provider: {0}")] Rejected(String),
    #[error("unsupported: {0}")] Unsupported(String),
    #[error("All broadcast methods failed. Last error: {0}")] AllProvidersFailed(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("I/O error: {0}")] Io(String),
    #[error("invalid storage key: {0}")] InvalidKey(String),
    #[error("corrupted entry: {0}")] Corrupted(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnitsError {
    #[error("empty amount")] Empty,
    #[error("invalid amount: {0}")] Invalid(String),
    #[error("too many decimal places: max {max}")] TooPrecise { max: u32 },
    #[error("amount overflow")] Overflow,
}
