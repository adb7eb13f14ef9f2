//! Hash primitives used by address encoding and checksums.
//!
//! - `sha256d`: double SHA-256, Base58Check checksums and legacy txids
//! - `hash160`: RIPEMD-160 over SHA-256, P2PKH/P2SH payloads
//! - `keccak256`: original Keccak (not NIST SHA3-256), Ethereum addresses

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};
use sha3::Keccak256;

/// Single SHA-256.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// SHA-256 applied twice.
pub fn sha256d(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// `RIPEMD160(SHA256(data))`.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    Ripemd160::digest(sha256(data)).into()
}

/// Keccak-256 with the pre-standard padding used by Ethereum.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// First four bytes of `sha256d(payload)`.
pub fn checksum4(payload: &[u8]) -> [u8; 4] {
    let h = sha256d(payload);
    [h[0], h[1], h[2], h[3]]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_empty() {
        assert_eq!(
            hex::encode(sha256(b"")),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn sha256d_hello() {
        assert_eq!(
            hex::encode(sha256d(b"hello")),
            "9595c9df90075148eb06860365df33584b75bff782a510c6cd4883a419833d50"
        );
    }

    #[test]
    fn keccak256_empty_is_not_sha3() {
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn hash160_of_compressed_pubkey() {
        let pk = hex::decode("03aaeb52dd7494c361049de67cc680e83ebcbbbdbeb13637d92cd845f70308af5e")
            .unwrap();
        assert_eq!(
            hex::encode(hash160(&pk)),
            "d986ed01b7a22225a70edbf2ba7cfb63a15cb3aa"
        );
    }

    #[test]
    fn checksum4_is_prefix_of_sha256d() {
        let data = b"payload";
        assert_eq!(checksum4(data), sha256d(data)[..4]);
    }
}
