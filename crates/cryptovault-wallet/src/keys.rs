//! Seed handling and BIP-32 key derivation.
//!
//! Every chain uses the same secp256k1 BIP-32 tree; only the path and the
//! encoding of the resulting key differ. A single signing/verification
//! context is created by [`init_crypto_backend`] and shared.

use bitcoin::bip32::{DerivationPath, Xpriv};
use bitcoin::secp256k1::{All, PublicKey, Secp256k1, SecretKey};
use bitcoin::Network;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use cryptovault_core::address::{decode_wif, encode_account_address, encode_p2pkh, encode_wif};
use cryptovault_core::chain::{Chain, ChainKind, ChainParams};
use cryptovault_core::error::CryptoError;

use crate::error::WalletError;

static SECP: OnceLock<Secp256k1<All>> = OnceLock::new();

/// Create (once) and return the shared secp256k1 context.
///
/// Safe to call repeatedly; later calls return the same context.
pub fn init_crypto_backend() -> &'static Secp256k1<All> {
    SECP.get_or_init(Secp256k1::new)
}

/// A 64-byte BIP-39 seed.
///
/// Zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Seed {
    bytes: [u8; 64],
}

impl Seed {
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self { bytes }
    }

    /// Get the raw seed bytes. Handle with care.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.bytes
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Seed")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Derive the secp256k1 key pair at `path` from raw seed bytes.
///
/// BIP-32 accepts seeds of 16 to 64 bytes; anything else, a malformed
/// path, or an invalid child key fails with [`WalletError::KeyDerivation`].
pub fn derive_key(seed: &[u8], path: &str) -> Result<(SecretKey, PublicKey), WalletError> {
    if !(16..=64).contains(&seed.len()) {
        return Err(WalletError::KeyDerivation(format!(
            "seed must be 16..=64 bytes, got {}",
            seed.len()
        )));
    }
    let secp = init_crypto_backend();
    let path = DerivationPath::from_str(path)
        .map_err(|e| CryptoError::InvalidPath(e.to_string()))?;
    let master = Xpriv::new_master(Network::Bitcoin, seed)
        .map_err(|e| WalletError::KeyDerivation(e.to_string()))?;
    let child = master
        .derive_priv(secp, &path)
        .map_err(|e| WalletError::KeyDerivation(e.to_string()))?;
    let secret = child.private_key;
    let public = PublicKey::from_secret_key(secp, &secret);
    Ok((secret, public))
}

/// One chain's signing key with its derivation metadata.
pub struct ChainKey {
    chain: Chain,
    /// `None` for keys imported from an exported private key.
    path: Option<String>,
    secret: SecretKey,
    public: PublicKey,
}

impl ChainKey {
    /// Derive the wallet key for `chain` at its fixed BIP-44 path.
    pub fn derive(seed: &Seed, chain: Chain) -> Result<Self, WalletError> {
        let path = chain.derivation_path();
        let (secret, public) = derive_key(seed.as_bytes(), path)?;
        Ok(Self {
            chain,
            path: Some(path.to_string()),
            secret,
            public,
        })
    }

    /// Wrap raw secret key bytes.
    pub fn from_secret_bytes(chain: Chain, bytes: &[u8; 32]) -> Result<Self, WalletError> {
        let secret = SecretKey::from_slice(bytes).map_err(|_| CryptoError::InvalidPrivateKey)?;
        let public = PublicKey::from_secret_key(init_crypto_backend(), &secret);
        Ok(Self {
            chain,
            path: None,
            secret,
            public,
        })
    }

    /// Import a key in the wallet's export format: WIF for UTXO chains,
    /// `0x` hex for Ethereum.
    pub fn import(chain: Chain, exported: &str) -> Result<Self, WalletError> {
        let exported = exported.trim();
        match chain.kind() {
            ChainKind::Utxo => {
                let params = chain.utxo_params()?;
                let bytes = decode_wif(exported, params.wif_version)?;
                Self::from_secret_bytes(chain, &bytes)
            }
            ChainKind::Account => {
                let body = exported.strip_prefix("0x").unwrap_or(exported);
                let mut bytes = Zeroizing::new([0u8; 32]);
                hex::decode_to_slice(body, &mut bytes[..])
                    .map_err(|_| CryptoError::InvalidPrivateKey)?;
                Self::from_secret_bytes(chain, &bytes)
            }
        }
    }

    pub fn chain(&self) -> Chain {
        self.chain
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn params(&self) -> &'static ChainParams {
        self.chain.params()
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    pub(crate) fn secret_key(&self) -> &SecretKey {
        &self.secret
    }

    /// Compressed SEC1 public key.
    pub fn public_key_bytes(&self) -> [u8; 33] {
        self.public.serialize()
    }

    /// Raw secret key bytes. Handle with care.
    pub fn secret_bytes(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.secret.secret_bytes())
    }

    /// The wallet's receive address on this chain.
    pub fn address(&self) -> Result<String, WalletError> {
        match self.chain.kind() {
            ChainKind::Utxo => {
                let params = self.chain.utxo_params()?;
                Ok(encode_p2pkh(&self.public.serialize(), params.p2pkh_version))
            }
            ChainKind::Account => Ok(encode_account_address(
                &self.public.serialize_uncompressed(),
            )?),
        }
    }

    /// Export the secret key: WIF for UTXO chains, `0x` hex for Ethereum.
    pub fn export_private_key(&self) -> Result<Zeroizing<String>, WalletError> {
        let secret = self.secret_bytes();
        match self.chain.kind() {
            ChainKind::Utxo => {
                let params = self.chain.utxo_params()?;
                Ok(Zeroizing::new(encode_wif(&secret, params.wif_version)))
            }
            ChainKind::Account => Ok(Zeroizing::new(format!("0x{}", hex::encode(&secret[..])))),
        }
    }
}

impl Drop for ChainKey {
    fn drop(&mut self) {
        self.secret.non_secure_erase();
    }
}

impl fmt::Debug for ChainKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainKey")
            .field("chain", &self.chain)
            .field("path", &self.path)
            .field("public", &hex::encode(self.public.serialize()))
            .field("secret", &"[REDACTED]")
            .finish()
    }
}
