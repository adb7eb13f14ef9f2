//! Local persistence of the encrypted wallet.
//!
//! [`LocalVault`] stores a single [`EncryptedWallet`] JSON blob under the
//! fixed key `cryptovault_wallet` in any [`VaultStore`]. Two stores are
//! provided: [`FileStore`] (one `<key>.json` file per key in a directory,
//! default `~/.cryptovault`) and [`MemoryStore`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use cryptovault_core::constants::{MIN_PBKDF2_ITERATIONS, VAULT_WALLET_KEY};
use cryptovault_core::error::StorageError;
use cryptovault_core::traits::VaultStore;

use crate::encryption::{self, EncryptedWallet};
use crate::error::WalletError;
use crate::record::WalletRecord;

/// Default vault directory name under the user's home.
pub const DEFAULT_VAULT_DIR: &str = ".cryptovault";

/// Keys map to file names, so only a conservative character set is allowed.
fn check_key(key: &str) -> Result<(), StorageError> {
    let ok = !key.is_empty()
        && key.len() <= 128
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
    if ok {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

/// Directory-backed store, one file per key.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `~/.cryptovault`, or `./.cryptovault` when no home directory is known.
    pub fn default_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_VAULT_DIR)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        check_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl VaultStore for FileStore {
    fn put(&self, key: &str, blob: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir).map_err(|e| StorageError::Io(e.to_string()))?;
        // Write then rename so a crash never leaves a half-written blob.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, blob.as_bytes()).map_err(|e| StorageError::Io(e.to_string()))?;
        std::fs::rename(&tmp, &path).map_err(|e| StorageError::Io(e.to_string()))?;
        debug!(path = %path.display(), "Vault entry written");
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e.to_string())),
        }
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e.to_string())),
        }
    }
}

/// In-process store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VaultStore for MemoryStore {
    fn put(&self, key: &str, blob: &str) -> Result<(), StorageError> {
        check_key(key)?;
        self.entries.lock().insert(key.to_string(), blob.to_string());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        check_key(key)?;
        Ok(self.entries.lock().get(key).cloned())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        check_key(key)?;
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// The wallet's encrypted blob in a [`VaultStore`].
///
/// Only cipher output passes through here; plaintext records never reach
/// the store.
#[derive(Clone)]
pub struct LocalVault {
    store: Arc<dyn VaultStore>,
    iterations: u32,
}

impl LocalVault {
    pub fn new(store: Arc<dyn VaultStore>) -> Self {
        Self {
            store,
            iterations: MIN_PBKDF2_ITERATIONS,
        }
    }

    /// File-backed vault in `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FileStore::new(dir)))
    }

    /// In-memory vault.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Override the PBKDF2 iteration count used for new encryptions.
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = encryption::effective_iterations(iterations);
        self
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Encrypt `record` under `password` and store it, replacing any
    /// previous wallet.
    pub fn save(
        &self,
        record: &WalletRecord,
        password: &str,
    ) -> Result<EncryptedWallet, WalletError> {
        let encrypted = encryption::encrypt(record, password, self.iterations)?;
        self.store.put(VAULT_WALLET_KEY, &encrypted.to_json()?)?;
        info!(iterations = encrypted.iterations, "Wallet saved to vault");
        Ok(encrypted)
    }

    /// The stored blob, if any.
    pub fn load(&self) -> Result<Option<EncryptedWallet>, WalletError> {
        match self.store.get(VAULT_WALLET_KEY)? {
            Some(json) => Ok(Some(EncryptedWallet::from_json(&json)?)),
            None => Ok(None),
        }
    }

    /// Decrypt the stored wallet.
    ///
    /// [`WalletError::NoWallet`] when nothing is stored; wrong password and
    /// corrupted data are [`WalletError::InvalidPassword`].
    pub fn unlock(&self, password: &str) -> Result<WalletRecord, WalletError> {
        let encrypted = self.load()?.ok_or(WalletError::NoWallet)?;
        encryption::decrypt(&encrypted, password).ok_or(WalletError::InvalidPassword)
    }

    pub fn has_stored_wallet(&self) -> Result<bool, WalletError> {
        Ok(self.store.contains(VAULT_WALLET_KEY)?)
    }

    /// Erase the stored wallet. Succeeds when nothing is stored.
    pub fn reset(&self) -> Result<(), WalletError> {
        self.store.delete(VAULT_WALLET_KEY)?;
        info!("Vault reset");
        Ok(())
    }
}

impl std::fmt::Debug for LocalVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalVault")
            .field("iterations", &self.iterations)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABANDON: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn memory_store_put_get_delete() {
        let s = MemoryStore::new();
        assert_eq!(s.get("k").unwrap(), None);
        s.put("k", "v").unwrap();
        assert_eq!(s.get("k").unwrap().as_deref(), Some("v"));
        assert!(s.contains("k").unwrap());
        s.delete("k").unwrap();
        assert_eq!(s.get("k").unwrap(), None);
        s.delete("k").unwrap();
    }

    #[test]
    fn file_store_put_get_delete() {
        let dir = tempfile::tempdir().unwrap();
        let s = FileStore::new(dir.path().join("nested"));
        assert_eq!(s.get("cryptovault_wallet").unwrap(), None);
        s.put("cryptovault_wallet", "{}").unwrap();
        assert!(dir.path().join("nested/cryptovault_wallet.json").exists());
        assert_eq!(s.get("cryptovault_wallet").unwrap().as_deref(), Some("{}"));
        s.put("cryptovault_wallet", "{\"a\":1}").unwrap();
        assert_eq!(s.get("cryptovault_wallet").unwrap().as_deref(), Some("{\"a\":1}"));
        s.delete("cryptovault_wallet").unwrap();
        assert_eq!(s.get("cryptovault_wallet").unwrap(), None);
        s.delete("cryptovault_wallet").unwrap();
    }

    #[test]
    fn path_traversal_keys_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let s = FileStore::new(dir.path());
        for key in ["../escape", "a/b", "", "x.json"] {
            assert!(matches!(s.put(key, "v"), Err(StorageError::InvalidKey(_))), "{key}");
        }
    }

    #[test]
    fn vault_roundtrip_in_memory() {
        let vault = LocalVault::in_memory();
        assert!(!vault.has_stored_wallet().unwrap());
        assert_eq!(vault.unlock("pw").unwrap_err(), WalletError::NoWallet);

        let w = WalletRecord::from_mnemonic(ABANDON).unwrap();
        vault.save(&w, "pw").unwrap();
        assert!(vault.has_stored_wallet().unwrap());
        assert_eq!(vault.unlock("pw").unwrap(), w);
        assert_eq!(vault.unlock("nope").unwrap_err(), WalletError::InvalidPassword);

        vault.reset().unwrap();
        assert!(!vault.has_stored_wallet().unwrap());
    }

    #[test]
    fn vault_roundtrip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let w = WalletRecord::from_mnemonic(ABANDON).unwrap();
        LocalVault::open(dir.path()).save(&w, "pw").unwrap();

        // A second handle on the same directory sees the wallet.
        let reopened = LocalVault::open(dir.path());
        assert_eq!(reopened.unlock("pw").unwrap(), w);

        let raw = std::fs::read_to_string(dir.path().join("cryptovault_wallet.json")).unwrap();
        assert!(!raw.contains("abandon"));
        assert!(!raw.contains(&w.private_keys.btc));
        let v: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(v.get("encryptedData").is_some());
        assert!(v.get("salt").is_some());
    }

    #[test]
    fn corrupted_blob_reported() {
        let store = Arc::new(MemoryStore::new());
        store.put(VAULT_WALLET_KEY, "not json").unwrap();
        let vault = LocalVault::new(store);
        assert!(matches!(vault.load(), Err(WalletError::CorruptedFile(_))));
    }

    #[test]
    fn iterations_floor_applies() {
        let vault = LocalVault::in_memory().with_iterations(5);
        assert_eq!(vault.iterations(), MIN_PBKDF2_ITERATIONS);
    }
}
