//! Wallet-wide constants. Monetary values are in the chain's smallest unit
//! (satoshi/litoshi for UTXO chains, wei for Ethereum).

/// Smallest units per whole coin on BTC and LTC.
pub const SATS_PER_COIN: u64 = 100_000_000;

/// Wei per ether.
pub const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;

/// Flat fee charged by a UTXO send unless overridden.
pub const DEFAULT_FLAT_FEE: u64 = 10_000;

/// Floor for the PBKDF2 iteration count of the wallet cipher.
pub const MIN_PBKDF2_ITERATIONS: u32 = 10_000;

/// Vault key under which the encrypted wallet blob is stored.
pub const VAULT_WALLET_KEY: &str = "cryptovault_wallet";

/// Words in a generated recovery phrase.
pub const MNEMONIC_WORDS: usize = 12;

/// Entropy bytes behind a 12-word phrase.
pub const MNEMONIC_ENTROPY_BYTES: usize = 16;

/// Transactions returned by a history query unless a limit is given.
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

