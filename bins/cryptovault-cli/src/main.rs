//! cryptovault-cli: command-line front end for the CryptoVault wallet.
//!
//! Creates and restores the encrypted local wallet, shows addresses and
//! balances, and sends BTC/LTC. Sends are simulated unless
//! `CRYPTOVAULT_ENABLE_REAL_TX` is set.

mod config;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use rand::RngCore;
use tracing::{info, warn};
use zeroize::Zeroizing;

use cryptovault_core::address::validate_address;
use cryptovault_core::chain::{Chain, ChainKind, PerChain};
use cryptovault_core::constants::DEFAULT_HISTORY_LIMIT;
use cryptovault_core::error::NetworkError;
use cryptovault_core::units::{format_amount, parse_amount};
use cryptovault_network::{HttpClient, indexer_for, relay_for};
use cryptovault_wallet::{
    ChainServices, LocalVault, SendOutcome, Session, WalletRecord, init_crypto_backend,
    validate_mnemonic, validate_password_strength,
};

use crate::config::Config;

/// CryptoVault command-line wallet.
#[derive(Parser)]
#[command(name = "cryptovault-cli")]
#[command(version, about = "Non-custodial BTC/LTC/ETH wallet")]
struct Cli {
    /// Vault directory (overrides CRYPTOVAULT_HOME).
    #[arg(long, global = true)]
    vault_dir: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new wallet with a fresh 12-word phrase.
    Create(CreateArgs),
    /// Restore a wallet from a 12-word phrase.
    Restore(RestoreArgs),
    /// Show the receive address of every chain.
    Addresses,
    /// Print the private keys (WIF / hex).
    ExportKeys,
    /// Query balances from the network.
    Balance(ChainArgs),
    /// Show recent transactions.
    History(HistoryArgs),
    /// Send coins.
    Send(SendArgs),
    /// Delete the stored wallet.
    Reset(ResetArgs),
}

#[derive(Args)]
struct CreateArgs {
    /// Overwrite an existing wallet.
    #[arg(long)]
    force: bool,
}

#[derive(Args)]
struct RestoreArgs {
    /// Overwrite an existing wallet.
    #[arg(long)]
    force: bool,
}

#[derive(Args)]
struct ChainArgs {
    /// Only this chain (btc, ltc or eth).
    #[arg(short, long)]
    chain: Option<Chain>,
}

#[derive(Args)]
struct HistoryArgs {
    /// Chain to query (btc, ltc or eth).
    #[arg(short, long)]
    chain: Chain,

    /// Maximum number of transactions.
    #[arg(short, long, default_value_t = DEFAULT_HISTORY_LIMIT)]
    limit: usize,
}

#[derive(Args)]
struct SendArgs {
    /// Chain to send on (btc, ltc or eth).
    #[arg(short, long)]
    chain: Chain,

    /// Recipient address.
    #[arg(short, long)]
    to: String,

    /// Amount in coins, e.g. 0.015.
    #[arg(short, long)]
    amount: String,

    /// Flat fee in the smallest unit (default from config).
    #[arg(long)]
    fee: Option<u64>,
}

#[derive(Args)]
struct ResetArgs {
    /// Skip the confirmation prompt.
    #[arg(long)]
    yes: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env().context("Invalid configuration")?;
    if let Some(dir) = cli.vault_dir {
        config.vault_dir = dir;
    }
    init_crypto_backend();

    match cli.command {
        Commands::Create(args) => wallet_create(&config, args),
        Commands::Restore(args) => wallet_restore(&config, args),
        Commands::Addresses => show_addresses(&config),
        Commands::ExportKeys => export_keys(&config),
        Commands::Balance(args) => show_balance(&config, args).await,
        Commands::History(args) => show_history(&config, args).await,
        Commands::Send(args) => send(&config, args).await,
        Commands::Reset(args) => reset(&config, args),
    }
}

/// Prompt for a password without echoing.
fn prompt_password(prompt: &str) -> Result<Zeroizing<String>> {
    rpassword::prompt_password(format!("{}: ", prompt))
        .map(Zeroizing::new)
        .context("Failed to read password")
}

/// Prompt for a new password twice and check its strength.
fn prompt_new_password() -> Result<Zeroizing<String>> {
    let password = prompt_password("Enter wallet password")?;
    let strength = validate_password_strength(&password);
    if !strength.is_valid {
        bail!("Password too weak ({}/6): {}", strength.score, strength.feedback);
    }
    let confirm = prompt_password("Confirm password")?;
    if *password != *confirm {
        bail!("Passwords do not match");
    }
    Ok(password)
}

fn open_vault(config: &Config) -> LocalVault {
    LocalVault::open(config.vault_dir.clone()).with_iterations(config.pbkdf2_iterations)
}

fn ensure_vault_free(vault: &LocalVault, force: bool) -> Result<()> {
    if vault.has_stored_wallet().context("Failed to read vault")? && !force {
        bail!("A wallet already exists in this vault (use --force to overwrite)");
    }
    Ok(())
}

fn unlock_record(config: &Config) -> Result<WalletRecord> {
    let vault = open_vault(config);
    if !vault.has_stored_wallet().context("Failed to read vault")? {
        bail!("No wallet found in {}", config.vault_dir.display());
    }
    let password = prompt_password("Wallet password")?;
    vault
        .unlock(&password)
        .context("Failed to unlock wallet (check password)")
}

fn chain_services(config: &Config) -> Result<PerChain<ChainServices>> {
    let http = HttpClient::new(config.network.timeout).context("Failed to build HTTP client")?;
    PerChain::try_from_fn(|chain| -> Result<ChainServices, NetworkError> {
        Ok(ChainServices::new(
            indexer_for(chain, &config.network, &http)?,
            relay_for(chain, &config.network, &http)?,
        ))
    })
    .context("Failed to configure network services")
}

fn unlock_session(config: &Config) -> Result<Session> {
    let record = unlock_record(config)?;
    Ok(Session::from_record(record, chain_services(config)?))
}

fn print_addresses(addresses: &PerChain<String>) {
    for (chain, address) in addresses.iter() {
        println!("  {:<4} {}", chain, address);
    }
}

fn wallet_create(config: &Config, args: CreateArgs) -> Result<()> {
    let vault = open_vault(config);
    ensure_vault_free(&vault, args.force)?;

    let password = prompt_new_password()?;
    let record = WalletRecord::generate().context("Failed to generate wallet")?;
    vault
        .save(&record, &password)
        .context("Failed to save wallet")?;

    println!("\n=== WALLET CREATED ===");
    println!("\nRECOVERY PHRASE (BACKUP THIS: 12 WORDS):");
    println!("  {}", record.mnemonic);
    println!("\nWARNING: This phrase will NOT be shown again.");
    println!("Anyone with this phrase can spend your funds.");
    println!("\nAddresses:");
    print_addresses(&record.addresses);
    println!("\nWallet saved to: {}", config.vault_dir.display());
    info!(vault = %config.vault_dir.display(), "wallet created");
    Ok(())
}

fn wallet_restore(config: &Config, args: RestoreArgs) -> Result<()> {
    let vault = open_vault(config);
    ensure_vault_free(&vault, args.force)?;

    let phrase = Zeroizing::new(
        rpassword::prompt_password("Enter 12-word recovery phrase: ")
            .context("Failed to read recovery phrase")?,
    );
    if !validate_mnemonic(&phrase) {
        bail!("Invalid recovery phrase");
    }
    let record = WalletRecord::from_mnemonic(&phrase).context("Failed to restore wallet")?;

    let password = prompt_new_password()?;
    vault
        .save(&record, &password)
        .context("Failed to save wallet")?;

    println!("\n=== WALLET RESTORED ===");
    print_addresses(&record.addresses);
    println!("\nWallet saved to: {}", config.vault_dir.display());
    info!(vault = %config.vault_dir.display(), "wallet restored");
    Ok(())
}

fn show_addresses(config: &Config) -> Result<()> {
    let record = unlock_record(config)?;
    print_addresses(&record.addresses);
    Ok(())
}

fn export_keys(config: &Config) -> Result<()> {
    let record = unlock_record(config)?;
    println!("WARNING: Anyone with these keys can spend your funds.\n");
    for (chain, key) in record.private_keys.iter() {
        println!("  {:<4} {}", chain, key);
    }
    Ok(())
}

async fn show_balance(config: &Config, args: ChainArgs) -> Result<()> {
    let session = unlock_session(config)?;
    let chains: Vec<Chain> = match args.chain {
        Some(chain) => vec![chain],
        None => Chain::ALL.to_vec(),
    };

    for chain in chains {
        match session.balance(chain).await {
            Ok(amount) => println!(
                "  {:<4} {} {}",
                chain,
                format_amount(chain, amount),
                chain.symbol()
            ),
            Err(e) => {
                warn!(%chain, error = %e, "balance query failed");
                println!("  {:<4} unavailable ({})", chain, e);
            }
        }
    }
    session.lock();
    Ok(())
}

async fn show_history(config: &Config, args: HistoryArgs) -> Result<()> {
    let session = unlock_session(config)?;
    let txs = session
        .history(args.chain, args.limit)
        .await
        .with_context(|| format!("Failed to fetch {} history", args.chain))?;
    session.lock();

    if txs.is_empty() {
        println!("No transactions.");
        return Ok(());
    }
    for tx in txs {
        let when = tx
            .timestamp
            .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0))
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "pending".to_string());
        println!(
            "  {}  {:>20} {}  fee {}  {:?}  {}",
            when,
            format_amount(args.chain, tx.value),
            args.chain.symbol(),
            format_amount(args.chain, tx.fee),
            tx.status,
            tx.hash
        );
    }
    Ok(())
}

fn default_fee(config: &Config, chain: Chain) -> u64 {
    match chain {
        Chain::Btc => config.btc_fee,
        Chain::Ltc => config.ltc_fee,
        Chain::Eth => 0,
    }
}

/// Random 64-hex txid for simulated sends.
fn simulated_txid() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

async fn send(config: &Config, args: SendArgs) -> Result<()> {
    let chain = args.chain;
    if !validate_address(chain, &args.to) {
        bail!("Invalid {} address: {}", chain, args.to);
    }
    let amount = parse_amount(chain, &args.amount).context("Invalid amount")?;
    if amount == 0 {
        bail!("Amount must be greater than zero");
    }
    let amount = u64::try_from(amount).context("Amount too large")?;
    let fee = args.fee.unwrap_or_else(|| default_fee(config, chain));

    let session = unlock_session(config)?;
    println!(
        "Sending {} {} from {} to {} (fee {})",
        format_amount(chain, amount as u128),
        chain.symbol(),
        session.address(chain),
        args.to,
        format_amount(chain, fee as u128)
    );

    let outcome = if config.enable_real_tx {
        session.send(chain, &args.to, amount, fee).await
    } else if chain.kind() == ChainKind::Account {
        // Account chains have no builder; report it the same way a real send would.
        session.send(chain, &args.to, amount, fee).await
    } else {
        println!("Simulation mode: set CRYPTOVAULT_ENABLE_REAL_TX=1 to broadcast.");
        SendOutcome::succeeded(simulated_txid())
    };
    session.lock();

    println!(
        "{}",
        serde_json::to_string_pretty(&outcome).context("Failed to serialize outcome")?
    );
    if !outcome.success {
        bail!(
            "Send failed: {}",
            outcome.error.unwrap_or_else(|| "unknown error".into())
        );
    }
    info!(%chain, txid = outcome.txid.as_deref().unwrap_or(""), "send complete");
    Ok(())
}

fn reset(config: &Config, args: ResetArgs) -> Result<()> {
    let vault = open_vault(config);
    if !vault.has_stored_wallet().context("Failed to read vault")? {
        println!("No wallet to reset.");
        return Ok(());
    }
    if !args.yes {
        println!("This deletes the encrypted wallet in {}.", config.vault_dir.display());
        println!("Funds are only recoverable with the 12-word phrase.");
        let answer = prompt_password("Type RESET to confirm")?;
        if answer.trim() != "RESET" {
            bail!("Reset cancelled");
        }
    }
    vault.reset().context("Failed to delete wallet")?;
    println!("Wallet deleted.");
    info!(vault = %config.vault_dir.display(), "wallet reset");
    Ok(())
}
