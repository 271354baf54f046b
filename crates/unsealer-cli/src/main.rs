//! `unsealer` — automatic init/unseal daemon for a vault server.
//!
//! Wires a keystore backend and the vault HTTP client into the
//! [`UnsealOrchestrator`] and exposes it as one-shot subcommands plus a
//! polling `run` mode for deployment next to the vault. All policy lives in
//! `unsealer-core`; this binary only parses flags, picks a backend, and
//! schedules calls.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info, warn};

use unsealer_core::{HttpVaultClient, UnsealOrchestrator, VaultOptions};
use unsealer_keystore::{FileKeyStore, KeyStore, MemoryKeyStore};

/// Automatically initialize and unseal a vault server.
#[derive(Parser)]
#[command(
    name = "unsealer",
    version,
    about = "unsealer — automatically initialize and unseal a vault server",
    long_about = "Retrieves previously stored unseal shares from an external keystore and \
                  submits them to the vault until it reports unsealed. On first-time \
                  initialization, generates shares via the vault and persists them (plus \
                  optionally the root token) under collision-safe keys."
)]
struct Cli {
    /// Vault server address.
    #[arg(long, env = "VAULT_ADDR", default_value = "http://127.0.0.1:8200")]
    vault_addr: String,

    /// Keystore backend for persisting unseal shares.
    #[arg(long, value_enum, env = "UNSEALER_KEYSTORE", default_value = "file")]
    keystore: KeyStoreKind,

    /// Directory for the file keystore backend.
    #[arg(long, env = "UNSEALER_FILE_PATH", default_value = "./unsealer-keys")]
    file_path: String,

    /// Bucket for the S3 keystore backend.
    #[arg(long, env = "UNSEALER_S3_BUCKET")]
    s3_bucket: Option<String>,

    /// Object-key prefix inside the S3 bucket.
    #[arg(long, env = "UNSEALER_S3_PREFIX")]
    s3_prefix: Option<String>,

    /// AWS region for the S3 backend. Falls back to the SDK default chain
    /// (env, shared config, instance metadata) when unset.
    #[arg(long, env = "UNSEALER_S3_REGION")]
    s3_region: Option<String>,

    /// Namespace prefix for every keystore key this unsealer owns.
    #[arg(long, env = "UNSEALER_KEY_PREFIX", default_value = "vault-unsealer")]
    key_prefix: String,

    /// Number of unseal shares to generate at init.
    #[arg(long, env = "UNSEALER_SECRET_SHARES", default_value_t = 5)]
    secret_shares: u32,

    /// Minimum shares required to unseal.
    #[arg(long, env = "UNSEALER_SECRET_THRESHOLD", default_value_t = 3)]
    secret_threshold: u32,

    /// Allow init to overwrite existing keystore entries.
    #[arg(long, env = "UNSEALER_OVERWRITE_EXISTING", default_value_t = false)]
    overwrite_existing: bool,

    /// Persist the root token in the keystore at init. When disabled the
    /// token is logged exactly once and never stored.
    #[arg(
        long,
        env = "UNSEALER_STORE_ROOT_TOKEN",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    store_root_token: bool,

    /// Log filter (e.g. `info`, `debug`, `unsealer_core=debug`).
    #[arg(long, env = "UNSEALER_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum KeyStoreKind {
    /// In-memory; shares are lost on exit. Development only.
    Memory,
    /// One file per key under a local directory.
    File,
    /// One object per key in an S3 bucket.
    #[cfg(feature = "s3-backend")]
    S3,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the vault and unseal it whenever it reports sealed.
    Run {
        /// Seconds between seal-status polls.
        #[arg(long, default_value_t = 10)]
        retry_period: u64,

        /// Perform one-time initialization before entering the poll loop.
        #[arg(long, default_value_t = false)]
        init: bool,
    },
    /// Initialize the vault once and persist the generated shares.
    Init,
    /// Unseal the vault using the stored shares, then exit.
    Unseal,
    /// Print whether the vault is sealed.
    Status,
    /// Probe keystore read/write access, then exit.
    Check,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = format!("{e:#}"), "unsealer failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let keystore = build_keystore(&cli).await?;
    let client = Arc::new(HttpVaultClient::new(cli.vault_addr.clone()));
    let options = VaultOptions {
        key_prefix: cli.key_prefix.clone(),
        secret_shares: cli.secret_shares,
        secret_threshold: cli.secret_threshold,
        overwrite_existing: cli.overwrite_existing,
        store_root_token: cli.store_root_token,
    };
    let orchestrator = UnsealOrchestrator::new(keystore, client, options);

    match cli.command {
        Commands::Run { retry_period, init } => {
            if init {
                orchestrator
                    .init()
                    .await
                    .context("one-time initialization failed")?;
                info!("vault initialized");
            }
            poll_loop(&orchestrator, Duration::from_secs(retry_period)).await
        }
        Commands::Init => {
            orchestrator
                .init()
                .await
                .context("vault initialization failed")?;
            info!("vault initialized");
            Ok(())
        }
        Commands::Unseal => {
            orchestrator.unseal().await.context("unseal failed")?;
            Ok(())
        }
        Commands::Status => {
            let sealed = orchestrator
                .sealed()
                .await
                .context("failed to query seal status")?;
            println!("{}", if sealed { "sealed" } else { "unsealed" });
            Ok(())
        }
        Commands::Check => {
            orchestrator
                .check_read_write_access()
                .await
                .context("keystore access check failed")?;
            Ok(())
        }
    }
}

/// Poll seal status and unseal whenever the vault reports sealed, until
/// ctrl-c. Errors inside the loop are logged and retried on the next tick;
/// retry policy lives here, never in the orchestrator.
async fn poll_loop(
    orchestrator: &UnsealOrchestrator,
    retry_period: Duration,
) -> anyhow::Result<()> {
    info!(retry_period_secs = retry_period.as_secs(), "entering unseal poll loop");
    loop {
        match orchestrator.sealed().await {
            Ok(false) => {}
            Ok(true) => {
                info!("vault is sealed, attempting unseal");
                if let Err(e) = orchestrator.unseal().await {
                    warn!(error = %e, "unseal attempt failed, will retry");
                }
            }
            Err(e) => {
                warn!(error = %e, "seal status check failed, will retry");
            }
        }

        tokio::select! {
            () = tokio::time::sleep(retry_period) => {}
            result = tokio::signal::ctrl_c() => {
                result.context("failed to listen for shutdown signal")?;
                info!("shutdown signal received, stopping poll loop");
                return Ok(());
            }
        }
    }
}

/// Construct the configured keystore backend. Selection happens here, once,
/// so the orchestrator only ever sees the trait object.
async fn build_keystore(cli: &Cli) -> anyhow::Result<Arc<dyn KeyStore>> {
    match cli.keystore {
        KeyStoreKind::Memory => {
            warn!("using in-memory keystore: shares will NOT survive this process");
            Ok(Arc::new(MemoryKeyStore::new()))
        }
        KeyStoreKind::File => {
            info!(path = %cli.file_path, "using file keystore");
            let store = FileKeyStore::open(&cli.file_path)
                .await
                .context("failed to open file keystore")?;
            Ok(Arc::new(store))
        }
        #[cfg(feature = "s3-backend")]
        KeyStoreKind::S3 => {
            let bucket = cli
                .s3_bucket
                .clone()
                .context("--s3-bucket is required with the s3 keystore")?;
            info!(bucket = %bucket, "using S3 keystore");
            let store = unsealer_keystore::S3KeyStore::connect(
                bucket,
                cli.s3_prefix.clone(),
                cli.s3_region.clone(),
            )
            .await;
            Ok(Arc::new(store))
        }
    }
}
