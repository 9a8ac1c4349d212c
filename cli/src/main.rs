use clap::Parser;
use colored::Colorize;
use sniper_core::error::CoreError;
use sniper_core::executor::{LaunchpadConstants, NativeTransactionSigner, SnipeExecutor};
use sniper_core::ingest::WsIngest;
use sniper_core::metrics::{Metrics, RpcMetrics};
use sniper_core::mint_validator::MintValidator;
use sniper_core::rate_limiter::RateLimiter;
use sniper_core::rpc::{InstrumentedRpc, NativeRpcClient, RpcClient};
use sniper_core::settings::{load_keypair_from_env_var, parse_private_key_string, Settings};
use sniper_core::Orchestrator;
use solana_sdk::signature::Keypair;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Realtime launchpad sniping daemon: subscribes to program logs, classifies
/// newly launched tokens, and dispatches a buy transaction on confidence.
#[derive(Parser, Debug)]
#[command(name = "sniper")]
#[command(about = "Launchpad sniping daemon")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Simulate the buy transaction without signing or sending it
    #[arg(long)]
    dry_run: bool,

    /// Override the env_logger filter (e.g. "debug", "sniper_core=trace")
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() {
    human_panic::setup_panic!();
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    if let Err(err) = run(cli).await {
        eprintln!("{} {err}", "error:".red().bold());
        std::process::exit(1);
    }
}

fn init_logging(override_filter: &Option<String>) {
    let env = match override_filter {
        Some(filter) => env_logger::Env::default().default_filter_or(filter.clone()),
        None => env_logger::Env::default().default_filter_or("info"),
    };
    env_logger::Builder::from_env(env).init();
}

async fn run(cli: Cli) -> Result<(), CoreError> {
    let config_path = cli.config.to_string_lossy().to_string();
    let settings = Settings::from_file(&config_path)?;
    settings.validate()?;

    log::info!(
        "sniper starting (pid {}), dry_run={}, subscriptions={}",
        std::process::id(),
        cli.dry_run,
        settings.program_subscriptions.len()
    );

    let keypair = load_keypair(&settings)?;
    let signer = NativeTransactionSigner::new(keypair);

    let metrics = Arc::new(Metrics::new(
        settings.program_subscriptions.iter().map(|d| d.label.clone()),
    ));

    let rpc_metrics = Arc::new(RpcMetrics::new());
    let rpc: Arc<dyn RpcClient> = Arc::new(InstrumentedRpc::new(
        NativeRpcClient::new(settings.rpc_url.clone()),
        Arc::new(RateLimiter::new(settings.rpc_rate_limit, settings.rpc_rate_limit)),
        settings.rpc_max_retries,
        rpc_metrics,
    ));

    let validator_limiter = Arc::new(RateLimiter::new(settings.rpc_rate_limit, settings.rpc_rate_limit));
    let validator = MintValidator::new(rpc.clone(), validator_limiter, settings.rpc_max_retries);

    let constants = LaunchpadConstants {
        launchpad_program: parse_pubkey(&settings.launchpad_program_id)?,
        global_fee_vault: parse_pubkey(&settings.global_fee_vault)?,
        config_authority: parse_pubkey(&settings.config_authority)?,
        buy_discriminator: settings.buy_discriminator()?,
    };
    let executor = SnipeExecutor::new(rpc.clone(), constants);

    let metrics_for_log = metrics.clone();
    let orchestrator = Arc::new(Orchestrator::new(settings.clone(), rpc, validator, executor, metrics));

    let message_limiter = Arc::new(RateLimiter::new(settings.socket_message_rate_limit, settings.socket_message_rate_limit));
    let ingest = Arc::new(WsIngest::new(
        settings.socket_url.clone(),
        settings.program_subscriptions.clone(),
        message_limiter,
    ));

    let (tx, rx) = tokio::sync::mpsc::channel(1024);

    let ingest_for_run = ingest.clone();
    let ingest_task = tokio::spawn(async move { ingest_for_run.run(tx).await });

    let orchestrator_for_run = orchestrator.clone();
    let dry_run = cli.dry_run;
    let orchestrator_task =
        tokio::spawn(async move { orchestrator_for_run.run(rx, &signer, dry_run).await });

    let orchestrator_for_sweep = orchestrator.clone();
    let dedup_sweep_task = tokio::spawn(async move { orchestrator_for_sweep.run_dedup_sweeper().await });

    let metrics_log_task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(10));
        loop {
            interval.tick().await;
            metrics_for_log.log_metrics();
        }
    });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            log::info!("sniper: SIGINT received, shutting down");
            orchestrator.request_shutdown();
            ingest.shutdown_handle().notify_waiters();
        }
        _ = ingest_task => {
            log::warn!("sniper: ingest task exited unexpectedly");
        }
        _ = orchestrator_task => {
            log::info!("sniper: orchestrator exited");
        }
    }

    metrics_log_task.abort();
    if let Err(e) = dedup_sweep_task.await {
        if !e.is_cancelled() {
            log::warn!("sniper: dedup sweeper task panicked: {e}");
        }
    }

    Ok(())
}

/// Wallet loading priority: base64 env var, then config `private_key_string`,
/// then config `keypair_json`, then a keypair file on disk.
fn load_keypair(settings: &Settings) -> Result<Keypair, CoreError> {
    if let Some(bytes) = load_keypair_from_env_var("SNIPER_KEYPAIR_B64") {
        return Keypair::try_from(bytes.as_slice()).map_err(|e| CoreError::InvalidKeypair(e.to_string()));
    }
    if let Some(pk_string) = &settings.wallet_private_key_string {
        let bytes = parse_private_key_string(pk_string).map_err(CoreError::InvalidKeypair)?;
        return Keypair::try_from(bytes.as_slice()).map_err(|e| CoreError::InvalidKeypair(e.to_string()));
    }
    if let Some(json) = &settings.wallet_keypair_json {
        let bytes: Vec<u8> = serde_json::from_str(json)?;
        return Keypair::try_from(bytes.as_slice()).map_err(|e| CoreError::InvalidKeypair(e.to_string()));
    }
    if let Some(path) = &settings.wallet_keypair_path {
        let bytes = std::fs::read(path)?;
        let parsed: Vec<u8> = serde_json::from_slice(&bytes)?;
        return Keypair::try_from(parsed.as_slice()).map_err(|e| CoreError::InvalidKeypair(e.to_string()));
    }
    Err(CoreError::InvalidKeypair(
        "no wallet keypair configured: set SNIPER_KEYPAIR_B64, wallet_private_key_string, \
         wallet_keypair_json, or wallet_keypair_path"
            .to_string(),
    ))
}

fn parse_pubkey(address: &str) -> Result<solana_sdk::pubkey::Pubkey, CoreError> {
    address
        .parse()
        .map_err(|e| CoreError::InvalidAddress(format!("{address}: {e}")))
}
