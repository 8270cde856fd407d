use clap::Parser;
use dotenvy::dotenv;
use solana_client::nonblocking::rpc_client::RpcClient;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use x402_chain_solana::SettlementEngine;
use x402_chain_solana::chain::config::ConfigError;
use x402_chain_solana::settlement::PaymentFailure;
use x402_types::proto::{PAYMENT_HEADER, PaymentChallenge};

#[cfg(feature = "telemetry")]
use x402_chain_solana::settlement::TracingObserver;

use crate::config::CliArgs;

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Failed to read challenge: {0}")]
    ReadChallenge(#[from] std::io::Error),
    #[error("Invalid challenge document: {0}")]
    ParseChallenge(serde_json::Error),
    #[error("[{kind}] {0}", kind = .0.kind())]
    Payment(#[from] PaymentFailure),
    #[error("Failed to encode payment proof: {0}")]
    EncodeProof(serde_json::Error),
}

/// Pays one challenge and prints the resulting header line to stdout.
///
/// - Loads `.env` variables.
/// - Installs a `tracing` subscriber filtered by `RUST_LOG`, writing to stderr.
/// - Reads the payer configuration and the challenge document.
/// - Settles through the configured RPC endpoint.
pub async fn run() -> Result<(), RunError> {
    // Load .env variables
    dotenv().ok();

    #[cfg(feature = "telemetry")]
    {
        use tracing_subscriber::EnvFilter;
        use tracing_subscriber::layer::SubscriberExt;
        use tracing_subscriber::util::SubscriberInitExt;

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    let args = CliArgs::parse();
    let config = args.load_config()?;
    let challenge = read_challenge(&args).await?;

    let keypair = config.keypair()?;
    let rpc_url = config.rpc_url()?;
    let rpc = Arc::new(RpcClient::new(rpc_url.to_string()));
    let engine = SettlementEngine::new(rpc, keypair, config.preference())
        .with_settings(config.submit_settings());
    #[cfg(feature = "telemetry")]
    let engine = engine.with_observer(TracingObserver);

    #[cfg(feature = "telemetry")]
    tracing::info!(payer = %engine.payer(), rpc = %rpc_url, network = %config.network, "Settling payment challenge");

    let proof = engine.settle(&challenge).await?;
    let header = proof.to_header().map_err(RunError::EncodeProof)?;
    println!("{PAYMENT_HEADER}: {header}");
    Ok(())
}

async fn read_challenge(args: &CliArgs) -> Result<PaymentChallenge, RunError> {
    let content = if args.reads_stdin() {
        let mut content = String::new();
        tokio::io::stdin().read_to_string(&mut content).await?;
        content
    } else {
        tokio::fs::read_to_string(&args.challenge).await?
    };
    serde_json::from_str(&content).map_err(RunError::ParseChallenge)
}
