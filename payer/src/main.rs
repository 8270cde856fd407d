//! x402 payer entrypoint.
//!
//! Reads a payment challenge (the body of an HTTP 402 response), pays it on Solana and
//! prints the `X-PAYMENT` header to attach to the retried request.
//!
//! Usage:
//! - `x402-payer --challenge challenge.json`
//! - `curl -s https://api.example.com/paid | x402-payer --challenge -`
//!
//! Environment:
//! - `.env` values loaded at startup
//! - `CONFIG` points to the payer configuration (default `config.json`)
//! - `RUST_LOG` controls log output (feature `telemetry`)

mod config;
mod run;

use std::process;

use crate::run::run;

#[tokio::main]
async fn main() {
    let result = run().await;
    if let Err(e) = result {
        eprintln!("{e}");
        process::exit(1)
    }
}
