#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Solana settlement of x402 payment challenges.
//!
//! A resource server answers an unpaid request with a payment challenge listing the
//! options it accepts. This crate lets a client pay one of them on Solana and produce the
//! proof to attach to the retried request.
//!
//! # Features
//!
//! - **Native and SPL payments**: System Program transfers for SOL, `TransferChecked` through
//!   SPL Token or Token-2022 for token mints
//! - **Fresh preconditions**: balances are decoded from raw account reads, never from
//!   cached balance endpoints
//! - **Idempotent account creation**: a missing recipient token account is created in the
//!   same transaction as the transfer
//! - **Bounded retries**: transient failures resend the same signed transaction, under a
//!   confirmation deadline
//!
//! # Architecture
//!
//! - [`chain`] - Ledger boundary, token program helpers and payer configuration
//! - [`settlement`] - The staged pipeline and the [`SettlementEngine`](settlement::SettlementEngine)
//!
//! # Feature Flags
//!
//! - `telemetry` - `tracing` events from every stage, and the
//!   [`TracingObserver`](settlement::TracingObserver)
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use x402_chain_solana::SolanaCluster;
//! use solana_client::nonblocking::rpc_client::RpcClient;
//! use x402_chain_solana::settlement::SettlementEngine;
//! use x402_types::proto::{PaymentChallenge, PaymentPreference};
//!
//! let rpc = Arc::new(RpcClient::new(SolanaCluster::Devnet.rpc_url().to_string()));
//! let engine = SettlementEngine::new(rpc, keypair, PaymentPreference::new("devnet", "exact"));
//!
//! let challenge: PaymentChallenge = serde_json::from_str(&body)?;
//! let proof = engine.settle(&challenge).await?;
//! request.header(x402_types::proto::PAYMENT_HEADER, proof.to_header()?);
//! ```

pub mod chain;
pub mod settlement;

mod networks;
pub use networks::*;

pub use settlement::{PaymentFailure, Receipt, SettlementEngine};
