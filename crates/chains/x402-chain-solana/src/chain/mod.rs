//! Solana chain support for the payer.
//!
//! # Key Types
//!
//! - [`LedgerClientLike`](rpc::LedgerClientLike) - The ledger boundary: account reads, blockhash, submission
//! - [`Address`] - A Solana public key (base58-encoded)
//! - [`PayerConfig`](config::PayerConfig) - Network, scheme, RPC endpoint and signer of the payer
//! - [`Mint`](token::Mint) - SPL Token or Token-2022 mint information

pub mod config;
pub mod rpc;
pub mod token;
pub mod types;

pub use types::*;
