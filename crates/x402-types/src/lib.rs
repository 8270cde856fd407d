#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for the x402 payment protocol, payer side.
//!
//! This crate provides the chain-agnostic pieces of an HTTP 402 payment flow: the
//! payment challenge a resource server answers with, the policy used to pick one of
//! its payment options, and the payment proof sent back once the transfer has settled.
//!
//! # Overview
//!
//! When a client requests a paid resource, the server responds with `402 Payment Required`
//! and a [`PaymentChallenge`](proto::PaymentChallenge). The client selects an option that
//! matches its own network and scheme, pays on-chain, and retries the request with a
//! [`PaymentProof`](proto::PaymentProof) encoded in the `X-PAYMENT` header.
//!
//! # Modules
//!
//! - [`config`] - Environment variable resolution for configuration values
//! - [`proto`] - Wire format types: challenge, option selection, payment proof
//! - [`util`] - Helper types (base64, exact money amounts)
//!
//! Chain-specific settlement lives in separate crates such as `x402-chain-solana`.

pub mod config;
pub mod proto;
pub mod util;
