//! Wire format types for x402 payment messages.
//!
//! - [`challenge`]: the `402 Payment Required` body and the option selection policy
//! - [`proof`]: the proof of payment sent back in the `X-PAYMENT` header
//!
//! All types serialize to JSON using camelCase field names.

pub mod challenge;
pub mod proof;

pub use challenge::*;
pub use proof::*;
