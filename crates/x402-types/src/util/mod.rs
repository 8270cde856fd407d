//! Utility types and functions for x402.
//!
//! - [`b64`] - Base64 encoding/decoding utilities
//! - [`money_amount`] - Exact decimal amounts and base unit conversion

pub mod b64;
pub mod money_amount;

pub use b64::*;
pub use money_amount::*;
