//! Proof of payment attached to the retried HTTP request.
//!
//! After a settlement is confirmed on the ledger, the payer sends the original request
//! again with a [`PAYMENT_HEADER`] whose value is the base64 form of a JSON
//! [`PaymentProof`]:
//!
//! ```json
//! {
//!   "x402Version": 1,
//!   "scheme": "exact",
//!   "network": "solana-devnet",
//!   "payload": {
//!     "signature": "5VERv8NMvzbJMEkV8xnrLkEaWRtSz9CosKDYjCJjBRnbJLgp8uirBgmQpjKhoR4tjF3ZpRzrFmBV6UjKdiSZkQUW",
//!     "from": "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin"
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::util::Base64Bytes;

/// Request header carrying the encoded payment proof.
pub const PAYMENT_HEADER: &str = "X-PAYMENT";

/// Marker for protocol version 1, serialized as the integer `1`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct X402Version1;

impl X402Version1 {
    pub const VALUE: u8 = 1;
}

impl Serialize for X402Version1 {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(Self::VALUE)
    }
}

impl<'de> Deserialize<'de> for X402Version1 {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let num = u8::deserialize(deserializer)?;
        if num == Self::VALUE {
            Ok(X402Version1)
        } else {
            Err(serde::de::Error::custom(format!(
                "expected version {}, got {}",
                Self::VALUE,
                num
            )))
        }
    }
}

/// Self-contained evidence that a payment was settled on the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentProof {
    pub x402_version: X402Version1,
    pub scheme: String,
    pub network: String,
    pub payload: ProofPayload,
}

/// Ledger-specific part of a [`PaymentProof`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofPayload {
    /// Confirmed transaction signature.
    pub signature: String,
    /// Address of the paying account.
    pub from: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ProofDecodeError {
    #[error("Invalid base64 in payment header: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("Invalid payment proof JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl PaymentProof {
    /// Encodes the proof as a header value: base64 of its JSON form.
    pub fn to_header(&self) -> Result<String, serde_json::Error> {
        Ok(Base64Bytes::encode_json(self)?.to_string())
    }

    /// Decodes a header value produced by [`PaymentProof::to_header`].
    pub fn from_header(value: &str) -> Result<Self, ProofDecodeError> {
        let bytes = Base64Bytes::from(value).decode()?;
        let proof = serde_json::from_slice(&bytes)?;
        Ok(proof)
    }
}
