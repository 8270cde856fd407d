use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use x402_types::proto::ChallengeError;
use x402_types::util::money_amount::{MoneyAmount, MoneyAmountParseError};

use crate::chain::AddressParseError;
use crate::chain::rpc::LedgerError;

/// Errors that end a settlement attempt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettlementError {
    #[error(transparent)]
    Challenge(#[from] ChallengeError),
    #[error("Invalid amount '{amount}': {source}")]
    InvalidAmount {
        amount: String,
        source: MoneyAmountParseError,
    },
    #[error("Invalid address '{0}'")]
    InvalidAddress(String),
    #[error("Invalid asset {asset}: {reason}")]
    InvalidAsset { asset: String, reason: String },
    /// The payer has never held the asset. Not retried.
    #[error("Payer account {0} does not exist")]
    PayerAccountMissing(String),
    #[error(
        "Insufficient funds: have {}, need {}",
        human_units(.have, .decimals),
        human_units(.need, .decimals)
    )]
    InsufficientFunds { have: u64, need: u64, decimals: u8 },
    #[error("Failed to build transaction: {0}")]
    TransactionBuild(String),
    #[error("Failed to sign transaction: {0}")]
    SigningFailed(String),
    #[error("Transaction rejected by the ledger: {reason}")]
    LedgerRejected { reason: String, logs: Vec<String> },
    #[error("Ledger unreachable: {0}")]
    TransientNetwork(String),
    /// The transaction may still land; the outcome is unknown.
    #[error("Transaction {signature} was not confirmed before the deadline")]
    ConfirmationTimeout { signature: String },
}

fn human_units(units: &u64, decimals: &u8) -> String {
    MoneyAmount::from_base_units(*units, *decimals)
        .map(|amount| amount.to_string())
        .unwrap_or_else(|_| units.to_string())
}

impl From<AddressParseError> for SettlementError {
    fn from(error: AddressParseError) -> Self {
        SettlementError::InvalidAddress(error.0)
    }
}

impl From<LedgerError> for SettlementError {
    fn from(error: LedgerError) -> Self {
        match error {
            LedgerError::Transport(reason) => SettlementError::TransientNetwork(reason),
            LedgerError::Rejected { reason, logs } => {
                SettlementError::LedgerRejected { reason, logs }
            }
        }
    }
}

impl SettlementError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SettlementError::Challenge(ChallengeError::NoMatchingOption { .. }) => {
                ErrorKind::NoMatchingOption
            }
            SettlementError::Challenge(ChallengeError::ProtocolVersionMismatch { .. }) => {
                ErrorKind::ProtocolVersionMismatch
            }
            SettlementError::InvalidAmount { .. } => ErrorKind::InvalidAmount,
            SettlementError::InvalidAddress(_) => ErrorKind::InvalidAddress,
            SettlementError::InvalidAsset { .. } => ErrorKind::InvalidAsset,
            SettlementError::PayerAccountMissing(_) => ErrorKind::PayerAccountMissing,
            SettlementError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            SettlementError::TransactionBuild(_) => ErrorKind::TransactionBuildFailed,
            SettlementError::SigningFailed(_) => ErrorKind::SigningFailed,
            SettlementError::LedgerRejected { .. } => ErrorKind::LedgerRejected,
            SettlementError::TransientNetwork(_) => ErrorKind::TransientNetworkError,
            SettlementError::ConfirmationTimeout { .. } => ErrorKind::ConfirmationTimeout,
        }
    }

    /// Program logs reported by the ledger, if any.
    pub fn logs(&self) -> &[String] {
        match self {
            SettlementError::LedgerRejected { logs, .. } => logs,
            _ => &[],
        }
    }
}

/// Stable, machine-readable failure category handed to the HTTP boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NoMatchingOption,
    ProtocolVersionMismatch,
    InvalidAmount,
    InvalidAddress,
    InvalidAsset,
    PayerAccountMissing,
    InsufficientFunds,
    TransactionBuildFailed,
    SigningFailed,
    LedgerRejected,
    TransientNetworkError,
    ConfirmationTimeout,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NoMatchingOption => "no_matching_option",
            ErrorKind::ProtocolVersionMismatch => "protocol_version_mismatch",
            ErrorKind::InvalidAmount => "invalid_amount",
            ErrorKind::InvalidAddress => "invalid_address",
            ErrorKind::InvalidAsset => "invalid_asset",
            ErrorKind::PayerAccountMissing => "payer_account_missing",
            ErrorKind::InsufficientFunds => "insufficient_funds",
            ErrorKind::TransactionBuildFailed => "transaction_build_failed",
            ErrorKind::SigningFailed => "signing_failed",
            ErrorKind::LedgerRejected => "ledger_rejected",
            ErrorKind::TransientNetworkError => "transient_network_error",
            ErrorKind::ConfirmationTimeout => "confirmation_timeout",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProofError {
    /// Proofs exist only for settled payments.
    #[error("Cannot encode a proof for an unsettled payment: {0}")]
    NotSettled(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_funds_in_human_units() {
        let error = SettlementError::InsufficientFunds {
            have: 1_000_000,
            need: 10_000_000,
            decimals: 9,
        };
        assert_eq!(
            error.to_string(),
            "Insufficient funds: have 0.001, need 0.01"
        );
        assert_eq!(error.kind(), ErrorKind::InsufficientFunds);
    }

    #[test]
    fn test_kind_serializes_as_snake_case() {
        for kind in [
            ErrorKind::NoMatchingOption,
            ErrorKind::TransientNetworkError,
            ErrorKind::ConfirmationTimeout,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_ledger_errors_map_to_kinds() {
        let transient: SettlementError = LedgerError::Transport("timeout".to_string()).into();
        assert_eq!(transient.kind(), ErrorKind::TransientNetworkError);
        let rejected: SettlementError = LedgerError::Rejected {
            reason: "custom program error: 0x1".to_string(),
            logs: vec!["Program log: Error: insufficient funds".to_string()],
        }
        .into();
        assert_eq!(rejected.kind(), ErrorKind::LedgerRejected);
        assert_eq!(rejected.logs().len(), 1);
    }
}
