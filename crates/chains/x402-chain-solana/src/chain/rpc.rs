//! Ledger boundary.
//!
//! The settlement pipeline talks to Solana only through [`LedgerClientLike`], which any
//! container of a nonblocking [`RpcClient`] implements. Tests substitute an in-memory ledger.

use solana_account::Account;
use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::{RpcSendTransactionConfig, RpcTransactionConfig};
use solana_client::rpc_request::{RpcError, RpcResponseErrorData};
use solana_commitment_config::CommitmentConfig;
use solana_message::Hash;
use solana_pubkey::Pubkey;
use solana_signature::Signature;
use solana_transaction::versioned::VersionedTransaction;

/// Errors reported by the ledger boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// The request never got a definitive answer from the ledger.
    #[error("Ledger transport error: {0}")]
    Transport(String),
    /// The ledger refused or failed the transaction.
    #[error("Transaction rejected: {reason}")]
    Rejected { reason: String, logs: Vec<String> },
}

impl LedgerError {
    /// Transport failures are worth retrying; rejections are not.
    pub fn is_transient(&self) -> bool {
        matches!(self, LedgerError::Transport(_))
    }
}

impl From<ClientError> for LedgerError {
    fn from(error: ClientError) -> Self {
        match error.kind() {
            ClientErrorKind::RpcError(RpcError::RpcResponseError {
                message,
                data: RpcResponseErrorData::SendTransactionPreflightFailure(simulation),
                ..
            }) => LedgerError::Rejected {
                reason: simulation
                    .err
                    .as_ref()
                    .map(|e| format!("{e:?}"))
                    .unwrap_or_else(|| message.clone()),
                logs: simulation.logs.clone().unwrap_or_default(),
            },
            ClientErrorKind::TransactionError(e) => LedgerError::Rejected {
                reason: e.to_string(),
                logs: Vec::new(),
            },
            ClientErrorKind::SigningError(e) => LedgerError::Rejected {
                reason: e.to_string(),
                logs: Vec::new(),
            },
            _ => LedgerError::Transport(error.to_string()),
        }
    }
}

/// Processing status of a submitted transaction at the requested commitment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureStatus {
    /// Not yet seen at the requested commitment.
    Pending,
    Confirmed,
    /// Landed on-chain but the execution failed.
    Failed(String),
}

pub trait LedgerClientLike {
    /// Authoritative account read. `None` means the account does not exist.
    fn get_account(
        &self,
        pubkey: &Pubkey,
    ) -> impl Future<Output = Result<Option<Account>, LedgerError>> + Send;
    fn get_latest_blockhash(&self) -> impl Future<Output = Result<Hash, LedgerError>> + Send;
    /// Broadcasts a signed transaction, running preflight at `commitment`.
    fn send_transaction(
        &self,
        transaction: &VersionedTransaction,
        commitment: CommitmentConfig,
    ) -> impl Future<Output = Result<Signature, LedgerError>> + Send;
    fn get_signature_status(
        &self,
        signature: &Signature,
        commitment: CommitmentConfig,
    ) -> impl Future<Output = Result<SignatureStatus, LedgerError>> + Send;
    /// Program logs recorded for a landed transaction. Empty when the ledger kept none.
    fn get_transaction_logs(
        &self,
        signature: &Signature,
        commitment: CommitmentConfig,
    ) -> impl Future<Output = Result<Vec<String>, LedgerError>> + Send;
}

impl<Container: AsRef<RpcClient> + Send + Sync> LedgerClientLike for Container {
    async fn get_account(&self, pubkey: &Pubkey) -> Result<Option<Account>, LedgerError> {
        let response = self
            .as_ref()
            .get_account_with_commitment(pubkey, CommitmentConfig::confirmed())
            .await?;
        Ok(response.value)
    }

    async fn get_latest_blockhash(&self) -> Result<Hash, LedgerError> {
        let (blockhash, _last_valid_block_height) = self
            .as_ref()
            .get_latest_blockhash_with_commitment(CommitmentConfig::confirmed())
            .await?;
        Ok(blockhash)
    }

    async fn send_transaction(
        &self,
        transaction: &VersionedTransaction,
        commitment: CommitmentConfig,
    ) -> Result<Signature, LedgerError> {
        let config = RpcSendTransactionConfig {
            skip_preflight: false,
            preflight_commitment: Some(commitment.commitment),
            // Resubmission is driven by the settlement executor.
            max_retries: Some(0),
            ..RpcSendTransactionConfig::default()
        };
        let signature = self
            .as_ref()
            .send_transaction_with_config(transaction, config)
            .await?;
        Ok(signature)
    }

    async fn get_signature_status(
        &self,
        signature: &Signature,
        commitment: CommitmentConfig,
    ) -> Result<SignatureStatus, LedgerError> {
        let status = self
            .as_ref()
            .get_signature_status_with_commitment(signature, commitment)
            .await?;
        let status = match status {
            None => SignatureStatus::Pending,
            Some(Ok(())) => SignatureStatus::Confirmed,
            Some(Err(e)) => SignatureStatus::Failed(e.to_string()),
        };
        Ok(status)
    }

    async fn get_transaction_logs(
        &self,
        signature: &Signature,
        commitment: CommitmentConfig,
    ) -> Result<Vec<String>, LedgerError> {
        let config = RpcTransactionConfig {
            commitment: Some(commitment),
            max_supported_transaction_version: Some(0),
            ..RpcTransactionConfig::default()
        };
        let transaction = self
            .as_ref()
            .get_transaction_with_config(signature, config)
            .await?;
        let logs = transaction
            .transaction
            .meta
            .and_then(|meta| Option::<Vec<String>>::from(meta.log_messages))
            .unwrap_or_default();
        Ok(logs)
    }
}
