//! Signing, submission and confirmation of settlement transactions.

use solana_commitment_config::CommitmentConfig;
use solana_signature::Signature;
use solana_signer::Signer;
use solana_transaction::versioned::VersionedTransaction;
use std::time::Duration;
use x402_types::util::money_amount::MoneyAmount;

use crate::chain::rpc::{LedgerClientLike, LedgerError, SignatureStatus};
use crate::settlement::error::SettlementError;
use crate::settlement::types::{SettlementResult, SettlementTransaction};

/// How a signed transaction is driven to a terminal outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitSettings {
    /// Resubmissions allowed after transient network failures.
    pub max_retries: u32,
    /// Deadline for the whole send and confirm cycle.
    pub confirmation_timeout: Duration,
    pub commitment: CommitmentConfig,
    /// Pause before a resubmission.
    pub retry_backoff: Duration,
    /// Pause between signature status polls.
    pub poll_interval: Duration,
}

impl Default for SubmitSettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            confirmation_timeout: Duration::from_secs(60),
            commitment: CommitmentConfig::confirmed(),
            retry_backoff: Duration::from_millis(200),
            poll_interval: Duration::from_millis(200),
        }
    }
}

/// Signs `transaction` with `signer`, which must be its only required signer.
///
/// The payer wallet is both fee payer and transfer authority, so one signature completes
/// the transaction.
pub fn sign<S: Signer>(
    transaction: &SettlementTransaction,
    signer: &S,
) -> Result<VersionedTransaction, SettlementError> {
    VersionedTransaction::try_new(transaction.message.clone(), &[signer])
        .map_err(|e| SettlementError::SigningFailed(e.to_string()))
}

/// Signs, submits and waits for `transaction` to be confirmed.
///
/// See [`submit_signed`] for the submission rules.
pub async fn submit<L, S>(
    ledger: &L,
    signer: &S,
    transaction: SettlementTransaction,
    settings: &SubmitSettings,
) -> SettlementResult
where
    L: LedgerClientLike,
    S: Signer,
{
    match sign(&transaction, signer) {
        Ok(signed) => submit_signed(ledger, &signed, &transaction, settings).await,
        Err(error) => SettlementResult::Failed { error },
    }
}

/// Submits an already signed `transaction` and waits for it to be confirmed.
///
/// Transient network failures are retried up to `max_retries` times by resending the
/// same signed transaction, so a retry can never result in a second transfer. A rejection
/// by the ledger ends the attempt immediately. If the deadline passes first, the result is
/// [`SettlementError::ConfirmationTimeout`]: the transaction may still land and is never
/// reported as settled.
pub async fn submit_signed<L: LedgerClientLike>(
    ledger: &L,
    signed: &VersionedTransaction,
    transaction: &SettlementTransaction,
    settings: &SubmitSettings,
) -> SettlementResult {
    let amount = match MoneyAmount::from_base_units(transaction.amount, transaction.decimals) {
        Ok(amount) => amount,
        Err(e) => {
            return SettlementResult::Failed {
                error: SettlementError::TransactionBuild(e.to_string()),
            };
        }
    };
    let Some(signature) = signed.signatures.first().copied() else {
        return SettlementResult::Failed {
            error: SettlementError::SigningFailed("Transaction carries no signature".to_string()),
        };
    };

    let outcome = tokio::time::timeout(
        settings.confirmation_timeout,
        send_and_confirm(ledger, signed, &signature, settings),
    )
    .await;

    match outcome {
        Ok(Ok(())) => {
            #[cfg(feature = "telemetry")]
            tracing::info!(%signature, amount = %amount, recipient = %transaction.recipient, "Payment settled");
            SettlementResult::Settled {
                signature,
                amount,
                base_units: transaction.amount,
                recipient: transaction.recipient,
            }
        }
        Ok(Err(error)) => {
            #[cfg(feature = "telemetry")]
            tracing::warn!(%signature, error = %error, "Payment failed");
            SettlementResult::Failed { error }
        }
        Err(_) => {
            #[cfg(feature = "telemetry")]
            tracing::warn!(%signature, timeout = ?settings.confirmation_timeout, "Confirmation deadline passed");
            SettlementResult::Failed {
                error: SettlementError::ConfirmationTimeout {
                    signature: signature.to_string(),
                },
            }
        }
    }
}

async fn send_and_confirm<L: LedgerClientLike>(
    ledger: &L,
    tx: &VersionedTransaction,
    signature: &Signature,
    settings: &SubmitSettings,
) -> Result<(), SettlementError> {
    let mut attempt = 0u32;
    loop {
        // An earlier send may have landed even though its response was lost.
        if attempt > 0 {
            match ledger.get_signature_status(signature, settings.commitment).await {
                Ok(SignatureStatus::Confirmed) => return Ok(()),
                Ok(SignatureStatus::Failed(reason)) => {
                    return Err(failed_on_chain(ledger, signature, reason, settings).await);
                }
                Ok(SignatureStatus::Pending) | Err(_) => {}
            }
        }
        match ledger.send_transaction(tx, settings.commitment).await {
            Ok(_) => return confirm(ledger, signature, settings).await,
            Err(LedgerError::Transport(reason)) => {
                attempt += 1;
                if attempt > settings.max_retries {
                    return Err(SettlementError::TransientNetwork(reason));
                }
                #[cfg(feature = "telemetry")]
                tracing::warn!(%signature, attempt, reason = %reason, "Resubmitting after transient failure");
                tokio::time::sleep(settings.retry_backoff).await;
            }
            Err(rejected) => return Err(rejected.into()),
        }
    }
}

async fn confirm<L: LedgerClientLike>(
    ledger: &L,
    signature: &Signature,
    settings: &SubmitSettings,
) -> Result<(), SettlementError> {
    loop {
        match ledger.get_signature_status(signature, settings.commitment).await {
            Ok(SignatureStatus::Confirmed) => return Ok(()),
            Ok(SignatureStatus::Failed(reason)) => {
                return Err(failed_on_chain(ledger, signature, reason, settings).await);
            }
            Ok(SignatureStatus::Pending) => {}
            Err(error) if error.is_transient() => {
                #[cfg(feature = "telemetry")]
                tracing::debug!(%signature, error = %error, "Status poll failed");
            }
            Err(error) => return Err(error.into()),
        }
        tokio::time::sleep(settings.poll_interval).await;
    }
}

/// Rejection for a transaction that passed preflight but failed on-chain, carrying the
/// program logs of the landed transaction. A failed log lookup leaves the logs empty.
async fn failed_on_chain<L: LedgerClientLike>(
    ledger: &L,
    signature: &Signature,
    reason: String,
    settings: &SubmitSettings,
) -> SettlementError {
    let logs = match ledger.get_transaction_logs(signature, settings.commitment).await {
        Ok(logs) => logs,
        Err(_error) => {
            #[cfg(feature = "telemetry")]
            tracing::debug!(%signature, error = %_error, "Failed to fetch transaction logs");
            Vec::new()
        }
    };
    SettlementError::LedgerRejected { reason, logs }
}
