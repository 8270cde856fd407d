//! Client-side settlement of x402 payment challenges on Solana.
//!
//! A settlement attempt runs through fixed stages, each one a plain function that can also
//! be driven on its own:
//!
//! 1. Selection of a payment option from the challenge ([`x402_types::proto::PaymentChallenge::select_with`])
//! 2. [`verify`]: fresh ledger reads proving that the payer can pay
//! 3. [`build`]: transfer instructions, then [`TransferPlan::bind`] to a recent blockhash
//! 4. [`submit`]: signing, bounded resubmission and confirmation
//! 5. [`encode_proof`]: the envelope sent back to the resource server
//!
//! [`SettlementEngine`] chains the stages, reports progress to a [`SettlementObserver`] and
//! turns the outcome into either a [`PaymentProof`] or a [`PaymentFailure`].

pub mod build;
pub mod error;
pub mod execute;
pub mod observer;
pub mod proof;
pub mod types;
pub mod verify;

#[cfg(test)]
pub(crate) mod mock;

pub use build::*;
pub use error::*;
pub use execute::*;
pub use observer::*;
pub use proof::*;
pub use types::*;
pub use verify::*;

use solana_pubkey::Pubkey;
use solana_signature::Signature;
use solana_signer::Signer;
use std::sync::Arc;
use x402_types::proto::{
    FirstMatch, OptionSelector, PaymentChallenge, PaymentPreference, PaymentProof,
    SelectedPayment,
};
use x402_types::util::money_amount::MoneyAmount;

use crate::chain::rpc::LedgerClientLike;

/// A settlement attempt that did not produce a proof.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Payment failed before reaching {stage}: {error}")]
pub struct PaymentFailure {
    /// The stage the attempt was trying to reach.
    pub stage: SettlementStage,
    #[source]
    pub error: SettlementError,
}

impl PaymentFailure {
    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

/// A confirmed payment and its proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub proof: PaymentProof,
    pub signature: Signature,
    /// Settled amount in human units.
    pub amount: MoneyAmount,
    pub base_units: u64,
    pub recipient: Pubkey,
}

/// Settles payment challenges for one payer.
///
/// The engine keeps no state between attempts; concurrent calls are independent. Callers
/// sharing one signer across concurrent attempts are responsible for serializing them if the
/// ledger would otherwise see conflicting transactions.
pub struct SettlementEngine<L, S, O = NoopObserver> {
    ledger: L,
    signer: S,
    preference: PaymentPreference,
    selector: Arc<dyn OptionSelector>,
    settings: SubmitSettings,
    observer: O,
}

impl<L, S> SettlementEngine<L, S>
where
    L: LedgerClientLike,
    S: Signer,
{
    pub fn new(ledger: L, signer: S, preference: PaymentPreference) -> Self {
        Self {
            ledger,
            signer,
            preference,
            selector: Arc::new(FirstMatch),
            settings: SubmitSettings::default(),
            observer: NoopObserver,
        }
    }
}

impl<L, S, O> SettlementEngine<L, S, O> {
    pub fn with_observer<O2: SettlementObserver>(self, observer: O2) -> SettlementEngine<L, S, O2> {
        SettlementEngine {
            ledger: self.ledger,
            signer: self.signer,
            preference: self.preference,
            selector: self.selector,
            settings: self.settings,
            observer,
        }
    }

    pub fn with_settings(mut self, settings: SubmitSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Replaces the default [`FirstMatch`] option selection policy.
    pub fn with_selector<Sel: OptionSelector + 'static>(mut self, selector: Sel) -> Self {
        self.selector = Arc::new(selector);
        self
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn preference(&self) -> &PaymentPreference {
        &self.preference
    }

    pub fn settings(&self) -> &SubmitSettings {
        &self.settings
    }
}

impl<L, S, O> SettlementEngine<L, S, O>
where
    L: LedgerClientLike + Sync,
    S: Signer + Sync,
    O: SettlementObserver,
{
    /// Address paying for settlements, and the fee payer of every transaction.
    pub fn payer(&self) -> Pubkey {
        self.signer.pubkey()
    }

    /// Runs one settlement attempt and returns the proof to attach to the retried request.
    pub async fn settle(&self, challenge: &PaymentChallenge) -> Result<PaymentProof, PaymentFailure> {
        self.settle_with_receipt(challenge)
            .await
            .map(|receipt| receipt.proof)
    }

    /// Like [`SettlementEngine::settle`], also reporting what was paid.
    pub async fn settle_with_receipt(
        &self,
        challenge: &PaymentChallenge,
    ) -> Result<Receipt, PaymentFailure> {
        let payer = self.payer();

        let selected = challenge
            .select_with(&self.preference, self.selector.as_ref())
            .map_err(|e| self.fail(SettlementStage::Parsed, e.into()))?;
        self.reached(SettlementStage::Parsed, &selected);
        let option_id = selected.option.id.clone();

        let verified = verify(&self.ledger, selected, &payer)
            .await
            .map_err(|e| self.fail(SettlementStage::Verified, e))?;
        self.reached(SettlementStage::Verified, &verified.selected);

        let plan = build(&verified).map_err(|e| self.fail(SettlementStage::Built, e))?;
        let recent_blockhash = self
            .ledger
            .get_latest_blockhash()
            .await
            .map_err(|e| self.fail(SettlementStage::Built, e.into()))?;
        let transaction = plan
            .bind(&payer, recent_blockhash)
            .map_err(|e| self.fail(SettlementStage::Built, e))?;
        self.reached(SettlementStage::Built, &verified.selected);

        let signed =
            sign(&transaction, &self.signer).map_err(|e| self.fail(SettlementStage::Submitted, e))?;
        self.reached(SettlementStage::Submitted, &verified.selected);

        let result = submit_signed(&self.ledger, &signed, &transaction, &self.settings).await;
        let (signature, amount, base_units, recipient) = match result {
            SettlementResult::Settled {
                signature,
                amount,
                base_units,
                recipient,
            } => (signature, amount, base_units, recipient),
            SettlementResult::Failed { error } => {
                return Err(self.fail(SettlementStage::Settled, error));
            }
        };
        self.observer.on_event(&SettlementEvent::Stage {
            stage: SettlementStage::Settled,
            option_id,
        });

        Ok(Receipt {
            proof: proof_for(&signature, &payer, &verified.selected),
            signature,
            amount,
            base_units,
            recipient,
        })
    }

    fn reached(&self, stage: SettlementStage, selected: &SelectedPayment) {
        self.observer.on_event(&SettlementEvent::Stage {
            stage,
            option_id: selected.option.id.clone(),
        });
    }

    fn fail(&self, stage: SettlementStage, error: SettlementError) -> PaymentFailure {
        self.observer.on_event(&SettlementEvent::Failure {
            stage,
            kind: error.kind(),
            message: error.to_string(),
            logs: error.logs().to_vec(),
        });
        PaymentFailure { stage, error }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::rpc::{LedgerError, SignatureStatus};
    use crate::chain::token::fixtures::{mint_account, system_account, token_account};
    use crate::settlement::mock::{MockLedger, unique_pubkey};
    use crate::settlement::observer::recording::RecordingObserver;
    use solana_keypair::Keypair;
    use spl_associated_token_account::get_associated_token_address_with_program_id;
    use x402_types::proto::{ChallengeError, PaymentOption};

    const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

    fn native_challenge(recipient: &Pubkey, network: &str) -> PaymentChallenge {
        PaymentChallenge {
            version: "1.0".to_string(),
            payment_options: vec![PaymentOption {
                id: "sol".to_string(),
                scheme: "native".to_string(),
                network: network.to_string(),
                recipient: recipient.to_string(),
                token: None,
                amount: "0.01".to_string(),
                decimals: 9,
            }],
        }
    }

    fn engine(
        ledger: MockLedger,
        payer: Keypair,
        network: &str,
        scheme: &str,
    ) -> (
        SettlementEngine<MockLedger, Keypair, Arc<RecordingObserver>>,
        Arc<RecordingObserver>,
    ) {
        let observer = Arc::new(RecordingObserver::default());
        let engine = SettlementEngine::new(ledger, payer, PaymentPreference::new(network, scheme))
            .with_observer(observer.clone());
        (engine, observer)
    }

    #[tokio::test]
    async fn test_native_payment_settles() {
        let payer = Keypair::new();
        let recipient = unique_pubkey();
        let ledger = MockLedger::default().with_account(payer.pubkey(), system_account(LAMPORTS_PER_SOL));
        let payer_address = payer.pubkey();
        let (engine, observer) = engine(ledger, payer, "test", "native");

        let receipt = engine
            .settle_with_receipt(&native_challenge(&recipient, "test"))
            .await
            .unwrap();

        assert_eq!(receipt.amount.to_string(), "0.01");
        assert_eq!(receipt.base_units, 10_000_000);
        assert_eq!(receipt.recipient, recipient);
        assert_eq!(receipt.proof.payload.from, payer_address.to_string());
        assert_eq!(receipt.proof.payload.signature, receipt.signature.to_string());
        assert_eq!(receipt.proof.network, "test");

        let sent = engine.ledger().sent();
        assert_eq!(sent.len(), 1);
        let message = &sent[0].message;
        assert_eq!(message.instructions().len(), 1);
        let instruction = &message.instructions()[0];
        assert_eq!(
            *instruction.program_id(message.static_account_keys()),
            solana_system_interface::program::id()
        );
        assert_eq!(&instruction.data[4..], &10_000_000u64.to_le_bytes());
        assert_eq!(*message.recent_blockhash(), engine.ledger().blockhash());

        assert_eq!(
            observer.stages(),
            vec![
                SettlementStage::Parsed,
                SettlementStage::Verified,
                SettlementStage::Built,
                SettlementStage::Submitted,
                SettlementStage::Settled,
            ]
        );
    }

    #[tokio::test]
    async fn test_insufficient_native_balance_builds_nothing() {
        let payer = Keypair::new();
        let ledger =
            MockLedger::default().with_account(payer.pubkey(), system_account(LAMPORTS_PER_SOL / 1000));
        let (engine, observer) = engine(ledger, payer, "test", "native");

        let failure = engine
            .settle(&native_challenge(&unique_pubkey(), "test"))
            .await
            .unwrap_err();

        assert_eq!(failure.stage, SettlementStage::Verified);
        assert_eq!(
            failure.error,
            SettlementError::InsufficientFunds {
                have: 1_000_000,
                need: 10_000_000,
                decimals: 9,
            }
        );
        assert!(failure.to_string().contains("have 0.001, need 0.01"));
        assert_eq!(engine.ledger().blockhash_reads(), 0);
        assert!(engine.ledger().sent().is_empty());
        assert_eq!(observer.stages(), vec![SettlementStage::Parsed]);
        assert!(matches!(
            observer.events().last(),
            Some(SettlementEvent::Failure {
                kind: ErrorKind::InsufficientFunds,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_token_payment_creates_recipient_account_first() {
        let payer = Keypair::new();
        let recipient = unique_pubkey();
        let mint = unique_pubkey();
        let payer_ata = get_associated_token_address_with_program_id(&payer.pubkey(), &mint, &spl_token::id());
        let ledger = MockLedger::default()
            .with_account(mint, mint_account(6, spl_token::id()))
            .with_account(
                payer_ata,
                token_account(&mint, &payer.pubkey(), 5_000_000, spl_token::id()),
            );
        let (engine, _) = engine(ledger, payer, "devnet", "exact");
        let challenge = PaymentChallenge {
            version: "1.0".to_string(),
            payment_options: vec![PaymentOption {
                id: "usdc".to_string(),
                scheme: "exact".to_string(),
                network: "solana-devnet".to_string(),
                recipient: recipient.to_string(),
                token: Some(mint.to_string()),
                amount: "1.5".to_string(),
                decimals: 6,
            }],
        };

        let receipt = engine.settle_with_receipt(&challenge).await.unwrap();
        assert_eq!(receipt.base_units, 1_500_000);
        assert_eq!(receipt.proof.network, "solana-devnet");

        let sent = engine.ledger().sent();
        let message = &sent[0].message;
        let keys = message.static_account_keys();
        let programs: Vec<_> = message
            .instructions()
            .iter()
            .map(|ix| *ix.program_id(keys))
            .collect();
        assert_eq!(programs, vec![spl_associated_token_account::id(), spl_token::id()]);
    }

    #[tokio::test]
    async fn test_unmatched_network_makes_no_ledger_call() {
        let payer = Keypair::new();
        let (engine, observer) = engine(MockLedger::default(), payer, "mainnet", "native");

        let failure = engine
            .settle(&native_challenge(&unique_pubkey(), "devnet"))
            .await
            .unwrap_err();

        assert_eq!(failure.stage, SettlementStage::Parsed);
        assert_eq!(failure.kind(), ErrorKind::NoMatchingOption);
        assert_eq!(
            failure.error,
            SettlementError::Challenge(ChallengeError::NoMatchingOption {
                network: "mainnet".to_string(),
                scheme: "native".to_string(),
            })
        );
        assert_eq!(engine.ledger().calls(), 0);
        assert!(observer.stages().is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_version_is_rejected() {
        let payer = Keypair::new();
        let (engine, _) = engine(MockLedger::default(), payer, "test", "native");
        let mut challenge = native_challenge(&unique_pubkey(), "test");
        challenge.version = "2.0".to_string();

        let failure = engine.settle(&challenge).await.unwrap_err();
        assert_eq!(failure.kind(), ErrorKind::ProtocolVersionMismatch);
        assert_eq!(engine.ledger().calls(), 0);
    }

    #[tokio::test]
    async fn test_rejection_reports_ledger_logs() {
        let payer = Keypair::new();
        let ledger = MockLedger::default()
            .with_account(payer.pubkey(), system_account(LAMPORTS_PER_SOL))
            .with_send_outcomes(vec![Err(LedgerError::Rejected {
                reason: "Attempt to debit an account but found no record of a prior credit."
                    .to_string(),
                logs: vec!["Program 11111111111111111111111111111111 failed".to_string()],
            })]);
        let (engine, observer) = engine(ledger, payer, "test", "native");

        let failure = engine
            .settle(&native_challenge(&unique_pubkey(), "test"))
            .await
            .unwrap_err();

        assert_eq!(failure.stage, SettlementStage::Settled);
        assert_eq!(failure.kind(), ErrorKind::LedgerRejected);
        match observer.events().last() {
            Some(SettlementEvent::Failure { logs, .. }) => {
                assert_eq!(logs, &vec!["Program 11111111111111111111111111111111 failed".to_string()]);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirmation_timeout_is_not_settled() {
        let payer = Keypair::new();
        let ledger = MockLedger::default()
            .with_account(payer.pubkey(), system_account(LAMPORTS_PER_SOL))
            .with_final_status(SignatureStatus::Pending);
        let (engine, observer) = engine(ledger, payer, "test", "native");
        let engine = engine.with_settings(SubmitSettings {
            confirmation_timeout: std::time::Duration::from_secs(2),
            ..SubmitSettings::default()
        });

        let failure = engine
            .settle(&native_challenge(&unique_pubkey(), "test"))
            .await
            .unwrap_err();

        assert_eq!(failure.kind(), ErrorKind::ConfirmationTimeout);
        assert!(!observer.stages().contains(&SettlementStage::Settled));
    }

    struct LastMatch;

    impl OptionSelector for LastMatch {
        fn select<'a>(
            &self,
            options: &'a [PaymentOption],
            preference: &PaymentPreference,
        ) -> Option<&'a PaymentOption> {
            options.iter().rev().find(|option| preference.matches(option))
        }
    }

    #[tokio::test]
    async fn test_custom_selector_decides_among_matches() {
        let payer = Keypair::new();
        let ledger = MockLedger::default().with_account(payer.pubkey(), system_account(LAMPORTS_PER_SOL));
        let (engine, observer) = engine(ledger, payer, "test", "native");
        let engine = engine.with_selector(LastMatch);
        let mut challenge = native_challenge(&unique_pubkey(), "test");
        let mut second = challenge.payment_options[0].clone();
        second.id = "sol-small".to_string();
        second.amount = "0.005".to_string();
        challenge.payment_options.push(second);

        let receipt = engine.settle_with_receipt(&challenge).await.unwrap();
        assert_eq!(receipt.base_units, 5_000_000);
        assert!(matches!(
            observer.events().first(),
            Some(SettlementEvent::Stage { option_id, .. }) if option_id == "sol-small"
        ));
    }
}
