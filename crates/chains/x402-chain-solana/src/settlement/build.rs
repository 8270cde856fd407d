//! Transfer transaction assembly.
//!
//! Building happens in two steps. [`build`] turns a verified payment into a
//! [`TransferPlan`], the ordered instruction list. [`TransferPlan::bind`] then compiles it
//! into a v0 message for a fee payer and a recent blockhash; callers fetch the blockhash
//! right before binding so it is as fresh as possible at submission.

use solana_instruction::Instruction;
use solana_message::v0::Message as MessageV0;
use solana_message::{Hash, VersionedMessage};
use solana_pubkey::Pubkey;
use solana_system_interface::instruction as system_instruction;
use spl_associated_token_account::instruction::create_associated_token_account_idempotent;

use crate::chain::SOL_DECIMALS;
use crate::settlement::error::SettlementError;
use crate::settlement::types::{PaymentAsset, SettlementTransaction, VerifiedPayment};

/// Ordered instructions of a transfer, not yet bound to a blockhash.
///
/// When present, the account creation instruction always comes first, so that both
/// instructions succeed or fail together within one transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferPlan {
    instructions: Vec<Instruction>,
    amount: u64,
    decimals: u8,
    recipient: Pubkey,
}

impl TransferPlan {
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Compiles the plan into a message paid for by `fee_payer`.
    pub fn bind(
        self,
        fee_payer: &Pubkey,
        recent_blockhash: Hash,
    ) -> Result<SettlementTransaction, SettlementError> {
        let message = MessageV0::try_compile(fee_payer, &self.instructions, &[], recent_blockhash)
            .map_err(|e| SettlementError::TransactionBuild(format!("{e:?}")))?;
        Ok(SettlementTransaction {
            message: VersionedMessage::V0(message),
            fee_payer: *fee_payer,
            recent_blockhash,
            amount: self.amount,
            decimals: self.decimals,
            recipient: self.recipient,
        })
    }
}

/// Assembles the instructions that settle `verified`.
///
/// - Native: one System Program transfer from the payer wallet to the recipient.
/// - Token: an idempotent associated token account creation, only if the recipient account
///   is missing, then a `TransferChecked` authorized by the payer wallet.
pub fn build(verified: &VerifiedPayment) -> Result<TransferPlan, SettlementError> {
    let payer = &verified.payer_wallet;
    let recipient = &verified.recipient;
    let (instructions, decimals) = match verified.asset {
        PaymentAsset::Native => (
            vec![system_instruction::transfer(payer, recipient, verified.amount)],
            SOL_DECIMALS,
        ),
        PaymentAsset::Token {
            mint,
            token_program,
            decimals,
        } => {
            let recipient_account = verified
                .recipient_account
                .as_ref()
                .ok_or_else(|| SettlementError::TransactionBuild(
                    "recipient token account was not verified".to_string(),
                ))?;
            let mut instructions = Vec::with_capacity(2);
            if !recipient_account.exists {
                instructions.push(create_associated_token_account_idempotent(
                    payer,
                    recipient,
                    &mint,
                    &token_program,
                ));
            }
            instructions.push(transfer_checked(
                &token_program,
                &verified.payer.address,
                &mint,
                &recipient_account.address,
                payer,
                verified.amount,
                decimals,
            )?);
            (instructions, decimals)
        }
    };

    #[cfg(feature = "telemetry")]
    tracing::debug!(
        instructions = instructions.len(),
        amount = verified.amount,
        recipient = %recipient,
        "Built transfer plan"
    );

    Ok(TransferPlan {
        instructions,
        amount: verified.amount,
        decimals,
        recipient: *recipient,
    })
}

fn transfer_checked(
    token_program: &Pubkey,
    source: &Pubkey,
    mint: &Pubkey,
    destination: &Pubkey,
    authority: &Pubkey,
    amount: u64,
    decimals: u8,
) -> Result<Instruction, SettlementError> {
    let instruction = if *token_program == spl_token_2022::id() {
        spl_token_2022::instruction::transfer_checked(
            token_program,
            source,
            mint,
            destination,
            authority,
            &[],
            amount,
            decimals,
        )
    } else {
        spl_token::instruction::transfer_checked(
            token_program,
            source,
            mint,
            destination,
            authority,
            &[],
            amount,
            decimals,
        )
    };
    instruction.map_err(|e| SettlementError::InvalidAsset {
        asset: mint.to_string(),
        reason: e.to_string(),
    })
}
