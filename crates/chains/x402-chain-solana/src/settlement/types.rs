use solana_account::Account;
use solana_message::{Hash, VersionedMessage};
use solana_pubkey::Pubkey;
use solana_signature::Signature;
use x402_types::proto::SelectedPayment;
use x402_types::util::money_amount::MoneyAmount;

use crate::settlement::error::SettlementError;

/// Freshly read state of one ledger account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountState {
    pub address: Pubkey,
    pub exists: bool,
    /// Owning program, `None` when the account does not exist.
    pub owner: Option<Pubkey>,
    /// Balance in base units of the asset being paid.
    pub balance: u64,
}

impl AccountState {
    pub fn missing(address: Pubkey) -> Self {
        Self {
            address,
            exists: false,
            owner: None,
            balance: 0,
        }
    }

    pub fn from_account(address: Pubkey, account: &Account, balance: u64) -> Self {
        Self {
            address,
            exists: true,
            owner: Some(account.owner),
            balance,
        }
    }
}

/// What is being moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentAsset {
    /// Lamports, moved by the System Program.
    Native,
    Token {
        mint: Pubkey,
        token_program: Pubkey,
        decimals: u8,
    },
}

/// A selected payment whose preconditions hold on the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedPayment {
    pub selected: SelectedPayment,
    pub asset: PaymentAsset,
    /// Amount in base units.
    pub amount: u64,
    /// Paying wallet, the transfer authority.
    pub payer_wallet: Pubkey,
    /// Recipient wallet.
    pub recipient: Pubkey,
    /// Payer system account (native) or payer token account (token).
    pub payer: AccountState,
    /// Recipient token account. Never read for native transfers.
    pub recipient_account: Option<AccountState>,
}

/// A transaction bound to its fee payer and blockhash, ready to be signed.
#[derive(Debug, Clone, PartialEq)]
pub struct SettlementTransaction {
    pub message: VersionedMessage,
    pub fee_payer: Pubkey,
    pub recent_blockhash: Hash,
    pub amount: u64,
    pub decimals: u8,
    pub recipient: Pubkey,
}

/// Terminal outcome of one settlement attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementResult {
    Settled {
        signature: Signature,
        /// Settled amount in human units.
        amount: MoneyAmount,
        base_units: u64,
        recipient: Pubkey,
    },
    Failed {
        error: SettlementError,
    },
}

impl SettlementResult {
    pub fn is_success(&self) -> bool {
        matches!(self, SettlementResult::Settled { .. })
    }

    pub fn signature(&self) -> Option<&Signature> {
        match self {
            SettlementResult::Settled { signature, .. } => Some(signature),
            SettlementResult::Failed { .. } => None,
        }
    }
}
