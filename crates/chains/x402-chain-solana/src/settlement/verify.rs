//! Precondition checks against fresh ledger state.
//!
//! Balances are always decoded from a raw account read made right before building the
//! transaction. Balance summary endpoints can lag behind freshly funded accounts, so they
//! are never consulted.

use futures_util::future::try_join;
use solana_pubkey::Pubkey;
use spl_associated_token_account::get_associated_token_address_with_program_id;
use x402_types::proto::SelectedPayment;

use crate::chain::{Address, SOL_DECIMALS};
use crate::chain::rpc::LedgerClientLike;
use crate::chain::token::{MintError, fetch_mint, token_account_amount};
use crate::settlement::error::SettlementError;
use crate::settlement::types::{AccountState, PaymentAsset, VerifiedPayment};

fn parse_pubkey(value: &str) -> Result<Pubkey, SettlementError> {
    let address: Address = value.parse()?;
    Ok(address.into())
}

/// Confirms that `payer` can settle the selected payment.
///
/// # Errors
///
/// - [`SettlementError::InvalidAmount`] if the amount does not convert to base units
/// - [`SettlementError::InvalidAddress`] for a malformed recipient or mint
/// - [`SettlementError::InvalidAsset`] if the mint is unknown or its decimals disagree with the option
/// - [`SettlementError::PayerAccountMissing`] if the payer has never held the asset
/// - [`SettlementError::InsufficientFunds`] if the balance is below the amount
pub async fn verify<L: LedgerClientLike>(
    ledger: &L,
    selected: SelectedPayment,
    payer: &Pubkey,
) -> Result<VerifiedPayment, SettlementError> {
    let option = &selected.option;
    let amount = option
        .base_units()
        .map_err(|source| SettlementError::InvalidAmount {
            amount: option.amount.clone(),
            source,
        })?;
    let recipient = parse_pubkey(&option.recipient)?;

    match option.token() {
        None => verify_native(ledger, selected, payer, recipient, amount).await,
        Some(mint) => {
            let mint = parse_pubkey(mint)?;
            verify_token(ledger, selected, payer, recipient, mint, amount).await
        }
    }
}

async fn verify_native<L: LedgerClientLike>(
    ledger: &L,
    selected: SelectedPayment,
    payer: &Pubkey,
    recipient: Pubkey,
    amount: u64,
) -> Result<VerifiedPayment, SettlementError> {
    if selected.option.decimals != SOL_DECIMALS {
        return Err(SettlementError::InvalidAsset {
            asset: "native".to_string(),
            reason: format!(
                "SOL has {SOL_DECIMALS} decimals, option declares {}",
                selected.option.decimals
            ),
        });
    }
    let account = ledger
        .get_account(payer)
        .await?
        .ok_or_else(|| SettlementError::PayerAccountMissing(payer.to_string()))?;
    let payer_state = AccountState::from_account(*payer, &account, account.lamports);
    ensure_funds(&payer_state, amount, SOL_DECIMALS)?;

    #[cfg(feature = "telemetry")]
    tracing::debug!(payer = %payer, balance = payer_state.balance, amount, "Verified native payment");

    Ok(VerifiedPayment {
        selected,
        asset: PaymentAsset::Native,
        amount,
        payer_wallet: *payer,
        recipient,
        payer: payer_state,
        recipient_account: None,
    })
}

async fn verify_token<L: LedgerClientLike>(
    ledger: &L,
    selected: SelectedPayment,
    payer: &Pubkey,
    recipient: Pubkey,
    mint: Pubkey,
    amount: u64,
) -> Result<VerifiedPayment, SettlementError> {
    let mint_info = fetch_mint(&mint, ledger).await.map_err(|e| match e {
        MintError::Ledger(e) => e.into(),
        other => SettlementError::InvalidAsset {
            asset: mint.to_string(),
            reason: other.to_string(),
        },
    })?;
    let decimals = mint_info.decimals();
    if decimals != selected.option.decimals {
        return Err(SettlementError::InvalidAsset {
            asset: mint.to_string(),
            reason: format!(
                "mint has {decimals} decimals, option declares {}",
                selected.option.decimals
            ),
        });
    }
    let token_program = *mint_info.token_program();

    let payer_ata = get_associated_token_address_with_program_id(payer, &mint, &token_program);
    let recipient_ata =
        get_associated_token_address_with_program_id(&recipient, &mint, &token_program);
    let (payer_account, recipient_account) = try_join(
        ledger.get_account(&payer_ata),
        ledger.get_account(&recipient_ata),
    )
    .await?;

    let payer_account = payer_account
        .ok_or_else(|| SettlementError::PayerAccountMissing(payer_ata.to_string()))?;
    let balance =
        token_account_amount(&payer_account).ok_or_else(|| SettlementError::InvalidAsset {
            asset: mint.to_string(),
            reason: format!("{payer_ata} is not a token account"),
        })?;
    let payer_state = AccountState::from_account(payer_ata, &payer_account, balance);
    ensure_funds(&payer_state, amount, decimals)?;

    let recipient_state = match recipient_account {
        Some(account) => {
            let balance = token_account_amount(&account).unwrap_or_default();
            AccountState::from_account(recipient_ata, &account, balance)
        }
        None => AccountState::missing(recipient_ata),
    };

    #[cfg(feature = "telemetry")]
    tracing::debug!(
        payer = %payer,
        mint = %mint,
        balance = payer_state.balance,
        amount,
        recipient_ata_exists = recipient_state.exists,
        "Verified token payment"
    );

    Ok(VerifiedPayment {
        selected,
        asset: PaymentAsset::Token {
            mint,
            token_program,
            decimals,
        },
        amount,
        payer_wallet: *payer,
        recipient,
        payer: payer_state,
        recipient_account: Some(recipient_state),
    })
}

fn ensure_funds(payer: &AccountState, need: u64, decimals: u8) -> Result<(), SettlementError> {
    if payer.balance < need {
        return Err(SettlementError::InsufficientFunds {
            have: payer.balance,
            need,
            decimals,
        });
    }
    Ok(())
}
