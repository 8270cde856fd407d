//! SPL token mints and token account state.

use solana_account::Account;
use solana_pubkey::Pubkey;
use spl_token::solana_program::program_pack::Pack;
use spl_token_2022::extension::StateWithExtensions;

use crate::chain::rpc::{LedgerClientLike, LedgerError};

/// Mint information for SPL tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mint {
    Token { decimals: u8, token_program: Pubkey },
    Token2022 { decimals: u8, token_program: Pubkey },
}

impl Mint {
    pub fn token_program(&self) -> &Pubkey {
        match self {
            Mint::Token { token_program, .. } => token_program,
            Mint::Token2022 { token_program, .. } => token_program,
        }
    }

    pub fn decimals(&self) -> u8 {
        match self {
            Mint::Token { decimals, .. } => *decimals,
            Mint::Token2022 { decimals, .. } => *decimals,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MintError {
    #[error("Mint account {0} does not exist")]
    Missing(Pubkey),
    #[error("Account {0} is not owned by a token program")]
    UnknownOwner(Pubkey),
    #[error("Failed to unpack mint {mint}: {reason}")]
    Unpack { mint: Pubkey, reason: String },
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Fetch mint information from the ledger.
///
/// The owning program of the mint account decides between SPL Token and Token-2022.
pub async fn fetch_mint<L: LedgerClientLike>(
    mint_pubkey: &Pubkey,
    ledger: &L,
) -> Result<Mint, MintError> {
    let account = ledger
        .get_account(mint_pubkey)
        .await?
        .ok_or(MintError::Missing(*mint_pubkey))?;
    if account.owner == spl_token::id() {
        let mint =
            spl_token::state::Mint::unpack(&account.data).map_err(|e| MintError::Unpack {
                mint: *mint_pubkey,
                reason: e.to_string(),
            })?;
        Ok(Mint::Token {
            decimals: mint.decimals,
            token_program: spl_token::id(),
        })
    } else if account.owner == spl_token_2022::id() {
        let mint = StateWithExtensions::<spl_token_2022::state::Mint>::unpack(&account.data)
            .map_err(|e| MintError::Unpack {
                mint: *mint_pubkey,
                reason: e.to_string(),
            })?;
        Ok(Mint::Token2022 {
            decimals: mint.base.decimals,
            token_program: spl_token_2022::id(),
        })
    } else {
        Err(MintError::UnknownOwner(*mint_pubkey))
    }
}

/// Decodes the balance of a token account from its raw account data.
///
/// Returns `None` if the account is not an initialized token account of a known program.
pub fn token_account_amount(account: &Account) -> Option<u64> {
    if account.owner == spl_token::id() {
        spl_token::state::Account::unpack(&account.data)
            .ok()
            .map(|state| state.amount)
    } else if account.owner == spl_token_2022::id() {
        StateWithExtensions::<spl_token_2022::state::Account>::unpack(&account.data)
            .ok()
            .map(|state| state.base.amount)
    } else {
        None
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::settlement::mock::unique_pubkey;

    #[test]
    fn test_token_account_amount_is_read_from_data() {
        let mint = unique_pubkey();
        let owner = unique_pubkey();
        let account = token_account(&mint, &owner, 1_500_000, spl_token::id());
        assert_eq!(token_account_amount(&account), Some(1_500_000));
    }

    #[test]
    fn test_token_account_amount_rejects_foreign_owner() {
        let account = system_account(1_000_000_000);
        assert_eq!(token_account_amount(&account), None);
    }
}
