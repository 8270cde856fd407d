use solana_pubkey::Pubkey;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Decimal places of the native SOL coin (1 SOL = 10^9 lamports).
pub const SOL_DECIMALS: u8 = 9;

/// An account address as written in a payment challenge.
///
/// Parsing trims surrounding whitespace and keeps the rejected input in the error, so a
/// malformed recipient can be reported verbatim.
///
/// # Example
///
/// ```
/// use x402_chain_solana::chain::Address;
/// use std::str::FromStr;
///
/// let addr = Address::from_str(" EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v ").unwrap();
/// assert_eq!(addr.to_string(), "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v");
/// assert!(Address::from_str("R").is_err());
/// ```
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct Address(Pubkey);

impl From<Address> for Pubkey {
    fn from(address: Address) -> Self {
        address.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid address '{0}'")]
pub struct AddressParseError(pub String);

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pubkey::from_str(s.trim())
            .map(Self)
            .map_err(|_| AddressParseError(s.to_string()))
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}
