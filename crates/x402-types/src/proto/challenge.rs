//! Payment challenge documents and payment option selection.
//!
//! A resource server answers an unpaid request with `402 Payment Required` and a
//! [`PaymentChallenge`] listing the ways it accepts payment. The payer picks one
//! [`PaymentOption`] whose network and scheme match its own [`PaymentPreference`].
//!
//! # Wire Format
//!
//! ```json
//! {
//!   "version": "1.0",
//!   "paymentOptions": [
//!     {
//!       "id": "article-42",
//!       "scheme": "exact",
//!       "network": "devnet",
//!       "recipient": "8qEoLvRsumJpNCn7Q5PT19W5X5g62TKjCaMBDVBpu1hr",
//!       "token": "native",
//!       "amount": "0.01",
//!       "decimals": 9
//!     }
//!   ]
//! }
//! ```
//!
//! # Selection Policy
//!
//! Selection is delegated to an [`OptionSelector`]. The default, [`FirstMatch`], returns
//! the first matching option in document order. When no option matches, selection fails
//! with [`ChallengeError::NoMatchingOption`]; it never falls back to a non-matching option.

use serde::{Deserialize, Serialize};

use crate::util::money_amount::{MoneyAmount, MoneyAmountParseError};

/// Challenge document version understood by this crate.
pub const CHALLENGE_VERSION: &str = "1.0";

/// Token marker meaning "the ledger's base coin".
pub const NATIVE_TOKEN: &str = "native";

/// HTTP 402 response body describing how a resource can be paid for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentChallenge {
    /// Version tag of the challenge document.
    #[serde(default = "challenge_defaults::version")]
    pub version: String,
    /// Accepted payment options, in the server's order of preference.
    #[serde(default)]
    pub payment_options: Vec<PaymentOption>,
}

mod challenge_defaults {
    pub fn version() -> String {
        super::CHALLENGE_VERSION.to_string()
    }
}

/// One way of paying for a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOption {
    pub id: String,
    pub scheme: String,
    pub network: String,
    pub recipient: String,
    /// Asset identifier; absent or `"native"` means the base ledger coin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Amount in human units, as a decimal string.
    pub amount: String,
    pub decimals: u8,
}

impl PaymentOption {
    /// Returns `true` if the option is paid in the ledger's base coin.
    pub fn is_native(&self) -> bool {
        self.token().is_none()
    }

    /// Returns the token asset identifier, or `None` for the base coin.
    pub fn token(&self) -> Option<&str> {
        match self.token.as_deref() {
            None | Some(NATIVE_TOKEN) => None,
            Some(token) => Some(token),
        }
    }

    /// Parses the human-denominated amount.
    pub fn money_amount(&self) -> Result<MoneyAmount, MoneyAmountParseError> {
        MoneyAmount::parse(&self.amount)
    }

    /// Parses the amount and converts it to base units using the option's decimals.
    pub fn base_units(&self) -> Result<u64, MoneyAmountParseError> {
        self.money_amount()?.to_base_units(self.decimals)
    }
}

/// The payer's own network and scheme configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentPreference {
    pub network: String,
    pub scheme: String,
}

impl PaymentPreference {
    pub fn new<N: Into<String>, S: Into<String>>(network: N, scheme: S) -> Self {
        Self {
            network: network.into(),
            scheme: scheme.into(),
        }
    }

    /// Returns `true` if the option is payable under this preference.
    ///
    /// Networks compare equal with or without a `solana-` prefix, so a `devnet`
    /// payer accepts a `solana-devnet` option. Schemes must be identical.
    pub fn matches(&self, option: &PaymentOption) -> bool {
        option.scheme == self.scheme
            && normalize_network(&option.network) == normalize_network(&self.network)
    }
}

fn normalize_network(network: &str) -> &str {
    network.strip_prefix("solana-").unwrap_or(network)
}

/// A payment option chosen for settlement, together with the payer's network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedPayment {
    pub option: PaymentOption,
    pub network: String,
}

/// Strategy for choosing among the options that match a [`PaymentPreference`].
pub trait OptionSelector: Send + Sync {
    fn select<'a>(
        &self,
        options: &'a [PaymentOption],
        preference: &PaymentPreference,
    ) -> Option<&'a PaymentOption>;
}

/// Default selector: the first matching option in document order wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstMatch;

impl OptionSelector for FirstMatch {
    fn select<'a>(
        &self,
        options: &'a [PaymentOption],
        preference: &PaymentPreference,
    ) -> Option<&'a PaymentOption> {
        options.iter().find(|option| preference.matches(option))
    }
}

/// Errors produced while interpreting a challenge document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChallengeError {
    #[error("No payment option for network '{network}' and scheme '{scheme}'")]
    NoMatchingOption { network: String, scheme: String },
    #[error("Unsupported challenge version '{actual}', expected {expected}")]
    ProtocolVersionMismatch {
        expected: &'static str,
        actual: String,
    },
}

impl PaymentChallenge {
    /// Checks that the document's major version is supported.
    pub fn check_version(&self) -> Result<(), ChallengeError> {
        let expected_major = CHALLENGE_VERSION.split('.').next();
        let actual_major = self.version.trim().split('.').next();
        if actual_major == expected_major {
            Ok(())
        } else {
            Err(ChallengeError::ProtocolVersionMismatch {
                expected: CHALLENGE_VERSION,
                actual: self.version.clone(),
            })
        }
    }

    /// Selects an option with the default [`FirstMatch`] policy.
    pub fn select_option(
        &self,
        preference: &PaymentPreference,
    ) -> Result<SelectedPayment, ChallengeError> {
        self.select_with(preference, &FirstMatch)
    }

    /// Selects an option with a custom [`OptionSelector`].
    ///
    /// Amounts and decimals are not validated here; converting the amount to base
    /// units is the first thing the settlement pipeline does with the selection.
    pub fn select_with<S: OptionSelector + ?Sized>(
        &self,
        preference: &PaymentPreference,
        selector: &S,
    ) -> Result<SelectedPayment, ChallengeError> {
        self.check_version()?;
        let option = selector
            .select(&self.payment_options, preference)
            .ok_or_else(|| ChallengeError::NoMatchingOption {
                network: preference.network.clone(),
                scheme: preference.scheme.clone(),
            })?;
        Ok(SelectedPayment {
            option: option.clone(),
            network: preference.network.clone(),
        })
    }
}
