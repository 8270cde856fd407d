//! Exact decimal money amounts and base unit conversion.
//!
//! Payment challenges carry amounts as human-denominated decimal strings
//! (`"0.01"` SOL, `"1.50"` USDC). Ledgers move integer base units
//! (lamports, token atoms). This module converts between the two without ever
//! going through binary floating point.
//!
//! # Supported Formats
//!
//! - Plain numbers: `"100"`, `"0.01"`, `"0"`
//! - With currency symbols: `"$10.50"`, `"€20"`
//! - With thousand separators: `"1,000"`, `"1,000,000.50"`
//!
//! # Example
//!
//! ```rust
//! use x402_types::util::money_amount::MoneyAmount;
//!
//! let amount = MoneyAmount::parse("0.01").unwrap();
//! assert_eq!(amount.to_base_units(9).unwrap(), 10_000_000);
//!
//! let back = MoneyAmount::from_base_units(10_000_000, 9).unwrap();
//! assert_eq!(back.to_string(), "0.01");
//! ```

use regex::Regex;
use rust_decimal::Decimal;
use std::fmt;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::LazyLock;

/// A parsed, non-negative monetary amount with exact decimal precision.
///
/// The [`scale`](MoneyAmount::scale) method returns the number of decimal places,
/// and [`mantissa`](MoneyAmount::mantissa) returns the value as an integer.
/// For example, `"10.50"` has scale 2 and mantissa 1050.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoneyAmount(pub Decimal);

impl MoneyAmount {
    /// Returns the number of decimal places in the original input.
    pub fn scale(&self) -> u32 {
        self.0.scale()
    }

    /// Returns the value as an unsigned integer (without decimal point).
    ///
    /// For example, `"12.34"` returns `1234`.
    pub fn mantissa(&self) -> u128 {
        self.0.mantissa().unsigned_abs()
    }
}

/// Errors that can occur when parsing or converting a monetary amount.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyAmountParseError {
    /// The input string could not be parsed as a number.
    #[error("Invalid number format")]
    InvalidFormat,
    /// The value is outside the allowed range.
    #[error("Amount must be between 0 and {}", constants::MAX_STR)]
    OutOfRange,
    /// Negative values are not allowed.
    #[error("Negative value is not allowed")]
    Negative,
}

mod constants {
    use super::*;

    pub const MAX_STR: &str = "999999999";

    /// Largest scale `rust_decimal` can represent.
    pub const MAX_SCALE: u32 = 28;

    pub static MAX: LazyLock<Decimal> =
        LazyLock::new(|| Decimal::from_str(MAX_STR).expect("valid decimal"));

    /// Currency symbols.
    pub static DECORATION: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[$€£]+").expect("valid regex"));

    /// Comma grouped integer part: `1,000` or `12,345,678.90`, never `0,01`.
    pub static GROUPED: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^-?[1-9]\d{0,2}(,\d{3})+(\.\d*)?$").expect("valid regex"));
}

impl MoneyAmount {
    /// Parses a human-readable currency string into a [`MoneyAmount`].
    ///
    /// Currency symbols and surrounding whitespace are stripped before parsing. Commas are accepted only
    /// as thousand separators in groups of three before the decimal point, so a decimal
    /// comma (`"0,01"`) is rejected instead of being read as a larger amount. Whatever is
    /// left must be a plain decimal number.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The string cannot be parsed as a number (including exponent notation)
    /// - The value is negative
    /// - The value is above the allowed range
    pub fn parse(input: &str) -> Result<Self, MoneyAmountParseError> {
        let mut cleaned = constants::DECORATION
            .replace_all(input.trim(), "")
            .trim()
            .to_string();
        if cleaned.contains(',') {
            if !constants::GROUPED.is_match(&cleaned) {
                return Err(MoneyAmountParseError::InvalidFormat);
            }
            cleaned.retain(|c| c != ',');
        }
        if cleaned.is_empty() || cleaned.contains(['e', 'E']) {
            return Err(MoneyAmountParseError::InvalidFormat);
        }

        let parsed =
            Decimal::from_str(&cleaned).map_err(|_| MoneyAmountParseError::InvalidFormat)?;

        if parsed.is_sign_negative() && !parsed.is_zero() {
            return Err(MoneyAmountParseError::Negative);
        }

        if parsed > *constants::MAX {
            return Err(MoneyAmountParseError::OutOfRange);
        }

        Ok(MoneyAmount(parsed.abs()))
    }

    /// Converts the amount into integer base units for an asset with `decimals` places.
    ///
    /// Digits below the smallest unit are truncated toward zero, never rounded up.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyAmountParseError::OutOfRange`] if the result does not fit in `u64`.
    pub fn to_base_units(&self, decimals: u8) -> Result<u64, MoneyAmountParseError> {
        let scale = self.scale();
        let token_scale = decimals as u32;
        let mantissa = self.mantissa();
        let units = if scale <= token_scale {
            let multiplier = 10u128
                .checked_pow(token_scale - scale)
                .ok_or(MoneyAmountParseError::OutOfRange)?;
            mantissa
                .checked_mul(multiplier)
                .ok_or(MoneyAmountParseError::OutOfRange)?
        } else {
            let divisor = 10u128
                .checked_pow(scale - token_scale)
                .ok_or(MoneyAmountParseError::OutOfRange)?;
            mantissa / divisor
        };
        u64::try_from(units).map_err(|_| MoneyAmountParseError::OutOfRange)
    }

    /// Builds a human-denominated amount from integer base units.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyAmountParseError::OutOfRange`] if `decimals` exceeds what
    /// a decimal value can represent.
    pub fn from_base_units(units: u64, decimals: u8) -> Result<Self, MoneyAmountParseError> {
        let scale = decimals as u32;
        if scale > constants::MAX_SCALE {
            return Err(MoneyAmountParseError::OutOfRange);
        }
        Ok(MoneyAmount(Decimal::from_i128_with_scale(units as i128, scale)))
    }
}

impl FromStr for MoneyAmount {
    type Err = MoneyAmountParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MoneyAmount::parse(s)
    }
}

impl TryFrom<&str> for MoneyAmount {
    type Error = MoneyAmountParseError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        MoneyAmount::from_str(value)
    }
}

impl Display for MoneyAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}
