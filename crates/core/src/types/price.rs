//! Type-safe price representation using decimal arithmetic.
//!
//! Prices are currency-agnostic amounts; the currency is only attached when
//! formatting for display.

use core::fmt;
use core::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative (got {0})")]
    Negative(Decimal),
    /// The amount is above [`Price::MAX`].
    #[error("price {0} exceeds the maximum of {max}", max = Price::MAX)]
    TooLarge(Decimal),
    /// The input could not be parsed as a decimal number.
    #[error("invalid price: {0}")]
    Invalid(String),
}

/// A non-negative monetary amount in minor-unit precision.
///
/// Amounts are rounded to two decimal places (midpoint away from zero) and
/// capped at [`Price::MAX`], so every price fits in an `f64` without loss.
/// Deserializes from either a JSON number or a numeric string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// A price of zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// The largest accepted price, `999999999999.99`.
    pub const MAX: Self = Self(Decimal::from_parts(276_447_231, 23_283, 0, false, 2));

    /// Create a new price, rounded to two decimal places.
    ///
    /// # Errors
    ///
    /// - [`PriceError::Negative`] if `amount` is below zero.
    /// - [`PriceError::TooLarge`] if the rounded amount is above [`Price::MAX`].
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        if rounded > Self::MAX.0 {
            return Err(PriceError::TooLarge(amount));
        }
        Ok(Self(rounded))
    }

    /// Create a price from a whole number of minor units (e.g. pesewas).
    #[must_use]
    pub fn from_minor_units(units: u32) -> Self {
        Self(Decimal::new(i64::from(units), 2))
    }

    /// The decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Format for display with a currency prefix, e.g. `GHS 80.00`.
    #[must_use]
    pub fn display(&self, currency: CurrencyCode) -> String {
        format_amount(self.0, currency)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount = Decimal::from_str(s.trim()).map_err(|_| PriceError::Invalid(s.to_owned()))?;
        Self::new(amount)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// Format an arbitrary decimal (such as a cart total) with a currency prefix.
#[must_use]
pub fn format_amount(amount: Decimal, currency: CurrencyCode) -> String {
    format!("{} {:.2}", currency.code(), amount.round_dp(2))
}

/// ISO 4217 currency codes used for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    GHS,
    USD,
    EUR,
    GBP,
}

impl CurrencyCode {
    /// The ISO code as a string.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::GHS => "GHS",
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
        }
    }
}

impl FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GHS" => Ok(Self::GHS),
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            other => Err(format!("unsupported currency: {other}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_price_rejected() {
        assert!(matches!(
            Price::new(Decimal::new(-1, 0)),
            Err(PriceError::Negative(_))
        ));
        assert!(Price::new(Decimal::ZERO).is_ok());
    }

    #[test]
    fn test_price_rounds_to_minor_units() {
        let price = Price::new("1234567.123456789123".parse().unwrap()).unwrap();
        assert_eq!(price.amount(), Decimal::new(123_456_712, 2));

        let half = Price::new(Decimal::new(80_005, 3)).unwrap();
        assert_eq!(half.amount(), Decimal::new(8001, 2));
    }

    #[test]
    fn test_price_upper_bound() {
        assert_eq!(Price::MAX.amount(), Decimal::new(99_999_999_999_999, 2));
        assert!(Price::new(Price::MAX.amount()).is_ok());
        assert!(matches!(
            Price::new(Decimal::new(100_000_000_000_000, 2)),
            Err(PriceError::TooLarge(_))
        ));
        assert!(matches!(
            Price::new(Decimal::from(10_u128.pow(20))),
            Err(PriceError::TooLarge(_))
        ));
    }

    #[test]
    fn test_parse_price() {
        let price: Price = "149.50".parse().unwrap();
        assert_eq!(price.amount(), Decimal::new(14950, 2));
        assert!("abc".parse::<Price>().is_err());
        assert!("-3".parse::<Price>().is_err());
    }

    #[test]
    fn test_display_with_currency() {
        let price = Price::from_minor_units(8000);
        assert_eq!(price.display(CurrencyCode::GHS), "GHS 80.00");
        assert_eq!(price.display(CurrencyCode::USD), "USD 80.00");
    }

    #[test]
    fn test_deserialize_number_and_string() {
        let from_number: Price = serde_json::from_str("80").unwrap();
        let from_string: Price = serde_json::from_str("\"80\"").unwrap();
        assert_eq!(from_number, from_string);
        assert!(serde_json::from_str::<Price>("-5").is_err());
    }

    #[test]
    fn test_currency_from_str() {
        assert_eq!("ghs".parse::<CurrencyCode>().unwrap(), CurrencyCode::GHS);
        assert!("XYZ".parse::<CurrencyCode>().is_err());
    }
}
