//! Decimal precision rules for weights, money and percentages
//!
//! The database columns fix the scale of every stored quantity: weights keep
//! three decimal places, money and percentages keep two. Every computation
//! that feeds the debt ledger rounds to those scales with banker's rounding
//! (round half to even) so that stored balances reconcile exactly.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Decimal places kept for weights (kilograms)
pub const WEIGHT_SCALE: u32 = 3;

/// Decimal places kept for monetary amounts
pub const MONEY_SCALE: u32 = 2;

/// Decimal places kept for percentages
pub const PERCENT_SCALE: u32 = 2;

/// Errors that can occur during decimal operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Percentage {0} is outside the range 0 to 100")]
    InvalidPercentage(Decimal),

    #[error("Division by zero")]
    DivisionByZero,
}

/// Rounds using banker's rounding (round half to even)
pub fn round_half_even(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointNearestEven)
}

/// Rounds a weight to the stored scale
pub fn round_weight(value: Decimal) -> Decimal {
    round_half_even(value, WEIGHT_SCALE)
}

/// Rounds a monetary amount to the stored scale
pub fn round_money(value: Decimal) -> Decimal {
    round_half_even(value, MONEY_SCALE)
}

/// Rounds a percentage to the stored scale
pub fn round_percent(value: Decimal) -> Decimal {
    round_half_even(value, PERCENT_SCALE)
}

/// Expresses `part` as a percentage of `whole`, rounded to two places
///
/// Returns zero when `whole` is zero. The result is not clamped: a negative
/// `part` yields a negative percentage.
pub fn percentage_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    round_percent(part / whole * dec!(100))
}

/// A percentage in the closed range 0 to 100 (e.g. 5 for 5%)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Percentage {
    value: Decimal,
}

impl Percentage {
    /// Creates a percentage, rejecting values outside 0..=100
    pub fn new(value: Decimal) -> Result<Self, MoneyError> {
        if value < Decimal::ZERO || value > dec!(100) {
            return Err(MoneyError::InvalidPercentage(value));
        }
        Ok(Self { value })
    }

    /// Zero percent
    pub fn zero() -> Self {
        Self { value: Decimal::ZERO }
    }

    /// Returns the percentage value (5 for 5%)
    pub fn value(&self) -> Decimal {
        self.value
    }

    /// Returns the percentage as a fraction (0.05 for 5%)
    pub fn as_fraction(&self) -> Decimal {
        self.value / dec!(100)
    }

    /// Applies this percentage to an amount without rounding
    ///
    /// Returns `None` when the product does not fit in a `Decimal`.
    pub fn of(&self, amount: Decimal) -> Option<Decimal> {
        amount.checked_mul(self.as_fraction())
    }
}

impl TryFrom<Decimal> for Percentage {
    type Error = MoneyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Percentage> for Decimal {
    fn from(percentage: Percentage) -> Decimal {
        percentage.value
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.value.round_dp(PERCENT_SCALE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_half_even_ties() {
        assert_eq!(round_money(dec!(0.125)), dec!(0.12));
        assert_eq!(round_money(dec!(0.135)), dec!(0.14));
        assert_eq!(round_weight(dec!(1.0005)), dec!(1.000));
        assert_eq!(round_weight(dec!(1.0015)), dec!(1.002));
    }

    #[test]
    fn test_percentage_bounds() {
        assert!(Percentage::new(dec!(0)).is_ok());
        assert!(Percentage::new(dec!(100)).is_ok());
        assert_eq!(
            Percentage::new(dec!(100.01)),
            Err(MoneyError::InvalidPercentage(dec!(100.01)))
        );
        assert!(Percentage::new(dec!(-1)).is_err());
    }

    #[test]
    fn test_percentage_of_zero_whole() {
        assert_eq!(percentage_of(dec!(10), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(percentage_of(dec!(29.5), dec!(500)), dec!(5.90));
    }

    #[test]
    fn test_percentage_of_extreme_amount() {
        let full = Percentage::new(dec!(100)).unwrap();
        assert_eq!(full.of(Decimal::MAX), Some(Decimal::MAX));
        assert_eq!(Percentage::zero().of(Decimal::MAX), Some(Decimal::ZERO));
    }
}
