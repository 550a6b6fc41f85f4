//! Ledger arithmetic
//!
//! Computes the amounts of one invoice from the weighed quantities, the
//! price, the discount and the customer's balance before the invoice.
//!
//! Every step rounds to the stored scale (weights 3 places, money 2 places,
//! half to even) and the next step consumes the rounded value, so the stored
//! row always satisfies `final = total - discount` and
//! `current = previous + final` exactly.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use core_kernel::{round_money, round_weight, Percentage};

use crate::error::LedgerError;

/// Raw figures entered for an invoice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceCalculationInput {
    pub gross_weight: Decimal,
    pub cages_weight: Decimal,
    pub unit_price: Decimal,
    #[serde(default)]
    pub discount_percentage: Decimal,
    #[serde(default)]
    pub previous_balance: Decimal,
}

/// Amounts derived from an [`InvoiceCalculationInput`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceCalculation {
    pub net_weight: Decimal,
    pub total_amount: Decimal,
    pub discount_amount: Decimal,
    pub final_amount: Decimal,
    pub current_balance: Decimal,
}

/// Computes net weight, amounts and the resulting balance
///
/// # Errors
///
/// Returns `LedgerError::InvalidCalculationInput` when a weight or the price
/// is not positive, the cages weigh as much as the gross, or the discount is
/// outside 0 to 100, or when an amount does not fit in a `Decimal`.
///
/// # Example
///
/// ```rust
/// use domain_ledger::{calculate_invoice_amounts, InvoiceCalculationInput};
/// use rust_decimal_macros::dec;
///
/// let result = calculate_invoice_amounts(&InvoiceCalculationInput {
///     gross_weight: dec!(100.000),
///     cages_weight: dec!(20.000),
///     unit_price: dec!(10.00),
///     discount_percentage: dec!(5),
///     previous_balance: dec!(200.00),
/// })
/// .unwrap();
///
/// assert_eq!(result.final_amount, dec!(760.00));
/// assert_eq!(result.current_balance, dec!(960.00));
/// ```
pub fn calculate_invoice_amounts(
    input: &InvoiceCalculationInput,
) -> Result<InvoiceCalculation, LedgerError> {
    if input.gross_weight <= Decimal::ZERO
        || input.cages_weight < Decimal::ZERO
        || input.unit_price <= Decimal::ZERO
    {
        return Err(LedgerError::InvalidCalculationInput(
            "Weights must be non-negative and gross weight and unit price must be positive"
                .to_string(),
        ));
    }

    if input.cages_weight >= input.gross_weight {
        return Err(LedgerError::InvalidCalculationInput(
            "Cages weight must be less than gross weight".to_string(),
        ));
    }

    let discount = Percentage::new(input.discount_percentage).map_err(|_| {
        LedgerError::InvalidCalculationInput(
            "Discount percentage must be between 0 and 100".to_string(),
        )
    })?;

    let out_of_range =
        || LedgerError::InvalidCalculationInput("Amounts exceed the supported range".to_string());

    let net_weight = round_weight(input.gross_weight - input.cages_weight);
    let total_amount = round_money(
        net_weight
            .checked_mul(input.unit_price)
            .ok_or_else(out_of_range)?,
    );
    let discount_amount = round_money(discount.of(total_amount).ok_or_else(out_of_range)?);
    let final_amount = round_money(
        total_amount
            .checked_sub(discount_amount)
            .ok_or_else(out_of_range)?,
    );
    let current_balance = round_money(
        input
            .previous_balance
            .checked_add(final_amount)
            .ok_or_else(out_of_range)?,
    );

    debug!(
        %net_weight,
        %total_amount,
        %discount_amount,
        %final_amount,
        %current_balance,
        "Invoice amounts calculated"
    );

    Ok(InvoiceCalculation {
        net_weight,
        total_amount,
        discount_amount,
        final_amount,
        current_balance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn input(gross: Decimal, cages: Decimal, price: Decimal, discount: Decimal) -> InvoiceCalculationInput {
        InvoiceCalculationInput {
            gross_weight: gross,
            cages_weight: cages,
            unit_price: price,
            discount_percentage: discount,
            previous_balance: Decimal::ZERO,
        }
    }

    #[test]
    fn test_reference_invoice() {
        let mut reference = input(dec!(100.000), dec!(20.000), dec!(10.00), dec!(5));
        reference.previous_balance = dec!(200.00);
        let result = calculate_invoice_amounts(&reference).unwrap();

        assert_eq!(result.net_weight, dec!(80.000));
        assert_eq!(result.total_amount, dec!(800.00));
        assert_eq!(result.discount_amount, dec!(40.00));
        assert_eq!(result.final_amount, dec!(760.00));
        assert_eq!(result.current_balance, dec!(960.00));
    }

    #[test]
    fn test_half_cent_rounds_to_even() {
        // 0.125 kg * 1.00 = 0.125 -> 0.12
        let result = calculate_invoice_amounts(&input(dec!(1.125), dec!(1.000), dec!(1.00), dec!(0))).unwrap();
        assert_eq!(result.total_amount, dec!(0.12));
    }

    #[test]
    fn test_zero_cages_weight_allowed() {
        let result = calculate_invoice_amounts(&input(dec!(10), dec!(0), dec!(2.50), dec!(0))).unwrap();
        assert_eq!(result.final_amount, dec!(25.00));
    }

    #[test]
    fn test_full_discount() {
        let result = calculate_invoice_amounts(&input(dec!(10), dec!(1), dec!(3), dec!(100))).unwrap();
        assert_eq!(result.final_amount, Decimal::ZERO);
    }

    #[test]
    fn test_rejects_cages_equal_to_gross() {
        let err = calculate_invoice_amounts(&input(dec!(10), dec!(10), dec!(3), dec!(0))).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidCalculationInput(_)));
    }

    #[test]
    fn test_rejects_discount_out_of_range() {
        assert!(calculate_invoice_amounts(&input(dec!(10), dec!(1), dec!(3), dec!(100.5))).is_err());
        assert!(calculate_invoice_amounts(&input(dec!(10), dec!(1), dec!(3), dec!(-1))).is_err());
    }

    #[test]
    fn test_rejects_non_positive_price() {
        assert!(calculate_invoice_amounts(&input(dec!(10), dec!(1), dec!(0), dec!(0))).is_err());
    }

    #[test]
    fn test_rejects_amounts_beyond_decimal_range() {
        let err = calculate_invoice_amounts(&input(Decimal::MAX, dec!(0), dec!(10.00), dec!(0))).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidCalculationInput(_)));

        let mut balance = input(dec!(10), dec!(0), dec!(1.00), dec!(0));
        balance.previous_balance = Decimal::MAX;
        let err = calculate_invoice_amounts(&balance).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidCalculationInput(_)));
    }

    proptest! {
        #[test]
        fn prop_ledger_identities_hold_exactly(
            gross_g in 1_000i64..9_999_999i64,
            cages_fraction in 0u32..95,
            price_cents in 1i64..9_999_999i64,
            discount_bp in 0i64..=10_000i64,
            previous_cents in -1_000_000i64..100_000_000i64,
        ) {
            let gross = Decimal::new(gross_g, 3);
            let cages = round_weight(gross * Decimal::from(cages_fraction) / dec!(100));
            let calc = calculate_invoice_amounts(&InvoiceCalculationInput {
                gross_weight: gross,
                cages_weight: cages,
                unit_price: Decimal::new(price_cents, 2),
                discount_percentage: Decimal::new(discount_bp, 2),
                previous_balance: Decimal::new(previous_cents, 2),
            }).unwrap();

            prop_assert_eq!(calc.final_amount, calc.total_amount - calc.discount_amount);
            prop_assert_eq!(calc.current_balance, Decimal::new(previous_cents, 2) + calc.final_amount);
            prop_assert_eq!(calc.total_amount, round_money(calc.net_weight * Decimal::new(price_cents, 2)));
            prop_assert!(calc.net_weight > Decimal::ZERO);
            prop_assert!(calc.final_amount <= calc.total_amount);
        }
    }
}
