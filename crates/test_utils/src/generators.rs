//! Property-Based Test Generators
//!
//! Provides proptest strategies for ledger inputs that satisfy the
//! validation rules, so properties can be checked on every accepted input.

use proptest::prelude::*;
use rust_decimal::Decimal;

use domain_ledger::InvoiceCalculationInput;

/// Unit prices from 0.01 to 99999.99
pub fn unit_price_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..=9_999_999i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Discount percentages from 0.00 to 100.00
pub fn discount_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..=10_000i64).prop_map(|hundredths| Decimal::new(hundredths, 2))
}

/// Outstanding balances from 0.00 to 999999.99
pub fn balance_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..=99_999_999i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Calculation inputs with cages strictly lighter than gross
pub fn calculation_input_strategy() -> impl Strategy<Value = InvoiceCalculationInput> {
    (
        (2i64..=9_999_999i64),
        (0u32..=9_999u32),
        unit_price_strategy(),
        discount_strategy(),
        balance_strategy(),
    )
        .prop_map(|(gross_grams, cage_share, unit_price, discount_percentage, previous_balance)| {
            // cage_share is in ten-thousandths of the gross weight
            let cages_grams = gross_grams * i64::from(cage_share) / 10_000;
            InvoiceCalculationInput {
                gross_weight: Decimal::new(gross_grams, 3),
                cages_weight: Decimal::new(cages_grams, 3),
                unit_price,
                discount_percentage,
                previous_balance,
            }
        })
}

/// Payment amounts from 0.01 to `max`
pub fn payment_amount_strategy(max: Decimal) -> impl Strategy<Value = Decimal> {
    let max_cents = (max * Decimal::ONE_HUNDRED).trunc().mantissa().max(1) as i64;
    (1i64..=max_cents).prop_map(|cents| Decimal::new(cents, 2))
}
