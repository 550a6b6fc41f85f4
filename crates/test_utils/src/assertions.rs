//! Custom Test Assertions
//!
//! Provides assertion helpers for service results and ledger rows that give
//! more meaningful failure messages than plain `assert!`.

use std::fmt::Debug;

use rust_decimal::Decimal;

use core_kernel::round_money;
use domain_ledger::{ErrorCode, Invoice, ServiceResult};

/// Asserts that an operation succeeded and returns its payload
///
/// # Panics
///
/// Panics with the failure message and errors when the result is a failure
pub fn assert_success<T: Debug>(result: &ServiceResult<T>) -> &T {
    assert!(
        result.is_success,
        "Expected success, got {:?}: {} {:?}",
        result.error_code, result.message, result.errors
    );
    result
        .data
        .as_ref()
        .expect("successful result carries data")
}

/// Asserts that an operation failed with the given code
pub fn assert_failure<T: Debug>(result: &ServiceResult<T>, code: ErrorCode) {
    assert!(!result.is_success, "Expected {} failure, got success: {:?}", code, result.data);
    assert_eq!(
        result.error_code,
        Some(code),
        "Unexpected error code, message: {}",
        result.message
    );
    assert!(result.data.is_none(), "Failed result should carry no data");
}

/// Asserts a validation failure listing a message that contains `fragment`
pub fn assert_validation_error<T: Debug>(result: &ServiceResult<T>, fragment: &str) {
    assert_failure(result, ErrorCode::ValidationError);
    assert!(
        result.errors.iter().any(|e| e.contains(fragment)),
        "No validation error contains {:?}; errors were {:?}",
        fragment,
        result.errors
    );
}

/// Asserts the arithmetic identities of a stored invoice
///
/// `total == round₂(net × price)`, `final == total − discount` and
/// `current == previous + final` must hold exactly.
pub fn assert_invoice_consistent(invoice: &Invoice) {
    assert_eq!(
        invoice.total_amount,
        round_money(invoice.net_weight * invoice.unit_price),
        "Total of {} is not net weight times unit price",
        invoice.invoice_number
    );
    assert_eq!(
        invoice.final_amount,
        invoice.total_amount - invoice.discount_amount,
        "Final amount of {} is not total minus discount",
        invoice.invoice_number
    );
    assert_eq!(
        invoice.current_balance,
        invoice.previous_balance + invoice.final_amount,
        "Current balance of {} is not previous balance plus final amount",
        invoice.invoice_number
    );
}

/// Asserts two amounts are equal after rounding to 2 decimal places
pub fn assert_money_eq(actual: Decimal, expected: Decimal) {
    assert_eq!(
        round_money(actual),
        round_money(expected),
        "Amounts differ: actual={}, expected={}",
        actual,
        expected
    );
}
