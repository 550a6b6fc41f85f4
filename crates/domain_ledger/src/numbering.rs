//! Invoice numbers
//!
//! An invoice number is the business date as `YYMMDD` followed by a
//! zero-padded 3-digit daily sequence: `250614003` is the third invoice of
//! 14 June 2025. The next number is derived from the greatest number already
//! stored under the day's prefix.

use chrono::NaiveDate;

use crate::error::LedgerError;
use crate::result::ErrorCode;

/// Length of the `YYMMDD` prefix
pub const PREFIX_LEN: usize = 6;

/// Highest sequence a day can reach while keeping 3 digits
pub const MAX_DAILY_SEQUENCE: u32 = 999;

/// The `YYMMDD` prefix for a date
pub fn invoice_number_prefix(date: NaiveDate) -> String {
    date.format("%y%m%d").to_string()
}

/// Reads the daily sequence out of an invoice number
pub fn parse_sequence(invoice_number: &str) -> Option<u32> {
    invoice_number.get(PREFIX_LEN..)?.parse().ok()
}

/// Computes the number following `last_for_day`
///
/// `last_for_day` is the greatest stored number starting with the prefix of
/// `date`. No previous number, or one whose sequence cannot be read, starts
/// the day at `001`.
///
/// # Errors
///
/// `NUMBER_GENERATION_ERROR` once the day has used all 999 numbers.
pub fn next_invoice_number(date: NaiveDate, last_for_day: Option<&str>) -> Result<String, LedgerError> {
    let prefix = invoice_number_prefix(date);
    let sequence = match last_for_day.and_then(parse_sequence) {
        Some(last) => last + 1,
        None => 1,
    };

    if sequence > MAX_DAILY_SEQUENCE {
        return Err(LedgerError::conflict(
            ErrorCode::NumberGenerationError,
            format!("Daily invoice sequence for {} is exhausted", prefix),
        ));
    }

    Ok(format!("{}{:03}", prefix, sequence))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn june_14() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 14).unwrap()
    }

    #[test]
    fn test_first_of_day() {
        assert_eq!(next_invoice_number(june_14(), None).unwrap(), "250614001");
    }

    #[test]
    fn test_increments_last() {
        assert_eq!(next_invoice_number(june_14(), Some("250614002")).unwrap(), "250614003");
        assert_eq!(next_invoice_number(june_14(), Some("250614099")).unwrap(), "250614100");
    }

    #[test]
    fn test_unparsable_restarts() {
        assert_eq!(next_invoice_number(june_14(), Some("250614abc")).unwrap(), "250614001");
        assert_eq!(next_invoice_number(june_14(), Some("2506")).unwrap(), "250614001");
    }

    #[test]
    fn test_exhausted_day() {
        let err = next_invoice_number(june_14(), Some("250614999")).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::NumberGenerationError));
    }

    proptest! {
        #[test]
        fn prop_numbers_increase_and_share_prefix(last in 1u32..999) {
            let previous = format!("250614{:03}", last);
            let next = next_invoice_number(june_14(), Some(&previous)).unwrap();
            prop_assert_eq!(next.len(), 9);
            prop_assert!(next.starts_with("250614"));
            prop_assert!(next > previous);
        }
    }
}
