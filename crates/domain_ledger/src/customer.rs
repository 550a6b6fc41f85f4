//! Customers and their running debt

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::CustomerId;

use crate::validation::normalize_digits;

/// A buyer of poultry
///
/// `total_debt` is the authoritative current balance. It is only changed by
/// the invoice and payment operations, inside their transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub customer_name: String,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub credit_limit: Decimal,
    pub total_debt: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Customer {
    /// Creates an active customer with no debt
    pub fn new(
        customer_name: impl Into<String>,
        phone_number: Option<String>,
        address: Option<String>,
        credit_limit: Decimal,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: CustomerId::UNASSIGNED,
            customer_name: customer_name.into(),
            phone_number,
            address,
            credit_limit,
            total_debt: Decimal::ZERO,
            is_active: true,
            created_at: now,
            updated_at: None,
        }
    }

    /// Credit still available, never negative
    pub fn available_credit(&self) -> Decimal {
        (self.credit_limit - self.total_debt).max(Decimal::ZERO)
    }

    /// True when the customer owes money
    pub fn has_debt(&self) -> bool {
        self.total_debt > Decimal::ZERO
    }

    /// Trimmed, lower-cased name used for duplicate detection
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.customer_name)
    }

    /// Name contains the term (case-insensitive) or phone contains it
    pub fn matches_search(&self, term: &str) -> bool {
        let term = normalize_digits(term.trim());
        let needle = term.to_lowercase();
        self.customer_name.to_lowercase().contains(&needle)
            || self
                .phone_number
                .as_deref()
                .is_some_and(|phone| phone.contains(term.as_str()))
    }
}

/// Normalizes a customer name for comparison
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn customer() -> Customer {
        let mut customer = Customer::new(
            "  Abu Khalil Poultry ",
            Some("0791234567".to_string()),
            None,
            dec!(5000),
            Utc::now(),
        );
        customer.total_debt = dec!(6200);
        customer
    }

    #[test]
    fn test_available_credit_floors_at_zero() {
        assert_eq!(customer().available_credit(), Decimal::ZERO);
    }

    #[test]
    fn test_normalized_name() {
        assert_eq!(customer().normalized_name(), "abu khalil poultry");
    }

    #[test]
    fn test_search_by_name_or_phone() {
        let customer = customer();
        assert!(customer.matches_search("KHALIL"));
        assert!(customer.matches_search("123"));
        assert!(customer.matches_search("١٢٣"));
        assert!(!customer.matches_search("market"));
    }
}
