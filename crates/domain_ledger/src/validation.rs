//! Input validation rules
//!
//! Every validator collects all violations instead of stopping at the first
//! one, so the caller can report them together.
//!
//! # Validation Rules
//!
//! ## Invoices
//! - Customer and truck must be selected
//! - Invoice date within the last 7 days and not in the future
//! - Gross weight in (0, 9999.999], cages weight in [0, 999.999] and below gross
//! - Cages count in [1, 999], unit price in (0, 99999.99], discount in [0, 100]
//! - Net weight positive and 0.5 to 50 kg per cage
//!
//! ## Customers
//! - Name 2 to 100 characters, phone up to 15 characters of digits,
//!   spaces and `-+()`, address up to 200 characters
//! - Credit limit in [0, 999999.99]
//!
//! ## Truck loads
//! - Truck selected, load date not in the future
//! - Total weight in (0, 9999.999], cages weight in [0, 999.999] and below total
//! - Cages count in [1, 999]

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::requests::{
    CreateCustomerRequest, CreateInvoiceRequest, CreateTruckLoadRequest, CreateTruckRequest,
    ProcessPaymentRequest,
};

/// Days an invoice may be back-dated
pub const MAX_INVOICE_AGE_DAYS: i64 = 7;

const MAX_NOTES_LEN: usize = 500;
const MAX_PHONE_LEN: usize = 15;
const MAX_MONEY: Decimal = dec!(999999.99);
const MAX_GROSS_WEIGHT: Decimal = dec!(9999.999);
const MAX_CAGES_WEIGHT: Decimal = dec!(999.999);
const MAX_CAGES_COUNT: i32 = 999;
const MAX_UNIT_PRICE: Decimal = dec!(99999.99);
const MIN_WEIGHT_PER_CAGE: Decimal = dec!(0.5);
const MAX_WEIGHT_PER_CAGE: Decimal = dec!(50);
const HIGH_CREDIT_LIMIT: Decimal = dec!(100000);

/// Result of a validation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    /// Whether the input is valid
    pub is_valid: bool,
    /// List of validation errors
    pub errors: Vec<String>,
    /// List of validation warnings (non-fatal issues)
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Creates a successful validation result
    pub fn ok() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Creates a failed validation result with errors
    pub fn fail(errors: Vec<String>) -> Self {
        Self {
            is_valid: false,
            errors,
            warnings: Vec::new(),
        }
    }

    /// Adds an error to the result
    pub fn add_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
        self.is_valid = false;
    }

    /// Adds a warning to the result
    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Adds an error when the condition holds
    pub fn check(&mut self, violated: bool, error: &str) {
        if violated {
            self.add_error(error);
        }
    }

    /// Merges another validation result into this one
    pub fn merge(&mut self, other: ValidationResult) {
        if !other.is_valid {
            self.is_valid = false;
        }
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::ok()
    }
}

/// A request checked against the business rules
///
/// The closed set of request kinds that carry extra rules beyond field
/// checks. Dispatch is a plain `match`.
#[derive(Debug, Clone, Copy)]
pub enum BusinessRequest<'a> {
    Truck(&'a CreateTruckRequest),
    TruckLoad(&'a CreateTruckLoadRequest),
    Customer(&'a CreateCustomerRequest),
    Invoice(&'a CreateInvoiceRequest),
    Payment(&'a ProcessPaymentRequest),
}

impl BusinessRequest<'_> {
    /// Runs the field checks and business rules for the request
    ///
    /// `today` is the business date used for date-window rules.
    pub fn validate(&self, today: NaiveDate) -> ValidationResult {
        match self {
            BusinessRequest::Truck(request) => validate_truck(request),
            BusinessRequest::TruckLoad(request) => validate_truck_load(request, today),
            BusinessRequest::Customer(request) => {
                let mut result = validate_customer(request);
                if request.credit_limit > HIGH_CREDIT_LIMIT {
                    result.add_warning("Credit limit exceeds typical business thresholds - please verify");
                }
                result
            }
            BusinessRequest::Invoice(request) => validate_invoice(request, today),
            BusinessRequest::Payment(request) => validate_payment(request, today),
        }
    }
}

/// Replaces Arabic-Indic and Persian digits with ASCII digits
pub fn normalize_digits(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            '\u{0660}'..='\u{0669}' => char::from(b'0' + (c as u32 - 0x0660) as u8),
            '\u{06F0}'..='\u{06F9}' => char::from(b'0' + (c as u32 - 0x06F0) as u8),
            '\u{066B}' => '.',
            other => other,
        })
        .collect()
}

/// True when the phone number uses only digits, spaces and `-+()`
pub fn is_valid_phone(phone: &str) -> bool {
    !phone.is_empty()
        && phone
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '+' | '(' | ')'))
}

fn exceeds_scale(value: Decimal, places: u32) -> bool {
    value.normalize().scale() > places
}

fn too_long(value: Option<&str>, max: usize) -> bool {
    value.is_some_and(|v| v.chars().count() > max)
}

fn validate_truck(request: &CreateTruckRequest) -> ValidationResult {
    let mut result = ValidationResult::ok();
    let number = request.truck_number.trim();
    result.check(number.is_empty(), "Truck number is required");
    result.check(number.chars().count() > 20, "Truck number cannot exceed 20 characters");
    let driver = request.driver_name.trim();
    result.check(driver.is_empty(), "Driver name is required");
    result.check(driver.chars().count() > 100, "Driver name cannot exceed 100 characters");
    if let Some(phone) = request.driver_phone.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        let phone = normalize_digits(phone);
        result.check(phone.chars().count() > MAX_PHONE_LEN, "Driver phone cannot exceed 15 characters");
        result.check(!is_valid_phone(&phone), "Driver phone contains invalid characters");
    }
    result
}

/// Checks the weighed figures of a load
pub fn validate_load_figures(
    total_weight: Decimal,
    cages_weight: Decimal,
    cages_count: i32,
    notes: Option<&str>,
) -> ValidationResult {
    let mut result = ValidationResult::ok();
    result.check(total_weight <= Decimal::ZERO, "Total weight must be greater than zero");
    result.check(total_weight > MAX_GROSS_WEIGHT, "Total weight cannot exceed 9999.999 kg");
    result.check(exceeds_scale(total_weight, 3), "Total weight cannot have more than 3 decimal places");
    result.check(cages_weight < Decimal::ZERO, "Cages weight cannot be negative");
    result.check(cages_weight > MAX_CAGES_WEIGHT, "Cages weight cannot exceed 999.999 kg");
    result.check(exceeds_scale(cages_weight, 3), "Cages weight cannot have more than 3 decimal places");
    result.check(
        cages_weight >= total_weight,
        "Cages weight cannot be greater than or equal to total weight",
    );
    result.check(cages_count <= 0, "Cages count must be greater than zero");
    result.check(cages_count > MAX_CAGES_COUNT, "Cages count cannot exceed 999");
    result.check(
        total_weight - cages_weight <= Decimal::ZERO,
        "Net weight (Total - Cages) must be greater than zero",
    );
    result.check(too_long(notes, MAX_NOTES_LEN), "Notes cannot exceed 500 characters");
    result
}

fn validate_truck_load(request: &CreateTruckLoadRequest, today: NaiveDate) -> ValidationResult {
    let mut result = ValidationResult::ok();
    result.check(!request.truck_id.is_assigned(), "Invalid truck selection");
    result.check(request.load_date > today, "Load date cannot be in the future");
    result.merge(validate_load_figures(
        request.total_weight,
        request.cages_weight,
        request.cages_count,
        request.notes.as_deref(),
    ));
    result
}

fn validate_customer(request: &CreateCustomerRequest) -> ValidationResult {
    let mut result = ValidationResult::ok();

    let name = request.customer_name.trim();
    if name.is_empty() {
        result.add_error("Customer name is required");
    } else {
        let len = name.chars().count();
        result.check(len < 2, "Customer name must be at least 2 characters long");
        result.check(len > 100, "Customer name cannot exceed 100 characters");
    }

    if let Some(phone) = request.phone_number.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        let phone = normalize_digits(phone);
        result.check(phone.chars().count() > MAX_PHONE_LEN, "Phone number cannot exceed 15 characters");
        result.check(!is_valid_phone(&phone), "Phone number contains invalid characters");
    }

    result.check(too_long(request.address.as_deref().map(str::trim), 200), "Address cannot exceed 200 characters");
    result.check(request.credit_limit < Decimal::ZERO, "Credit limit cannot be negative");
    result.check(request.credit_limit > MAX_MONEY, "Credit limit cannot exceed 999,999.99");
    result.check(exceeds_scale(request.credit_limit, 2), "Credit limit cannot have more than 2 decimal places");
    result
}

fn validate_invoice(request: &CreateInvoiceRequest, today: NaiveDate) -> ValidationResult {
    let mut result = ValidationResult::ok();

    result.check(!request.customer_id.is_assigned(), "Valid customer selection is required");
    result.check(!request.truck_id.is_assigned(), "Valid truck selection is required");

    result.check(request.invoice_date > today, "Invoice date cannot be in the future");
    result.check(
        request.invoice_date < today - Duration::days(MAX_INVOICE_AGE_DAYS),
        "Invoice date cannot be more than 7 days in the past",
    );

    let gross = request.gross_weight;
    let cages = request.cages_weight;
    result.check(gross <= Decimal::ZERO, "Gross weight must be greater than zero");
    result.check(gross > MAX_GROSS_WEIGHT, "Gross weight cannot exceed 9999.999 kg");
    result.check(exceeds_scale(gross, 3), "Gross weight cannot have more than 3 decimal places");
    result.check(cages < Decimal::ZERO, "Cages weight cannot be negative");
    result.check(cages > MAX_CAGES_WEIGHT, "Cages weight cannot exceed 999.999 kg");
    result.check(exceeds_scale(cages, 3), "Cages weight cannot have more than 3 decimal places");
    result.check(cages >= gross, "Cages weight must be less than gross weight");

    result.check(request.cages_count <= 0, "Cages count must be greater than zero");
    result.check(request.cages_count > MAX_CAGES_COUNT, "Cages count cannot exceed 999");

    result.check(request.unit_price <= Decimal::ZERO, "Unit price must be greater than zero");
    result.check(request.unit_price > MAX_UNIT_PRICE, "Unit price cannot exceed 99999.99");
    result.check(exceeds_scale(request.unit_price, 2), "Unit price cannot have more than 2 decimal places");

    result.check(
        request.discount_percentage < Decimal::ZERO || request.discount_percentage > dec!(100),
        "Discount percentage must be between 0 and 100",
    );
    result.check(
        exceeds_scale(request.discount_percentage, 2),
        "Discount percentage cannot have more than 2 decimal places",
    );

    let net = gross - cages;
    if net <= Decimal::ZERO {
        result.add_error("Net weight (gross - cages) must be greater than zero");
    } else if request.cages_count > 0 {
        let per_cage = net / Decimal::from(request.cages_count);
        result.check(
            per_cage < MIN_WEIGHT_PER_CAGE || per_cage > MAX_WEIGHT_PER_CAGE,
            "Weight per cage seems unreasonable (should be between 0.5 and 50 kg)",
        );
    }

    result.check(too_long(request.notes.as_deref(), MAX_NOTES_LEN), "Notes cannot exceed 500 characters");
    result
}

fn validate_payment(request: &ProcessPaymentRequest, today: NaiveDate) -> ValidationResult {
    let mut result = ValidationResult::ok();
    result.check(request.amount > MAX_MONEY, "Payment amount cannot exceed 999,999.99");
    result.check(exceeds_scale(request.amount, 2), "Payment amount cannot have more than 2 decimal places");
    result.check(
        request.payment_date.is_some_and(|date| date > today),
        "Payment date cannot be in the future",
    );
    result.check(
        too_long(request.reference_number.as_deref(), 100),
        "Reference number cannot exceed 100 characters",
    );
    result.check(too_long(request.notes.as_deref(), MAX_NOTES_LEN), "Notes cannot exceed 500 characters");
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::{CustomerId, TruckId};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 14).unwrap()
    }

    fn invoice() -> CreateInvoiceRequest {
        CreateInvoiceRequest {
            customer_id: CustomerId::new(1),
            truck_id: TruckId::new(1),
            invoice_date: today(),
            gross_weight: dec!(100.000),
            cages_weight: dec!(20.000),
            cages_count: 10,
            unit_price: dec!(10.00),
            discount_percentage: dec!(5),
            notes: None,
        }
    }

    #[test]
    fn test_valid_invoice() {
        let result = BusinessRequest::Invoice(&invoice()).validate(today());
        assert!(result.is_valid, "{:?}", result.errors);
    }

    #[test]
    fn test_invoice_collects_every_violation() {
        let mut request = invoice();
        request.customer_id = CustomerId::UNASSIGNED;
        request.truck_id = TruckId::UNASSIGNED;
        request.unit_price = Decimal::ZERO;
        request.discount_percentage = dec!(101);
        let result = BusinessRequest::Invoice(&request).validate(today());
        assert_eq!(
            result.errors,
            vec![
                "Valid customer selection is required",
                "Valid truck selection is required",
                "Unit price must be greater than zero",
                "Discount percentage must be between 0 and 100",
            ]
        );
    }

    #[test]
    fn test_invoice_date_window() {
        let mut request = invoice();
        request.invoice_date = today() - Duration::days(7);
        assert!(BusinessRequest::Invoice(&request).validate(today()).is_valid);

        request.invoice_date = today() - Duration::days(8);
        let result = BusinessRequest::Invoice(&request).validate(today());
        assert_eq!(result.errors, vec!["Invoice date cannot be more than 7 days in the past"]);

        request.invoice_date = today() + Duration::days(1);
        let result = BusinessRequest::Invoice(&request).validate(today());
        assert_eq!(result.errors, vec!["Invoice date cannot be in the future"]);
    }

    #[test]
    fn test_weight_per_cage_bounds() {
        let mut request = invoice();
        request.cages_count = 200;
        let result = BusinessRequest::Invoice(&request).validate(today());
        assert_eq!(
            result.errors,
            vec!["Weight per cage seems unreasonable (should be between 0.5 and 50 kg)"]
        );

        request.cages_count = 1;
        assert!(!BusinessRequest::Invoice(&request).validate(today()).is_valid);

        request.cages_count = 2;
        assert!(BusinessRequest::Invoice(&request).validate(today()).is_valid);
    }

    #[test]
    fn test_cages_heavier_than_gross() {
        let mut request = invoice();
        request.cages_weight = dec!(100.000);
        let result = BusinessRequest::Invoice(&request).validate(today());
        assert!(result.errors.contains(&"Cages weight must be less than gross weight".to_string()));
        assert!(result
            .errors
            .contains(&"Net weight (gross - cages) must be greater than zero".to_string()));
    }

    #[test]
    fn test_customer_rules() {
        let request = CreateCustomerRequest {
            customer_name: " A ".to_string(),
            phone_number: Some("079-12#".to_string()),
            address: None,
            credit_limit: dec!(-1),
        };
        let result = BusinessRequest::Customer(&request).validate(today());
        assert_eq!(
            result.errors,
            vec![
                "Customer name must be at least 2 characters long",
                "Phone number contains invalid characters",
                "Credit limit cannot be negative",
            ]
        );
    }

    #[test]
    fn test_customer_high_credit_is_warning() {
        let request = CreateCustomerRequest {
            customer_name: "Al Noor Market".to_string(),
            phone_number: Some("(079) 555-0101".to_string()),
            address: Some("Zarqa".to_string()),
            credit_limit: dec!(150000),
        };
        let result = BusinessRequest::Customer(&request).validate(today());
        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_arabic_digits_in_phone() {
        assert_eq!(normalize_digits("٠٧٩١٢٣٤٥٦٧"), "0791234567");
        assert_eq!(normalize_digits("۱۲٫۵"), "12.5");
        let request = CreateCustomerRequest {
            customer_name: "Souq Al Khudra".to_string(),
            phone_number: Some("٠٧٩١٢٣٤٥٦٧".to_string()),
            address: None,
            credit_limit: Decimal::ZERO,
        };
        assert!(BusinessRequest::Customer(&request).validate(today()).is_valid);
    }

    #[test]
    fn test_truck_load_rules() {
        let request = CreateTruckLoadRequest {
            truck_id: TruckId::new(1),
            load_date: today() + Duration::days(1),
            total_weight: dec!(50),
            cages_count: 0,
            cages_weight: dec!(50),
            notes: None,
        };
        let result = BusinessRequest::TruckLoad(&request).validate(today());
        assert_eq!(
            result.errors,
            vec![
                "Load date cannot be in the future",
                "Cages weight cannot be greater than or equal to total weight",
                "Cages count must be greater than zero",
                "Net weight (Total - Cages) must be greater than zero",
            ]
        );
    }

    #[test]
    fn test_payment_scale() {
        let request = ProcessPaymentRequest {
            amount: dec!(10.005),
            invoice_id: None,
            payment_date: Some(today()),
            payment_method: Default::default(),
            reference_number: None,
            notes: None,
        };
        let result = BusinessRequest::Payment(&request).validate(today());
        assert_eq!(result.errors, vec!["Payment amount cannot have more than 2 decimal places"]);
    }
}
