//! Uniform outcome of every service operation

use serde::{Deserialize, Serialize};
use std::fmt;

/// Broad category of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or out-of-range input, checked before any write
    Validation,
    /// A referenced entity does not exist or is inactive
    NotFound,
    /// The operation clashes with existing data or a business rule
    Conflict,
    /// The store failed; the transaction was rolled back
    Persistence,
}

/// Error-code token carried by a failed [`ServiceResult`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    InvalidSearchTerm,
    InvalidAmount,
    CustomerInvalid,
    TruckInvalid,
    CustomerNotFound,
    TruckNotFound,
    InvoiceNotFound,
    LoadNotFound,
    DuplicateCustomer,
    DuplicateTruck,
    DuplicateLoad,
    HasPayments,
    HasTransactions,
    HasRelatedInvoices,
    Overpayment,
    InvoiceAlreadyPaid,
    NumberGenerationError,
    CalculationError,
    CreationError,
    UpdateError,
    DeleteError,
    PaymentError,
    CompletionError,
    ReportError,
    RetrievalError,
}

impl ErrorCode {
    /// Returns the wire token, e.g. `DUPLICATE_LOAD`
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::InvalidSearchTerm => "INVALID_SEARCH_TERM",
            ErrorCode::InvalidAmount => "INVALID_AMOUNT",
            ErrorCode::CustomerInvalid => "CUSTOMER_INVALID",
            ErrorCode::TruckInvalid => "TRUCK_INVALID",
            ErrorCode::CustomerNotFound => "CUSTOMER_NOT_FOUND",
            ErrorCode::TruckNotFound => "TRUCK_NOT_FOUND",
            ErrorCode::InvoiceNotFound => "INVOICE_NOT_FOUND",
            ErrorCode::LoadNotFound => "LOAD_NOT_FOUND",
            ErrorCode::DuplicateCustomer => "DUPLICATE_CUSTOMER",
            ErrorCode::DuplicateTruck => "DUPLICATE_TRUCK",
            ErrorCode::DuplicateLoad => "DUPLICATE_LOAD",
            ErrorCode::HasPayments => "HAS_PAYMENTS",
            ErrorCode::HasTransactions => "HAS_TRANSACTIONS",
            ErrorCode::HasRelatedInvoices => "HAS_RELATED_INVOICES",
            ErrorCode::Overpayment => "OVERPAYMENT",
            ErrorCode::InvoiceAlreadyPaid => "INVOICE_ALREADY_PAID",
            ErrorCode::NumberGenerationError => "NUMBER_GENERATION_ERROR",
            ErrorCode::CalculationError => "CALCULATION_ERROR",
            ErrorCode::CreationError => "CREATION_ERROR",
            ErrorCode::UpdateError => "UPDATE_ERROR",
            ErrorCode::DeleteError => "DELETE_ERROR",
            ErrorCode::PaymentError => "PAYMENT_ERROR",
            ErrorCode::CompletionError => "COMPLETION_ERROR",
            ErrorCode::ReportError => "REPORT_ERROR",
            ErrorCode::RetrievalError => "RETRIEVAL_ERROR",
        }
    }

    /// Returns the failure category of this code
    pub fn kind(&self) -> ErrorKind {
        match self {
            ErrorCode::ValidationError
            | ErrorCode::InvalidSearchTerm
            | ErrorCode::InvalidAmount
            | ErrorCode::CalculationError => ErrorKind::Validation,
            ErrorCode::CustomerInvalid
            | ErrorCode::TruckInvalid
            | ErrorCode::CustomerNotFound
            | ErrorCode::TruckNotFound
            | ErrorCode::InvoiceNotFound
            | ErrorCode::LoadNotFound => ErrorKind::NotFound,
            ErrorCode::DuplicateCustomer
            | ErrorCode::DuplicateTruck
            | ErrorCode::DuplicateLoad
            | ErrorCode::HasPayments
            | ErrorCode::HasTransactions
            | ErrorCode::HasRelatedInvoices
            | ErrorCode::Overpayment
            | ErrorCode::InvoiceAlreadyPaid
            | ErrorCode::NumberGenerationError => ErrorKind::Conflict,
            ErrorCode::CreationError
            | ErrorCode::UpdateError
            | ErrorCode::DeleteError
            | ErrorCode::PaymentError
            | ErrorCode::CompletionError
            | ErrorCode::ReportError
            | ErrorCode::RetrievalError => ErrorKind::Persistence,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Success or failure of a service operation
///
/// Carries the payload on success; on failure, a human-readable message, an
/// error-code token and, for validation failures, every violated rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceResult<T> {
    pub is_success: bool,
    pub data: Option<T>,
    pub message: String,
    pub error_code: Option<ErrorCode>,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl<T> ServiceResult<T> {
    /// A successful result with payload
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            is_success: true,
            data: Some(data),
            message: message.into(),
            error_code: None,
            errors: Vec::new(),
        }
    }

    /// A failed result whose error list holds the message itself
    pub fn failure(code: ErrorCode, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            is_success: false,
            data: None,
            errors: vec![message.clone()],
            message,
            error_code: Some(code),
        }
    }

    /// A failed result listing every violated validation rule
    pub fn validation_failure(errors: Vec<String>, message: impl Into<String>) -> Self {
        Self {
            is_success: false,
            data: None,
            message: message.into(),
            error_code: Some(ErrorCode::ValidationError),
            errors,
        }
    }

    /// Failure category, if this is a failure
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error_code.map(|code| code.kind())
    }

    /// Converts the payload, keeping message and error details
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ServiceResult<U> {
        ServiceResult {
            is_success: self.is_success,
            data: self.data.map(f),
            message: self.message,
            error_code: self.error_code,
            errors: self.errors,
        }
    }
}
