//! Ledger domain errors

use core_kernel::PortError;
use thiserror::Error;

use crate::result::{ErrorCode, ErrorKind};

/// Errors that can occur in the ledger domain
///
/// Services build these internally and translate them into a
/// [`ServiceResult`](crate::ServiceResult) at the operation boundary.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// One or more input rules were violated
    #[error("{message}")]
    Validation {
        message: String,
        errors: Vec<String>,
    },

    /// A single input value was rejected under its own error code
    #[error("{message}")]
    Rejected {
        code: ErrorCode,
        message: String,
    },

    /// A referenced entity does not exist or is inactive
    #[error("{message}")]
    NotFound {
        code: ErrorCode,
        message: String,
    },

    /// The operation clashes with existing data or a business rule
    #[error("{message}")]
    Conflict {
        code: ErrorCode,
        message: String,
    },

    /// The ledger arithmetic rejected its input
    #[error("Invalid calculation input: {0}")]
    InvalidCalculationInput(String),

    /// The store failed
    #[error("Persistence failure: {0}")]
    Persistence(#[from] PortError),
}

impl LedgerError {
    pub fn validation(message: impl Into<String>, errors: Vec<String>) -> Self {
        LedgerError::Validation {
            message: message.into(),
            errors,
        }
    }

    pub fn rejected(code: ErrorCode, message: impl Into<String>) -> Self {
        LedgerError::Rejected {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(code: ErrorCode, message: impl Into<String>) -> Self {
        LedgerError::NotFound {
            code,
            message: message.into(),
        }
    }

    pub fn conflict(code: ErrorCode, message: impl Into<String>) -> Self {
        LedgerError::Conflict {
            code,
            message: message.into(),
        }
    }

    /// Error-code token, when the error names one itself
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            LedgerError::Validation { .. } => Some(ErrorCode::ValidationError),
            LedgerError::Rejected { code, .. }
            | LedgerError::NotFound { code, .. }
            | LedgerError::Conflict { code, .. } => Some(*code),
            LedgerError::InvalidCalculationInput(_) => Some(ErrorCode::CalculationError),
            LedgerError::Persistence(_) => None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::Validation { .. } | LedgerError::InvalidCalculationInput(_) => {
                ErrorKind::Validation
            }
            LedgerError::Rejected { code, .. } => code.kind(),
            LedgerError::NotFound { .. } => ErrorKind::NotFound,
            LedgerError::Conflict { .. } => ErrorKind::Conflict,
            LedgerError::Persistence(_) => ErrorKind::Persistence,
        }
    }
}
