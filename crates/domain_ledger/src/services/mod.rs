//! Ledger services
//!
//! Each service operation opens a fresh unit of work, runs its steps inside a
//! transaction when it writes, and reports the outcome as a
//! [`ServiceResult`]. The private `try_*` methods work with
//! [`LedgerError`] and `?`; the public methods translate at the boundary.

mod customer;
mod invoice;
mod truck_load;

pub use customer::CustomerService;
pub use invoice::InvoiceService;
pub use truck_load::TruckLoadService;

use tracing::{error, info, warn};

use crate::error::LedgerError;
use crate::ports::UnitOfWork;
use crate::result::{ErrorCode, ServiceResult};

/// Commits on success, rolls back on failure
///
/// A failed commit is returned as the error; a failed rollback is logged and
/// the original error is returned.
pub(crate) async fn finish_transaction<T>(
    uow: &mut dyn UnitOfWork,
    outcome: Result<T, LedgerError>,
) -> Result<T, LedgerError> {
    match outcome {
        Ok(value) => {
            uow.commit_transaction().await?;
            Ok(value)
        }
        Err(err) => {
            if uow.transaction_state().is_active() {
                if let Err(rollback_error) = uow.rollback_transaction().await {
                    error!(error = %rollback_error, "Failed to roll back transaction");
                }
            }
            Err(err)
        }
    }
}

/// Translates an operation outcome into a [`ServiceResult`]
///
/// Persistence failures are reported under `fallback` with a generic
/// message; the store's own error only reaches the log.
pub(crate) fn respond<T>(
    operation: &str,
    outcome: Result<T, LedgerError>,
    fallback: ErrorCode,
    success_message: impl FnOnce(&T) -> String,
) -> ServiceResult<T> {
    match outcome {
        Ok(data) => {
            let message = success_message(&data);
            info!(operation, "{}", message);
            ServiceResult::success(data, message)
        }
        Err(LedgerError::Validation { message, errors }) => {
            warn!(operation, ?errors, "{}", message);
            ServiceResult::validation_failure(errors, message)
        }
        Err(LedgerError::Persistence(port_error)) => {
            error!(operation, error = %port_error, "Persistence failure");
            ServiceResult::failure(fallback, format!("An error occurred while trying to {}", operation))
        }
        Err(other) => {
            let code = other.code().unwrap_or(fallback);
            warn!(operation, code = %code, "{}", other);
            ServiceResult::failure(code, other.to_string())
        }
    }
}

/// Trims free text, dropping it when nothing is left
pub(crate) fn clean_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::memory::{MemoryStore, MemoryUnitOfWork};
    use crate::result::ErrorKind;
    use core_kernel::PortError;

    #[test]
    fn test_persistence_failure_hides_store_details() {
        let outcome: Result<(), LedgerError> =
            Err(PortError::internal("relation \"invoices\" does not exist").into());
        let result = respond("create the invoice", outcome, ErrorCode::CreationError, |_| String::new());

        assert!(!result.is_success);
        assert_eq!(result.error_code, Some(ErrorCode::CreationError));
        assert!(!result.message.contains("relation"));
    }

    #[test]
    fn test_rejection_keeps_its_code() {
        let outcome: Result<(), LedgerError> =
            Err(LedgerError::rejected(ErrorCode::InvalidAmount, "Payment amount must be greater than zero"));
        let result = respond("process the payment", outcome, ErrorCode::PaymentError, |_| String::new());

        assert_eq!(result.error_code, Some(ErrorCode::InvalidAmount));
        assert_eq!(result.error_kind(), Some(ErrorKind::Validation));
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text(Some("  front gate ")), Some("front gate".to_string()));
        assert_eq!(clean_text(Some("   ")), None);
        assert_eq!(clean_text(None), None);
    }

    #[tokio::test]
    async fn test_failure_rolls_back_active_transaction() {
        let mut uow = MemoryUnitOfWork::new(MemoryStore::new());
        uow.begin_transaction().await.unwrap();

        let outcome: Result<(), LedgerError> =
            finish_transaction(&mut uow, Err(LedgerError::conflict(ErrorCode::HasPayments, "paid"))).await;

        assert!(outcome.is_err());
        assert!(!uow.transaction_state().is_active());
    }
}
