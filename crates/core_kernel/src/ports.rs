//! Port traits shared by every store adapter
//!
//! The ledger services talk to storage only through the unit-of-work and
//! repository ports declared in `domain_ledger`. Two adapters implement them:
//! PostgreSQL in `infra_db` and the in-memory store used by tests. Both
//! report failures as [`PortError`] and expose a [`HealthCheckable`] probe,
//! so a service can roll back and translate a failure without knowing which
//! store produced it.

use std::fmt;
use thiserror::Error;
use serde::{Deserialize, Serialize};

/// Failure reported by a store adapter
#[derive(Debug, Error)]
pub enum PortError {
    /// The requested entity was not found
    #[error("Not found: {entity_type} with id {id}")]
    NotFound {
        entity_type: String,
        id: String,
    },

    /// The operation conflicts with existing data (unique or foreign key)
    #[error("Conflict: {message}")]
    Conflict {
        message: String,
    },

    /// A transaction was begun, committed or rolled back out of order
    #[error("Invalid transaction state: {message}")]
    InvalidTransaction {
        message: String,
    },

    /// Connection to the underlying store failed
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An internal error occurred
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl PortError {
    pub fn not_found(entity_type: impl Into<String>, id: impl fmt::Display) -> Self {
        PortError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        PortError::Conflict {
            message: message.into(),
        }
    }

    pub fn invalid_transaction(message: impl Into<String>) -> Self {
        PortError::InvalidTransaction {
            message: message.into(),
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        PortError::Connection {
            message: message.into(),
            source: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        PortError::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Returns true when the store was unreachable rather than the operation rejected
    pub fn is_transient(&self) -> bool {
        matches!(self, PortError::Connection { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PortError::NotFound { .. })
    }

    /// Returns true if a store constraint rejected the operation
    pub fn is_conflict(&self) -> bool {
        matches!(self, PortError::Conflict { .. })
    }
}

/// Marker for ports shared across tasks
pub trait DomainPort: Send + Sync + 'static {}

/// Health of a store adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterHealth {
    Healthy,
    /// Answering, but slowly or with warnings
    Degraded,
    Unhealthy,
}

/// Outcome of one health probe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    /// `postgres-ledger-store` or `memory-ledger-store`
    pub adapter_id: String,
    pub status: AdapterHealth,
    pub latency_ms: u64,
    pub message: Option<String>,
    pub checked_at: chrono::DateTime<chrono::Utc>,
}

/// Adapters that can probe their backing store
#[async_trait::async_trait]
pub trait HealthCheckable: Send + Sync {
    async fn health_check(&self) -> HealthCheckResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_error_not_found() {
        let error = PortError::not_found("Customer", 123);
        assert!(error.is_not_found());
        assert!(!error.is_transient());
        assert!(error.to_string().contains("Customer"));
        assert!(error.to_string().contains("123"));
    }

    #[test]
    fn test_port_error_transient() {
        assert!(PortError::connection("refused").is_transient());
        assert!(!PortError::internal("save_changes failed").is_transient());
        assert!(!PortError::conflict("duplicate invoice number").is_transient());
    }

    #[test]
    fn test_invalid_transaction_message() {
        let error = PortError::invalid_transaction("Transaction already started");
        assert_eq!(
            error.to_string(),
            "Invalid transaction state: Transaction already started"
        );
    }
}
