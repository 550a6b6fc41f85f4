//! Database error types
//!
//! This module classifies SQLx failures by PostgreSQL error code and converts
//! them into the [`PortError`] the ledger services understand.

use thiserror::Error;

use core_kernel::PortError;

/// SQLx failures, classified
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Entity not found: {0}")]
    NotFound(String),

    /// SQLSTATE 23505
    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    /// SQLSTATE 23503
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// SQLSTATE 23514
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Serialization failure or deadlock
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// A stored value could not be mapped to a domain type
    #[error("Invalid stored value: {0}")]
    InvalidData(String),

    #[error("Connection pool exhausted")]
    PoolExhausted,
}

impl DatabaseError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, DatabaseError::NotFound(_))
    }
}

/// Classifies a SQLx error by its PostgreSQL error code
impl From<&sqlx::Error> for DatabaseError {
    fn from(error: &sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => DatabaseError::NotFound("Record not found".to_string()),
            sqlx::Error::PoolTimedOut => DatabaseError::PoolExhausted,
            sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
                DatabaseError::ConnectionFailed(error.to_string())
            }
            sqlx::Error::Database(db_err) => {
                // https://www.postgresql.org/docs/current/errcodes-appendix.html
                match db_err.code().as_deref() {
                    Some("23505") => DatabaseError::DuplicateEntry(db_err.message().to_string()),
                    Some("23503") => DatabaseError::ForeignKeyViolation(db_err.message().to_string()),
                    Some("23514") => DatabaseError::ConstraintViolation(db_err.message().to_string()),
                    Some("40001") | Some("40P01") => {
                        DatabaseError::TransactionFailed(db_err.message().to_string())
                    }
                    _ => DatabaseError::QueryFailed(db_err.message().to_string()),
                }
            }
            _ => DatabaseError::QueryFailed(error.to_string()),
        }
    }
}

impl From<sqlx::Error> for DatabaseError {
    fn from(error: sqlx::Error) -> Self {
        DatabaseError::from(&error)
    }
}

impl From<sqlx::migrate::MigrateError> for DatabaseError {
    fn from(error: sqlx::migrate::MigrateError) -> Self {
        DatabaseError::MigrationFailed(error.to_string())
    }
}

/// Converts a database error into the port error the services see
pub fn db_to_port_error(error: DatabaseError) -> PortError {
    match error {
        DatabaseError::NotFound(message) => PortError::NotFound {
            entity_type: "Record".to_string(),
            id: message,
        },
        DatabaseError::DuplicateEntry(message)
        | DatabaseError::ForeignKeyViolation(message)
        | DatabaseError::ConstraintViolation(message) => PortError::conflict(message),
        DatabaseError::ConnectionFailed(_) | DatabaseError::PoolExhausted => PortError::Connection {
            message: error.to_string(),
            source: None,
        },
        other => PortError::Internal {
            message: other.to_string(),
            source: None,
        },
    }
}

/// Shorthand for `map_err` on SQLx calls
pub(crate) fn sql_error(error: sqlx::Error) -> PortError {
    db_to_port_error(DatabaseError::from(&error))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let error = DatabaseError::from(&sqlx::Error::RowNotFound);
        assert!(error.is_not_found());
    }

    #[test]
    fn test_pool_timeout_is_transient() {
        let port = db_to_port_error(DatabaseError::from(&sqlx::Error::PoolTimedOut));
        assert!(port.is_transient());
    }

    #[test]
    fn test_constraint_violations_become_conflicts() {
        let port = db_to_port_error(DatabaseError::DuplicateEntry(
            "duplicate key value violates unique constraint \"uq_invoices_number\"".to_string(),
        ));
        assert!(port.is_conflict());

        let port = db_to_port_error(DatabaseError::ForeignKeyViolation("fk".to_string()));
        assert!(port.is_conflict());
    }

    #[test]
    fn test_invalid_data_is_internal() {
        let port = db_to_port_error(DatabaseError::InvalidData("status 'Lost'".to_string()));
        assert!(matches!(port, PortError::Internal { .. }));
    }
}
