//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)        CoreError (rule broken in a tx)     │
//! │       │                                  │                              │
//! │       ▼                                  ▼                              │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError (apps/api) ← status code + { code, error } body              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use mesa_core::CoreError;
use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - ID doesn't exist for this restaurant
    /// - Row belongs to another tenant
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Duplicate employee email within a restaurant
    /// - Second open cash register
    /// - Two tables with the same number
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Product pointing at a missing category
    /// - Row for a restaurant that does not exist
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// The row changed state since it was read.
    ///
    /// ## When This Occurs
    /// - Editing lines of an order that was settled meanwhile
    #[error("{0}")]
    Conflict(String),

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Stored JSON (order lines, customer) could not be read or written.
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A business rule rejected the change inside a transaction.
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DbError::UniqueViolation { .. })
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite constraint messages:
                // "UNIQUE constraint failed: <table>.<column>[, <table>.<column>]"
                // "FOREIGN KEY constraint failed"
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let err = DbError::not_found("Order", "o-1");
        assert_eq!(err.to_string(), "Order not found: o-1");
        assert!(DbError::duplicate("email", "a@b.com").is_unique_violation());
    }

    #[test]
    fn test_conflict_message() {
        let err = DbError::Conflict("Order o-1 is already paid".into());
        assert_eq!(err.to_string(), "Order o-1 is already paid");
    }

    #[test]
    fn test_domain_error_is_transparent() {
        let err: DbError = CoreError::RegisterNotOpen.into();
        assert_eq!(err.to_string(), "No cash register is open");
    }
}
