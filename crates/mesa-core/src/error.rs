//! # Error Types
//!
//! Domain-level errors for Mesa POS.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Categories                                │
//! │                                                                         │
//! │  CoreError (business rules)          ValidationError (input)            │
//! │  ├── OrderNotFound                   ├── Required                       │
//! │  ├── InvalidOrderStatus              ├── TooLong                        │
//! │  ├── EmptyOrder                      ├── OutOfRange                     │
//! │  ├── InsufficientTender              ├── MustBePositive                 │
//! │  ├── RegisterAlreadyOpen             └── InvalidFormat                  │
//! │  ├── RegisterNotOpen                                                    │
//! │  └── Validation(ValidationError)                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations. The API layer maps them
/// to 404/409/422 responses.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Order cannot be found.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Order is not in a state that allows the requested operation.
    ///
    /// ## When This Occurs
    /// - Adding products to a paid order
    /// - Paying an order twice
    /// - Liberating an order that was never paid
    #[error("Order {order_id} is {current_status}, cannot perform operation")]
    InvalidOrderStatus {
        order_id: String,
        current_status: String,
    },

    /// Order has no lines and cannot be paid.
    #[error("Order {0} has no products")]
    EmptyOrder(String),

    /// Order exceeded the maximum number of lines.
    #[error("Order cannot have more than {max} lines")]
    OrderTooLarge { max: usize },

    /// Cash handed over does not cover the total.
    #[error("Tendered {tendered} does not cover total {total}")]
    InsufficientTender { total: i64, tendered: i64 },

    /// A cash register is already open for the restaurant.
    #[error("Cash register already open since {opened_at}")]
    RegisterAlreadyOpen { opened_at: String },

    /// No cash register is open.
    #[error("No cash register is open")]
    RegisterNotOpen,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when request input doesn't meet requirements.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid slug, invalid email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Shorthand for [`ValidationError::Required`].
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientTender {
            total: 5000,
            tendered: 2000,
        };
        assert_eq!(err.to_string(), "Tendered 2000 does not cover total 5000");

        let err = CoreError::InvalidOrderStatus {
            order_id: "o-1".to_string(),
            current_status: "pagado".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Order o-1 is pagado, cannot perform operation"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::required("restauranteId");
        assert_eq!(err.to_string(), "restauranteId is required");

        let err = ValidationError::TooShort {
            field: "password".to_string(),
            min: 8,
        };
        assert_eq!(err.to_string(), "password must be at least 8 characters");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("name").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
