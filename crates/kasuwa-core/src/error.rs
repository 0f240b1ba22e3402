//! # Error Types
//!
//! Domain-specific error types for kasuwa-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  kasuwa-core errors (this file)                                        │
//! │  ├── LedgerError      - Business rule violations at the ledger         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  kasuwa-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  Flow: ValidationError → LedgerError ← DbError (via From, as Internal) │
//! │                                                                         │
//! │  Every engine operation returns LedgerResult, so a caller matches      │
//! │  one enum and maps each variant to a distinct user-facing message.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product name, limit, remaining)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Ledger Error
// =============================================================================

/// Business rule violations raised by the checkout, credit and stock engines.
///
/// Every variant is recovered at the operation boundary and handed to the
/// caller as a typed failure; nothing here is ever silently swallowed.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Input validation failed before any state was touched.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Referenced product/customer/sale doesn't exist or is inactive.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A cart line asked for more than the shelf holds.
    ///
    /// Carries the product name and the quantity actually available so the
    /// cashier can re-enter the line without a second lookup.
    #[error("Insufficient stock for {name}. Available: {available}")]
    InsufficientStock {
        name: String,
        available: i64,
        requested: i64,
    },

    /// A credit sale would push the customer past their limit.
    /// Nothing is written when this fires.
    #[error(
        "Credit limit exceeded. Limit: {limit}, Outstanding: {outstanding}, New purchase: {attempted}"
    )]
    CreditLimitExceeded {
        limit: Money,
        outstanding: Money,
        attempted: Money,
    },

    /// A payment was larger than the sale's remaining balance.
    #[error("Payment amount exceeds remaining balance. Remaining: {remaining}")]
    Overpayment { remaining: Money, attempted: Money },

    /// A stock adjustment would take the shelf count negative.
    #[error("Adjustment of {delta} would take {name} stock below zero (current: {current})")]
    InvalidAdjustment {
        name: String,
        current: i64,
        delta: i64,
    },

    /// Unexpected storage-layer failure. The transaction has already been
    /// rolled back; the caller has no partial state to clean up.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        LedgerError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when a request doesn't meet requirements - the caller's
/// fault, no retry will help until the input changes.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid UUID, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., duplicate SKU, phone already registered).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },

    /// Cart-level rule broken (empty cart, too many lines).
    #[error("{0}")]
    Cart(String),
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with LedgerError.
pub type LedgerResult<T> = Result<T, LedgerError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_message() {
        let err = LedgerError::InsufficientStock {
            name: "Rice 5kg".to_string(),
            available: 2,
            requested: 3,
        };
        assert_eq!(err.to_string(), "Insufficient stock for Rice 5kg. Available: 2");
    }

    #[test]
    fn test_credit_limit_message() {
        let err = LedgerError::CreditLimitExceeded {
            limit: Money::from_naira(100),
            outstanding: Money::from_naira(80),
            attempted: Money::from_naira(30),
        };
        assert_eq!(
            err.to_string(),
            "Credit limit exceeded. Limit: ₦100.00, Outstanding: ₦80.00, New purchase: ₦30.00"
        );
    }

    #[test]
    fn test_overpayment_message() {
        let err = LedgerError::Overpayment {
            remaining: Money::from_naira(30),
            attempted: Money::from_naira(40),
        };
        assert_eq!(
            err.to_string(),
            "Payment amount exceeds remaining balance. Remaining: ₦30.00"
        );
    }

    #[test]
    fn test_validation_converts_to_ledger_error() {
        let validation_err = ValidationError::Required {
            field: "customer_id".to_string(),
        };
        let err: LedgerError = validation_err.into();
        assert!(matches!(err, LedgerError::Validation(_)));
        assert_eq!(err.to_string(), "Validation error: customer_id is required");
    }
}
