//! # Error Types
//!
//! Domain-specific error types for tallybook-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tallybook-core errors (this file)                                      │
//! │  ├── CoreError        - Business rule violations                        │
//! │  └── ValidationError  - Input validation failures                       │
//! │                                                                         │
//! │  tallybook-db errors (separate crate)                                   │
//! │  ├── DbError          - Database operation failures                     │
//! │  └── ProcessError     - What a processor caller sees (+ ErrorCode)      │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ProcessError → request layer       │
//! │                           DbError  ↗                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (id, name, quantities)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

use crate::quantity::Quantity;
use crate::stock::StockKind;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Not enough stock to complete a sale or a production run.
    ///
    /// ## When This Occurs
    /// - Selling more units of a product than are on the shelf
    /// - Producing more units than the bill of materials can cover
    ///
    /// ## User Workflow
    /// ```text
    /// Sell Mug (qty: 6)
    ///      │
    ///      ▼
    /// lock_and_read: available=5
    ///      │
    ///      ▼
    /// InsufficientStock { kind: Product, name: "Mug", available: 5, requested: 6 }
    ///      │
    ///      ▼
    /// Transaction rolled back, nothing written
    /// ```
    #[error("Insufficient stock for {kind} '{name}' ({id}): available {available}, requested {requested}")]
    InsufficientStock {
        kind: StockKind,
        id: String,
        name: String,
        available: Quantity,
        requested: Quantity,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Used for early validation before a transaction is opened.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
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

    /// Invalid format (e.g., invalid UUID, invalid decimal).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// An amount that does not fit in cents once multiplied out
    /// (price × quantity, a total across lines).
    #[error("{field} is too large")]
    TooLarge { field: String },

    /// Duplicate value (e.g., the same material twice in one bill of materials).
    #[error("{field} '{value}' is duplicated")]
    Duplicate { field: String, value: String },

    /// A quantity that is zero, negative, unparseable or too precise.
    ///
    /// Kept apart from the other variants so callers can tell a bad
    /// quantity from any other malformed input.
    #[error("Invalid quantity for {field}: {reason}")]
    InvalidQuantity { field: String, reason: String },
}

impl ValidationError {
    /// A quantity that overflowed when multiplied or summed.
    pub fn quantity_too_large(field: impl Into<String>) -> Self {
        ValidationError::InvalidQuantity {
            field: field.into(),
            reason: "is too large".to_string(),
        }
    }

    /// An amount that overflowed when multiplied or summed.
    pub fn amount_too_large(field: impl Into<String>) -> Self {
        ValidationError::TooLarge {
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
