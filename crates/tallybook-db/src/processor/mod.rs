//! # Processors
//!
//! The three units of work that move stock. Each one runs in a single
//! transaction and either commits everything or nothing.
//!
//! ## Transaction Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Processor Transaction                                │
//! │                                                                         │
//! │  validate input ────────── ProcessError::InvalidInput / InvalidQuantity │
//! │       │                    (no transaction opened)                      │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ledger::lock_and_read  (sorted by id, one per distinct row)            │
//! │       │                                                                 │
//! │       ├── stock short? ── ProcessError::InsufficientStock ──┐           │
//! │       ▼                                                     │           │
//! │  inserts + ledger::adjust                                   │           │
//! │       │                                                     │           │
//! │       ├── anything else fails ── ProcessError::Internal ────┤           │
//! │       ▼                                                     ▼           │
//! │  COMMIT                                                 ROLLBACK        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Processors never call each other and never call the pool-backed
//! repository methods while their transaction is open.

pub mod production;
pub mod purchase;
pub mod sale;

use serde::Serialize;
use sqlx::{Sqlite, Transaction};
use thiserror::Error;
use tracing::{error, warn};

use tallybook_core::{CoreError, Quantity, StockKind, ValidationError};

use crate::error::DbError;

// =============================================================================
// Error Type
// =============================================================================

/// Errors returned by the processors.
///
/// Every variant means the transaction was rolled back.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// A material or product doesn't have enough stock.
    ///
    /// ## When This Occurs
    /// - A sale asks for more of a product than is on hand
    /// - A production run needs more of a material than is on hand
    #[error("Insufficient stock for {kind} '{name}' ({id}): available {available}, requested {requested}")]
    InsufficientStock {
        kind: StockKind,
        id: String,
        name: String,
        available: Quantity,
        requested: Quantity,
    },

    /// A quantity was zero, negative or not a number.
    #[error("Invalid quantity for {field}: {reason}")]
    InvalidQuantity { field: String, reason: String },

    /// Any other structural problem with the input.
    #[error("Invalid input: {0}")]
    InvalidInput(ValidationError),

    /// A referenced product, material or payment method doesn't exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A delete was refused because the entity is still referenced.
    #[error("{entity} {id} is still referenced and cannot be deleted")]
    DeleteProtected { entity: String, id: String },

    /// Storage failure, lock timeout or constraint backstop.
    ///
    /// The cause is kept for operators (`Error::source`) and never shown in
    /// the message.
    #[error("Internal failure, the operation was rolled back")]
    Internal(#[source] DbError),
}

/// Error codes for the request layer.
///
/// ## Usage in the Request Layer
/// ```text
/// VALIDATION_ERROR   → 400
/// NOT_FOUND          → 404
/// INSUFFICIENT_STOCK → 409
/// DELETE_PROTECTED   → 409
/// INTERNAL           → 500
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input validation failed
    ValidationError,

    /// Referenced resource not found
    NotFound,

    /// Not enough stock
    InsufficientStock,

    /// Resource still referenced
    DeleteProtected,

    /// Internal failure
    Internal,
}

impl ProcessError {
    /// Machine-readable classification of this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            ProcessError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            ProcessError::InvalidQuantity { .. } | ProcessError::InvalidInput(_) => {
                ErrorCode::ValidationError
            }
            ProcessError::NotFound { .. } => ErrorCode::NotFound,
            ProcessError::DeleteProtected { .. } => ErrorCode::DeleteProtected,
            ProcessError::Internal(_) => ErrorCode::Internal,
        }
    }
}

impl From<ValidationError> for ProcessError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::InvalidQuantity { field, reason } => {
                ProcessError::InvalidQuantity { field, reason }
            }
            other => ProcessError::InvalidInput(other),
        }
    }
}

impl From<CoreError> for ProcessError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InsufficientStock {
                kind,
                id,
                name,
                available,
                requested,
            } => ProcessError::InsufficientStock {
                kind,
                id,
                name,
                available,
                requested,
            },
            CoreError::Validation(err) => err.into(),
        }
    }
}

/// Converts database errors to processor errors.
///
/// Caller-facing failures keep their meaning; everything else is logged
/// here and collapsed into [`ProcessError::Internal`].
impl From<DbError> for ProcessError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ProcessError::NotFound { entity, id },
            DbError::DeleteProtected { entity, id } => ProcessError::DeleteProtected { entity, id },
            DbError::UniqueViolation { field, value } => {
                ProcessError::InvalidInput(ValidationError::Duplicate { field, value })
            }
            DbError::Validation(err) => err.into(),
            other => {
                error!(error = %other, "Processor failed");
                ProcessError::Internal(other)
            }
        }
    }
}

/// Result type for processor operations.
pub type ProcessResult<T> = Result<T, ProcessError>;

// =============================================================================
// Transaction Boundary
// =============================================================================

/// Commits on success, rolls back on failure.
pub(crate) async fn finish<T>(
    tx: Transaction<'_, Sqlite>,
    result: ProcessResult<T>,
) -> ProcessResult<T> {
    match result {
        Ok(value) => {
            tx.commit().await.map_err(DbError::from)?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback) = tx.rollback().await {
                error!(error = %rollback, "Rollback failed");
            }
            if !matches!(err, ProcessError::Internal(_)) {
                warn!(code = ?err.code(), error = %err, "Operation rejected");
            }
            Err(err)
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
