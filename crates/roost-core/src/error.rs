//! # Error Types
//!
//! Domain-specific error types for roost-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  roost-core errors (this file)                                         │
//! │  ├── CoreError        - Ledger rule violations                         │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  └── ErrorKind        - Stable taxonomy every error maps onto          │
//! │                                                                         │
//! │  roost-db errors (separate crate)                                      │
//! │  └── DbError          - Database failures, embeds CoreError            │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ErrorKind → caller      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Error Kinds
//! | Kind                    | Status | Retryable |
//! |-------------------------|--------|-----------|
//! | `InvalidInput`          | 400    | no        |
//! | `NotFound`              | 404    | no        |
//! | `InsufficientInventory` | 422    | no        |
//! | `InsufficientFunds`     | 422    | no        |
//! | `Conflict`              | 409    | yes       |
//! | `Unavailable`           | 503    | yes       |
//! | `Internal`              | 500    | no        |

use serde::Serialize;
use thiserror::Error;

// =============================================================================
// Error Kind
// =============================================================================

/// Stable classification of every failure the ledger can return.
///
/// Callers branch on the kind, never on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Shape, range or reference-format violation.
    InvalidInput,

    /// A referenced entity is absent.
    NotFound,

    /// An update asked a batch for more than it can supply.
    InsufficientInventory,

    /// A staff member tried to hand over more cash than they hold.
    InsufficientFunds,

    /// Concurrent write or aborted transaction. Retry the request.
    Conflict,

    /// Persistence unreachable or timed out. Retry the request.
    Unavailable,

    /// Unexpected failure. Logged with full context.
    Internal,
}

impl ErrorKind {
    /// Machine-readable code (`"NOT_FOUND"`, `"CONFLICT"`, ...).
    pub const fn code(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "INVALID_INPUT",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::InsufficientInventory => "INSUFFICIENT_INVENTORY",
            ErrorKind::InsufficientFunds => "INSUFFICIENT_FUNDS",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::Unavailable => "UNAVAILABLE",
            ErrorKind::Internal => "INTERNAL",
        }
    }

    /// HTTP-style status for transports that need one.
    pub const fn status(&self) -> u16 {
        match self {
            ErrorKind::InvalidInput => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::InsufficientInventory | ErrorKind::InsufficientFunds => 422,
            ErrorKind::Conflict => 409,
            ErrorKind::Unavailable => 503,
            ErrorKind::Internal => 500,
        }
    }

    /// Whether the same request may succeed if sent again unchanged.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Conflict | ErrorKind::Unavailable)
    }

    /// Caller-safe message for kinds whose details must not leak.
    pub const fn generic_message(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "The request is invalid",
            ErrorKind::NotFound => "The requested record does not exist",
            ErrorKind::InsufficientInventory => "Not enough stock in the loading batch",
            ErrorKind::InsufficientFunds => "Not enough cash on hand",
            ErrorKind::Conflict => "The record was changed concurrently, please retry",
            ErrorKind::Unavailable => "The ledger is temporarily unavailable",
            ErrorKind::Internal => "An internal error occurred",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

// =============================================================================
// Core Error
// =============================================================================

/// Ledger rule violations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A referenced record does not exist.
    ///
    /// ## When This Occurs
    /// - Customer, supplier or chicken type id is unknown
    /// - Loading, distribution or payment was already deleted
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A distribution update asks its source batch for more than it holds.
    ///
    /// ## When This Occurs
    /// ```text
    /// Batch remaining: 10, distribution allocated: 30
    ///      │
    ///      ▼
    /// Update distribution to 50 (headroom = 30 + 10 = 40)
    ///      │
    ///      ▼
    /// InsufficientInventory { available: 40, requested: 50 }
    /// ```
    /// Creates never fail this way; their excess becomes waste.
    #[error("Insufficient {dimension} in loading {loading_id}: available {available}, requested {requested}")]
    InsufficientInventory {
        loading_id: String,
        dimension: String,
        available: i64,
        requested: i64,
    },

    /// A cash transfer exceeds the sender's position.
    #[error("Insufficient funds for employee {employee_id}: available {available}, requested {requested}")]
    InsufficientFunds {
        employee_id: String,
        available: i64,
        requested: i64,
    },

    /// A loading still has distributions drawing from it.
    ///
    /// ## When This Occurs
    /// - Deleting a loading whose `distributed_quantity > 0`
    #[error("Loading {loading_id} has {distributed_quantity} units distributed and cannot be deleted")]
    LoadingInUse {
        loading_id: String,
        distributed_quantity: i64,
    },

    /// Concurrent modification detected.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Classifies this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::NotFound { .. } => ErrorKind::NotFound,
            CoreError::InsufficientInventory { .. } => ErrorKind::InsufficientInventory,
            CoreError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            CoreError::LoadingInUse { .. } | CoreError::Conflict(_) => ErrorKind::Conflict,
            CoreError::Validation(_) => ErrorKind::InvalidInput,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any ledger rule runs.
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
    Negative { field: String },

    /// Invalid format (e.g., invalid UUID, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Two fields that must differ are equal.
    #[error("{field} must differ from {other}")]
    MustDiffer { field: String, other: String },

    /// A loading was shrunk below what has already gone out of it.
    #[error("{field} cannot drop below the {distributed} already distributed")]
    BelowDistributed { field: String, distributed: i64 },

    /// Duplicate value (e.g., duplicate chicken type name).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
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
        let err = CoreError::InsufficientInventory {
            loading_id: "L-1".to_string(),
            dimension: "quantity".to_string(),
            available: 40,
            requested: 50,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient quantity in loading L-1: available 40, requested 50"
        );

        let err = CoreError::not_found("Customer", "c-9");
        assert_eq!(err.to_string(), "Customer not found: c-9");
    }

    #[test]
    fn test_kind_mapping() {
        assert_eq!(CoreError::not_found("Loading", "x").kind(), ErrorKind::NotFound);
        assert_eq!(
            CoreError::LoadingInUse {
                loading_id: "x".into(),
                distributed_quantity: 3
            }
            .kind(),
            ErrorKind::Conflict
        );
        let validation: CoreError = ValidationError::Required {
            field: "name".to_string(),
        }
        .into();
        assert_eq!(validation.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_kind_codes_and_retry() {
        assert_eq!(ErrorKind::Conflict.code(), "CONFLICT");
        assert_eq!(ErrorKind::InsufficientInventory.status(), 422);
        assert!(ErrorKind::Conflict.is_retryable());
        assert!(ErrorKind::Unavailable.is_retryable());
        assert!(!ErrorKind::Internal.is_retryable());
        assert!(!ErrorKind::NotFound.is_retryable());

        let json = serde_json::to_string(&ErrorKind::InsufficientFunds).unwrap();
        assert_eq!(json, "\"INSUFFICIENT_FUNDS\"");
    }
}
