//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)        Ledger rule (CoreError)             │
//! │       │                                  │                              │
//! │       ▼                                  ▼                              │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError::kind() → ErrorKind ← Stable code for callers                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Report CLI prints { code, message, retryable }                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use roost_core::{CoreError, ErrorKind, ValidationError};
use thiserror::Error;

/// Database operation errors.
///
/// These errors wrap sqlx errors and ledger rule violations, and provide
/// additional context for debugging and caller feedback.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - `fetch_one` returns no rows
    /// - ID doesn't exist for this tenant
    /// - Record was deleted
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Inserting a duplicate chicken type name
    /// - Any UNIQUE index violation
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Referencing a non-existent customer or chicken type
    /// - Deleting a directory entry that ledger rows still point at
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file doesn't exist and can't be created
    /// - File permissions issue
    /// - Disk full
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// A concurrent writer got there first.
    ///
    /// ## When This Occurs
    /// - A loading's `version` moved between read and write
    /// - SQLite reports the database busy or locked past `busy_timeout`
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Pool exhausted (all connections in use past `acquire_timeout`).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// A ledger rule rejected the operation.
    #[error(transparent)]
    Core(#[from] CoreError),

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

    /// Creates a Conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        DbError::Conflict(message.into())
    }

    /// Classifies this error for callers.
    ///
    /// ```text
    /// NotFound                      → NOT_FOUND
    /// UniqueViolation / ForeignKey  → INVALID_INPUT
    /// Conflict                      → CONFLICT       (retryable)
    /// ConnectionFailed / PoolExh.   → UNAVAILABLE    (retryable)
    /// Core(e)                       → e.kind()
    /// Migration / Query / Internal  → INTERNAL
    /// ```
    pub fn kind(&self) -> ErrorKind {
        match self {
            DbError::NotFound { .. } => ErrorKind::NotFound,
            DbError::UniqueViolation { .. } | DbError::ForeignKeyViolation { .. } => {
                ErrorKind::InvalidInput
            }
            DbError::Conflict(_) => ErrorKind::Conflict,
            DbError::ConnectionFailed(_) | DbError::PoolExhausted => ErrorKind::Unavailable,
            DbError::Core(err) => err.kind(),
            DbError::MigrationFailed(_) | DbError::QueryFailed(_) | DbError::Internal(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Message safe to hand to a caller. Internal details are replaced by
    /// the kind's generic text.
    pub fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::Internal | ErrorKind::Unavailable => self.kind().generic_message().to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<ValidationError> for DbError {
    fn from(err: ValidationError) -> Self {
        DbError::Core(CoreError::Validation(err))
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type / busy
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// sqlx::Error::Io             → DbError::ConnectionFailed
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

                // SQLite error messages:
                // UNIQUE constraint: "UNIQUE constraint failed: <table>.<column>"
                // FK constraint: "FOREIGN KEY constraint failed"
                // SQLITE_BUSY / SQLITE_LOCKED: "database is locked", "database table is locked"
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
                } else if is_busy(db_err.code().as_deref(), msg) {
                    DbError::Conflict(msg.to_string())
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            sqlx::Error::Io(io) => DbError::ConnectionFailed(io.to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

/// SQLITE_BUSY (5), SQLITE_LOCKED (6) and their extended codes.
fn is_busy(code: Option<&str>, message: &str) -> bool {
    let primary = code
        .and_then(|c| c.parse::<i32>().ok())
        .map(|c| c & 0xff);
    matches!(primary, Some(5) | Some(6)) || message.contains("database is locked")
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(DbError::not_found("Customer", "c-1").kind(), ErrorKind::NotFound);
        assert_eq!(DbError::duplicate("name", "Broiler").kind(), ErrorKind::InvalidInput);
        assert_eq!(DbError::conflict("version moved").kind(), ErrorKind::Conflict);
        assert_eq!(DbError::PoolExhausted.kind(), ErrorKind::Unavailable);
        assert_eq!(DbError::QueryFailed("syntax".into()).kind(), ErrorKind::Internal);

        let core = DbError::from(CoreError::LoadingInUse {
            loading_id: "l-1".into(),
            distributed_quantity: 3,
        });
        assert_eq!(core.kind(), ErrorKind::Conflict);

        let validation = DbError::from(ValidationError::Required {
            field: "name".into(),
        });
        assert_eq!(validation.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_public_message_hides_internals() {
        let err = DbError::QueryFailed("no such column: secret_col".into());
        assert!(!err.public_message().contains("secret_col"));

        let err = DbError::not_found("Customer", "c-1");
        assert_eq!(err.public_message(), "Customer not found: c-1");
    }

    #[test]
    fn test_busy_detection() {
        assert!(is_busy(Some("5"), ""));
        assert!(is_busy(Some("517"), ""));
        assert!(is_busy(None, "database is locked"));
        assert!(!is_busy(Some("19"), "constraint"));
    }

    #[test]
    fn test_row_not_found_maps() {
        let err: DbError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DbError::NotFound { .. }));
        let err: DbError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, DbError::PoolExhausted));
    }
}
