//! # Report Error
//!
//! What the binary prints when a report fails.
//!
//! ```text
//! DbError ──kind()──► ReportError { code, message, retryable } ──► stderr (JSON)
//!                          │
//!                          └── INTERNAL / UNAVAILABLE: details logged, generic message shown
//! ```

use serde::Serialize;

use roost_core::{ErrorKind, ValidationError};
use roost_db::DbError;

/// Serialized to stderr on failure:
/// ```json
/// { "code": "NOT_FOUND", "message": "Employee not found: ...", "retryable": false }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ReportError {
    pub code: &'static str,
    pub message: String,
    pub retryable: bool,
}

impl ReportError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        ReportError {
            code: kind.code(),
            message: message.into(),
            retryable: kind.is_retryable(),
        }
    }

    /// Process exit status for this failure.
    pub fn exit_code(&self) -> u8 {
        match self.code {
            "INVALID_INPUT" => 2,
            "UNAVAILABLE" | "CONFLICT" => 75,
            _ => 1,
        }
    }
}

impl From<DbError> for ReportError {
    fn from(err: DbError) -> Self {
        let kind = err.kind();
        if matches!(kind, ErrorKind::Internal | ErrorKind::Unavailable) {
            tracing::error!(error = %err, code = kind.code(), "Report failed");
        }
        ReportError::new(kind, err.public_message())
    }
}

impl From<ValidationError> for ReportError {
    fn from(err: ValidationError) -> Self {
        DbError::from(err).into()
    }
}

impl From<serde_json::Error> for ReportError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!(error = %err, "Report serialization failed");
        ReportError::new(ErrorKind::Internal, ErrorKind::Internal.generic_message())
    }
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ReportError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_keeps_message() {
        let err: ReportError = DbError::not_found("Employee", "abc").into();
        assert_eq!(err.code, "NOT_FOUND");
        assert_eq!(err.message, "Employee not found: abc");
        assert!(!err.retryable);
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err: ReportError = DbError::QueryFailed("no such column: secret".into()).into();
        assert_eq!(err.code, "INTERNAL");
        assert!(!err.message.contains("secret"));
    }

    #[test]
    fn test_conflict_is_retryable() {
        let err: ReportError = DbError::conflict("database is locked").into();
        assert!(err.retryable);
        assert_eq!(err.exit_code(), 75);
    }
}
