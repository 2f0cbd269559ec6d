// ⚠️ Error taxonomy for the records core
//
// NotFound and Validation are client errors and never leave a trace in the
// activity log. Database errors are internal and get a best-effort `Error` entry.

use std::fmt;
use thiserror::Error;

use crate::entities::EntityKind;

// ============================================================================
// FIELD ERRORS
// ============================================================================

/// A single rejected input field
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        FieldError {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Wrapper so a list of field errors renders as one message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldErrors(pub Vec<FieldError>);

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|e| e.to_string()).collect();
        write!(f, "{}", parts.join("; "))
    }
}

// ============================================================================
// RECORDS ERROR
// ============================================================================

#[derive(Debug, Error)]
pub enum RecordsError {
    /// The id does not resolve to a stored record.
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    /// Input failed a required/format/range/uniqueness check.
    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    /// Admin credential check failed.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Storage is not usable: poisoned connection lock or missing admin row.
    #[error("storage unavailable")]
    StorageUnavailable,
}

impl RecordsError {
    pub fn not_found(kind: EntityKind, id: &str) -> Self {
        RecordsError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        RecordsError::Validation(FieldErrors(vec![FieldError::new(field, message)]))
    }

    pub fn from_field_errors(errors: Vec<FieldError>) -> Self {
        RecordsError::Validation(FieldErrors(errors))
    }

    /// Internal failures are the ones worth an `Error` log entry.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            RecordsError::Database(_)
                | RecordsError::Io(_)
                | RecordsError::StorageUnavailable
        )
    }

    /// Map a SQLite UNIQUE violation onto a validation error for the offending column.
    ///
    /// SQLite reports these as "UNIQUE constraint failed: students.email".
    pub fn from_write(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(code, Some(message)) = &err {
            if code.code == rusqlite::ErrorCode::ConstraintViolation
                && message.starts_with("UNIQUE constraint failed")
            {
                let field = message
                    .rsplit('.')
                    .next()
                    .unwrap_or("record")
                    .trim()
                    .to_string();
                return RecordsError::invalid(&field, "has already been taken");
            }
        }
        RecordsError::Database(err)
    }
}

pub type Result<T> = std::result::Result<T, RecordsError>;
