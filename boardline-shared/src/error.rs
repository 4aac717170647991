/// Error types for the board core
///
/// Every store operation returns [`BoardError`]. Checks run in a fixed
/// order (existence, then authorization, then field validation) and the
/// first failing category is reported. Within field validation all
/// violations are collected into a single [`ValidationErrors`] value.
///
/// # Example
///
/// ```
/// use boardline_shared::error::{BoardError, FieldError, ValidationErrors};
///
/// let mut errors = ValidationErrors::new();
/// errors.push(FieldError::new("title", "This field may not be blank."));
///
/// let err: BoardError = errors.into();
/// assert!(err.to_string().contains("title"));
/// ```

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::auth::authorization::{Action, EntityKind};

/// Result alias used by the stores
pub type BoardResult<T> = Result<T, BoardError>;

/// Core error taxonomy
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    /// Malformed or semantically invalid input (one entry per field problem)
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// Missing, or scope-mismatched, resource
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: Uuid },

    /// Authenticated but not permitted
    #[error("Not allowed to {action} {kind}")]
    Forbidden { kind: EntityKind, action: Action },

    /// Storage backend failure
    #[error("Storage error: {0}")]
    Storage(String),
}

impl BoardError {
    pub fn not_found(kind: EntityKind, id: Uuid) -> Self {
        BoardError::NotFound { kind, id }
    }

    pub fn forbidden(kind: EntityKind, action: Action) -> Self {
        BoardError::Forbidden { kind, action }
    }

    /// Shorthand for a single-field validation failure
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        BoardError::Validation(ValidationErrors::single(field, message))
    }
}

impl From<sqlx::Error> for BoardError {
    fn from(err: sqlx::Error) -> Self {
        BoardError::Storage(err.to_string())
    }
}

impl From<ValidationErrors> for BoardError {
    fn from(errors: ValidationErrors) -> Self {
        BoardError::Validation(errors)
    }
}

/// A single field-level validation problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Request field the problem belongs to (e.g. `assignee_id`)
    pub field: String,

    /// Human-readable message
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Collected validation problems, in the order they were found
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            errors: vec![FieldError::new(field, message)],
        }
    }

    pub fn push(&mut self, error: FieldError) {
        self.errors.push(error);
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.push(FieldError::new(field, message));
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<FieldError> {
        self.errors
    }

    /// Returns true if any problem was recorded for `field`
    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// `Ok(())` when nothing was collected, otherwise the whole set as an error
    pub fn into_result(self) -> BoardResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(BoardError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}
