/// Error handling for the API server
///
/// All handlers return `Result<T, ApiError>`, which converts to an HTTP
/// response with a JSON body:
///
/// ```json
/// { "error": "validation_error", "message": "...", "details": [{ "field": "title", "message": "..." }] }
/// ```
///
/// Core outcomes map as follows: validation → 400, forbidden → 403,
/// not found → 404, storage failure → 500. Authentication failures are 401.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use boardline_shared::auth::middleware::AuthError;
use boardline_shared::error::BoardError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Field validation failed (400)
    ValidationError(Vec<ValidationErrorDetail>),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Internal server error (500)
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    pub field: String,

    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "not_found", "forbidden")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::ValidationError(errors) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Convert core errors to API errors
impl From<BoardError> for ApiError {
    fn from(err: BoardError) -> Self {
        match err {
            BoardError::Validation(errors) => ApiError::ValidationError(
                errors
                    .into_errors()
                    .into_iter()
                    .map(|e| ValidationErrorDetail {
                        field: e.field,
                        message: e.message,
                    })
                    .collect(),
            ),
            err @ BoardError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            err @ BoardError::Forbidden { .. } => ApiError::Forbidden(err.to_string()),
            BoardError::Storage(msg) => ApiError::InternalError(msg),
        }
    }
}

/// Convert auth errors to API errors
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Unauthorized(err.to_string())
    }
}

/// Convert validator errors to API errors
impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        let errors = err
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();

        ApiError::ValidationError(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boardline_shared::auth::authorization::{Action, EntityKind};
    use boardline_shared::error::ValidationErrors;
    use uuid::Uuid;

    #[test]
    fn test_error_display() {
        let err = ApiError::Forbidden("Not the board owner".to_string());
        assert_eq!(err.to_string(), "Forbidden: Not the board owner");

        let err = ApiError::NotFound("Board not found".to_string());
        assert_eq!(err.to_string(), "Not found: Board not found");
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (ApiError::ValidationError(vec![]), StatusCode::BAD_REQUEST),
            (ApiError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (ApiError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ApiError::InternalError("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_board_error_mapping() {
        let mut errors = ValidationErrors::new();
        errors.add("title", "This field may not be blank.");
        errors.add("members", "Invalid user IDs: x");

        match ApiError::from(BoardError::Validation(errors)) {
            ApiError::ValidationError(details) => {
                assert_eq!(details.len(), 2);
                assert_eq!(details[0].field, "title");
                assert_eq!(details[1].field, "members");
            }
            other => panic!("unexpected {other:?}"),
        }

        let err = ApiError::from(BoardError::not_found(EntityKind::Task, Uuid::nil()));
        assert!(matches!(err, ApiError::NotFound(_)));

        let err = ApiError::from(BoardError::forbidden(EntityKind::Board, Action::Delete));
        assert!(matches!(err, ApiError::Forbidden(_)));

        let err = ApiError::from(BoardError::Storage("connection reset".into()));
        assert!(matches!(err, ApiError::InternalError(_)));
    }

    #[test]
    fn test_auth_error_is_unauthorized() {
        let err = ApiError::from(AuthError::MissingCredentials);
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }
}
