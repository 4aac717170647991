/// Identity lookups
///
/// # Endpoint
///
/// ```text
/// POST /v1/email-check
/// ```
///
/// Resolves an email address to a user so clients can add members by email.
///
/// # Request Body
///
/// ```json
/// { "email": "bob@example.com" }
/// ```
///
/// # Response (200 OK)
///
/// ```json
/// { "id": "<uuid>", "email": "bob@example.com", "fullname": "Bob Baker" }
/// ```
///
/// Unknown addresses are 404.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, Json};
use boardline_shared::auth::middleware::AuthContext;
use boardline_shared::models::user::User;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Email check request
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct EmailCheckRequest {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
}

pub async fn email_check(
    State(state): State<AppState>,
    _auth: AuthContext,
    Json(req): Json<EmailCheckRequest>,
) -> ApiResult<Json<User>> {
    req.validate()?;

    let user = state
        .services
        .identity()
        .resolve_user_by_email(req.email.trim())
        .await?
        .ok_or_else(|| ApiError::NotFound("This email address does not exist.".to_string()))?;

    Ok(Json(user))
}
