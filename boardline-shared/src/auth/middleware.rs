/// Bearer authentication for Axum
///
/// Validates the `Authorization: Bearer <token>` header and stores an
/// [`AuthContext`] in the request extensions. Handlers take `AuthContext`
/// as an extractor to learn who the requester is.
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, routing::get, Router};
/// use boardline_shared::auth::middleware::{create_jwt_middleware, AuthContext};
///
/// async fn whoami(auth: AuthContext) -> String {
///     auth.user_id.to_string()
/// }
///
/// let app: Router = Router::new()
///     .route("/whoami", get(whoami))
///     .layer(middleware::from_fn(create_jwt_middleware("secret")));
/// ```

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use uuid::Uuid;

use super::jwt::{validate_token, JwtError};

/// Identity of the authenticated requester
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: Uuid,
}

/// Why a request could not be authenticated
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing authorization header")]
    MissingCredentials,

    #[error("Expected Bearer token")]
    InvalidFormat,

    #[error("{0}")]
    InvalidToken(#[from] JwtError),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "error": "unauthorized",
            "message": self.to_string(),
        }));

        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}

/// Extracts the raw token from an `Authorization: Bearer` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::InvalidFormat)
}

/// Validates the bearer token in `headers`
pub fn authenticate(headers: &HeaderMap, secret: &str) -> Result<AuthContext, AuthError> {
    let token = bearer_token(headers)?;
    let claims = validate_token(token, secret)?;

    Ok(AuthContext {
        user_id: claims.sub,
    })
}

/// JWT authentication middleware
///
/// Rejects the request with 401 when the header is missing, malformed,
/// or carries a token that fails validation.
pub async fn jwt_auth_middleware(
    secret: String,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth = authenticate(req.headers(), &secret)?;
    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}

type MiddlewareFuture = Pin<Box<dyn Future<Output = Result<Response, AuthError>> + Send>>;

/// Captures the secret and returns a function usable with `middleware::from_fn`
pub fn create_jwt_middleware(
    secret: impl Into<String>,
) -> impl Fn(Request, Next) -> MiddlewareFuture + Clone {
    let secret = secret.into();
    move |req, next| {
        let secret = secret.clone();
        Box::pin(jwt_auth_middleware(secret, req, next))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .copied()
            .ok_or(AuthError::MissingCredentials)
    }
}
