/// Bearer token validation
///
/// Boardline does not issue credentials; an external identity service
/// does. The API only needs to turn a presented token into a requester id.
/// Tokens are HS256-signed JWTs whose `sub` claim is the user id and whose
/// issuer is `boardline`.
///
/// [`create_token`] exists for tooling and tests that need a token without
/// running the identity service.
///
/// # Example
///
/// ```
/// use boardline_shared::auth::jwt::{create_token, validate_token, Claims};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "a-shared-secret-of-at-least-32-bytes!";
/// let user_id = Uuid::new_v4();
///
/// let token = create_token(&Claims::new(user_id), secret)?;
/// let claims = validate_token(&token, secret)?;
/// assert_eq!(claims.sub, user_id);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Expected `iss` claim
pub const ISSUER: &str = "boardline";

/// Lifetime of tokens built with [`Claims::new`]
pub const DEFAULT_TOKEN_LIFETIME_HOURS: i64 = 24;

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Failed to create token: {0}")]
    CreateError(String),

    #[error("Token has expired")]
    Expired,

    #[error("Token is not valid yet")]
    Immature,

    #[error("Invalid issuer: expected {ISSUER}")]
    InvalidIssuer,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Invalid token: {0}")]
    Invalid(String),
}

/// Registered claims carried by a Boardline token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the requester's user id
    pub sub: Uuid,

    /// Always [`ISSUER`]
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,
}

impl Claims {
    /// Claims for `user_id`, valid from now for the default lifetime
    pub fn new(user_id: Uuid) -> Self {
        Self::with_expiration(user_id, Duration::hours(DEFAULT_TOKEN_LIFETIME_HOURS))
    }

    /// Claims for `user_id` expiring after `expires_in`
    ///
    /// A negative duration yields claims that are already expired.
    pub fn with_expiration(user_id: Uuid, expires_in: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
            nbf: now.timestamp(),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Signs `claims` with HS256
///
/// # Errors
///
/// Returns `JwtError::CreateError` if encoding fails
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&Header::new(Algorithm::HS256), claims, &key)
        .map_err(|e| JwtError::CreateError(e.to_string()))
}

/// Verifies signature, issuer, `exp` and `nbf`, and returns the claims
///
/// No leeway is applied to `exp` or `nbf`.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.set_required_spec_claims(&["exp", "iss", "sub"]);
    validation.validate_nbf = true;
    validation.leeway = 0;

    decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => JwtError::Expired,
            ErrorKind::ImmatureSignature => JwtError::Immature,
            ErrorKind::InvalidIssuer => JwtError::InvalidIssuer,
            ErrorKind::InvalidSignature => JwtError::InvalidSignature,
            _ => JwtError::Invalid(e.to_string()),
        })
}
