/// Health check endpoint
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "storage": "postgres",
///   "database": "connected"
/// }
/// ```
///
/// `database` is omitted for the in-memory backend.

use crate::app::AppState;
use axum::{extract::State, Json};
use boardline_shared::db::pool::health_check as database_health;
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `healthy` or `degraded`
    pub status: String,

    pub version: String,

    /// Storage backend name
    pub storage: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
}

/// Health check handler
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match &state.db {
        Some(pool) => match database_health(pool).await {
            Ok(()) => Some("connected"),
            Err(_) => Some("disconnected"),
        },
        None => None,
    };

    let status = if database == Some("disconnected") {
        "degraded"
    } else {
        "healthy"
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        storage: state.backend.to_string(),
        database: database.map(str::to_string),
    })
}
