/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use boardline_api::{app::{build_router, AppState}, config::Config};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::from_config(config).await?;
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::{Config, StorageBackend},
    error::ApiError,
    routes,
};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, post},
    Router,
};
use boardline_shared::auth::middleware::authenticate;
use boardline_shared::db::{
    migrations::run_migrations,
    pool::{create_pool, DatabaseConfig},
};
use boardline_shared::identity::{IdentityProvider, MemoryDirectory, PgDirectory};
use boardline_shared::services::Services;
use boardline_shared::storage::{MemoryStorage, PgStorage, Storage};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, Level};

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Board Registry, Task Store and Comment Log
    pub services: Services,

    /// Storage backend name reported by `/health`
    pub backend: &'static str,

    /// Pool of the PostgreSQL backend, if that is the one in use
    pub db: Option<PgPool>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires the services onto an already built storage and identity pair
    pub fn new(
        storage: Arc<dyn Storage>,
        identity: Arc<dyn IdentityProvider>,
        db: Option<PgPool>,
        config: Config,
    ) -> Self {
        Self {
            backend: storage.backend(),
            services: Services::new(storage, identity),
            db,
            config: Arc::new(config),
        }
    }

    /// In-memory storage with the given user directory
    pub fn in_memory(directory: Arc<MemoryDirectory>, config: Config) -> Self {
        Self::new(Arc::new(MemoryStorage::new()), directory, None, config)
    }

    /// Builds storage and identity according to `config.storage`
    ///
    /// The PostgreSQL backend connects a pool and applies pending migrations.
    /// The memory backend optionally loads `DIRECTORY_SEED`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database is unreachable, migrations fail, or
    /// the seed file cannot be read or parsed
    pub async fn from_config(config: Config) -> anyhow::Result<Self> {
        match config.storage.backend {
            StorageBackend::Memory => {
                let directory = match &config.storage.directory_seed {
                    Some(path) => {
                        let json = tokio::fs::read_to_string(path).await?;
                        MemoryDirectory::from_json(&json)?
                    }
                    None => MemoryDirectory::new(),
                };
                info!(users = directory.len(), "Using in-memory storage");

                Ok(Self::in_memory(Arc::new(directory), config))
            }
            StorageBackend::Postgres => {
                let settings = config
                    .storage
                    .database
                    .clone()
                    .ok_or_else(|| anyhow::anyhow!("postgres backend selected without database settings"))?;

                let pool = create_pool(DatabaseConfig {
                    max_connections: settings.max_connections,
                    ..DatabaseConfig::from_url(settings.url)
                })
                .await?;
                run_migrations(&pool).await?;
                info!("Using PostgreSQL storage");

                Ok(Self::new(
                    Arc::new(PgStorage::new(pool.clone())),
                    Arc::new(PgDirectory::new(pool.clone())),
                    Some(pool),
                    config,
                ))
            }
        }
    }

    /// Gets JWT secret for token validation
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                                   # Health check (public)
/// └── /v1/                                      # Bearer JWT required
///     ├── GET, POST        /boards
///     ├── GET, PATCH, PUT, DELETE /boards/:board_id
///     ├── GET              /boards/:board_id/tasks
///     ├── POST             /email-check
///     ├── POST             /tasks
///     ├── GET              /tasks/assigned-to-me
///     ├── GET              /tasks/reviewing
///     ├── GET, PATCH, DELETE /tasks/:task_id
///     ├── GET, POST        /tasks/:task_id/comments
///     └── DELETE           /tasks/:task_id/comments/:comment_id
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Authentication (the `/v1` subtree)
pub fn build_router(state: AppState) -> Router {
    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let board_routes = Router::new()
        .route(
            "/",
            get(routes::boards::list_boards).post(routes::boards::create_board),
        )
        .route(
            "/:board_id",
            get(routes::boards::get_board)
                .patch(routes::boards::update_board)
                .put(routes::boards::update_board)
                .delete(routes::boards::delete_board),
        )
        .route("/:board_id/tasks", get(routes::boards::list_board_tasks));

    let task_routes = Router::new()
        .route("/", post(routes::tasks::create_task))
        .route("/assigned-to-me", get(routes::tasks::assigned_to_me))
        .route("/reviewing", get(routes::tasks::reviewing))
        .route(
            "/:task_id",
            get(routes::tasks::get_task)
                .patch(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route(
            "/:task_id/comments",
            get(routes::comments::list_comments).post(routes::comments::add_comment),
        )
        .route(
            "/:task_id/comments/:comment_id",
            delete(routes::comments::delete_comment),
        );

    let v1_routes = Router::new()
        .nest("/boards", board_routes)
        .nest("/tasks", task_routes)
        .route("/email-check", post(routes::users::email_check))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.api.cors_origins.iter().any(|origin| origin == "*") {
        // Development mode: permissive CORS
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

/// JWT authentication middleware layer
///
/// Validates the bearer token, then injects `AuthContext` into request
/// extensions for the `AuthContext` extractor.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = authenticate(req.headers(), state.jwt_secret())?;
    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}
