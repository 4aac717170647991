/// Configuration management for the API server
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `CORS_ORIGINS`: Comma separated allowed origins (default: `*`)
/// - `STORAGE_BACKEND`: `memory` (default) or `postgres`
/// - `DATABASE_URL`: PostgreSQL connection string (required for `postgres`)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `DIRECTORY_SEED`: JSON file of users for the in-memory directory
/// - `JWT_SECRET`: Secret key for JWT validation (required)
/// - `LOG_FORMAT`: `pretty` (default) or `json`
/// - `RUST_LOG`: Log filter (default: `boardline_api=debug,boardline_shared=debug,tower_http=debug`)
///
/// # Example
///
/// ```no_run
/// use boardline_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,

    pub storage: StorageConfig,

    pub jwt: JwtConfig,

    pub log_format: LogFormat,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,

    pub port: u16,

    /// `["*"]` allows any origin
    pub cors_origins: Vec<String>,
}

/// Which backend holds boards, tasks and comments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Postgres,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            other => anyhow::bail!("Unknown STORAGE_BACKEND '{}' (expected memory or postgres)", other),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,

    /// Present when `backend` is `postgres`
    pub database: Option<DatabaseConfig>,

    /// Users preloaded into the in-memory directory
    pub directory_seed: Option<PathBuf>,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Shared secret of the token issuer
    ///
    /// IMPORTANT: This must be kept secret and should be at least 32 bytes.
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => anyhow::bail!("Unknown LOG_FORMAT '{}' (expected pretty or json)", other),
        }
    }
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// A `.env` file in the working directory is read first if present.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing
    /// - Environment variables have invalid values
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = lookup("API_PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse::<u16>()?;

        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let backend = match lookup("STORAGE_BACKEND") {
            Some(value) => value.parse()?,
            None => StorageBackend::Memory,
        };

        let database = match backend {
            StorageBackend::Memory => None,
            StorageBackend::Postgres => {
                let url = lookup("DATABASE_URL").ok_or_else(|| {
                    anyhow::anyhow!("DATABASE_URL environment variable is required for the postgres backend")
                })?;
                let max_connections = lookup("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|| "10".to_string())
                    .parse::<u32>()?;

                Some(DatabaseConfig { url, max_connections })
            }
        };

        let directory_seed = lookup("DIRECTORY_SEED").map(PathBuf::from);

        let jwt_secret = lookup("JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let log_format = match lookup("LOG_FORMAT") {
            Some(value) => value.parse()?,
            None => LogFormat::Pretty,
        };

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                cors_origins,
            },
            storage: StorageConfig {
                backend,
                database,
                directory_seed,
            },
            jwt: JwtConfig { secret: jwt_secret },
            log_format,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("JWT_SECRET", SECRET)]).unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.api.cors_origins, vec!["*".to_string()]);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert!(config.storage.database.is_none());
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_postgres_requires_database_url() {
        let err = load(&[("JWT_SECRET", SECRET), ("STORAGE_BACKEND", "postgres")]).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));

        let config = load(&[
            ("JWT_SECRET", SECRET),
            ("STORAGE_BACKEND", "postgres"),
            ("DATABASE_URL", "postgresql://localhost/boardline"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
        ])
        .unwrap();
        let database = config.storage.database.unwrap();
        assert_eq!(database.url, "postgresql://localhost/boardline");
        assert_eq!(database.max_connections, 4);
    }

    #[test]
    fn test_short_secret_is_rejected() {
        assert!(load(&[("JWT_SECRET", "short")]).is_err());
        assert!(load(&[]).is_err());
    }

    #[test]
    fn test_cors_origins_are_split() {
        let config = load(&[
            ("JWT_SECRET", SECRET),
            ("CORS_ORIGINS", "https://a.example, https://b.example,"),
            ("LOG_FORMAT", "json"),
        ])
        .unwrap();

        assert_eq!(config.api.cors_origins, vec!["https://a.example", "https://b.example"]);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_unknown_backend() {
        assert!(load(&[("JWT_SECRET", SECRET), ("STORAGE_BACKEND", "redis")]).is_err());
    }
}
