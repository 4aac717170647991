/// Schema migrations
///
/// Migrations are embedded from `boardline-shared/migrations/` at compile
/// time and applied with sqlx's migrator, which records progress in
/// `_sqlx_migrations`.
///
/// # Example
///
/// ```no_run
/// use boardline_shared::db::migrations::run_migrations;
/// use boardline_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::from_url("postgresql://localhost/boardline")).await?;
/// run_migrations(&pool).await?;
/// # Ok(())
/// # }
/// ```

use sqlx::{migrate::MigrateDatabase, migrate::Migrator, postgres::PgPool, Postgres};
use tracing::{info, warn};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Applies every pending migration
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!(available = MIGRATOR.iter().count(), "Running database migrations");

    MIGRATOR.run(pool).await.map_err(|e| {
        warn!("Migration failed: {}", e);
        e
    })?;

    info!("Database schema is up to date");
    Ok(())
}

/// Number of migrations shipped with this build
pub fn embedded_migration_count() -> usize {
    MIGRATOR.iter().count()
}

/// Creates the database named in `database_url` if it is missing
///
/// Meant for development and test setups.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), sqlx::Error> {
    if !Postgres::database_exists(database_url).await? {
        info!("Creating database");
        Postgres::create_database(database_url).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_embedded() {
        assert!(embedded_migration_count() >= 1);
    }
}
