/// User model and read-only database lookups
///
/// User accounts are owned by the identity provider. The board core never
/// creates or edits users; it only resolves ids and e-mail addresses into
/// display records.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email VARCHAR(255) NOT NULL UNIQUE,
///     fullname VARCHAR(255) NOT NULL DEFAULT '',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use boardline_shared::models::user::User;
/// use boardline_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// if let Some(user) = User::find_by_email(&pool, "user@example.com").await? {
///     println!("{} <{}>", user.fullname, user.email);
/// }
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Public user record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// E-mail address (unique, compared case-insensitively)
    pub email: String,

    /// Display name
    pub fullname: String,
}

impl User {
    pub fn new(email: impl Into<String>, fullname: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            fullname: fullname.into(),
        }
    }

    /// Finds a user by ID
    ///
    /// # Arguments
    ///
    /// * `pool` - Database connection pool
    /// * `id` - User ID to search for
    ///
    /// # Returns
    ///
    /// The user if found, None otherwise
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, fullname
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by e-mail address (case-insensitive)
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, fullname
            FROM users
            WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Returns true if a user with this ID exists
    pub async fn exists(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)
            "#,
        )
        .bind(id)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// Inserts a user row
    ///
    /// Only used to seed directories and tests; the API never creates users.
    pub async fn insert(pool: &PgPool, user: &User) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, fullname)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.fullname)
        .execute(pool)
        .await?;

        Ok(())
    }
}
