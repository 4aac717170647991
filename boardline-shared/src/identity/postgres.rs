use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::IdentityProvider;
use crate::error::BoardResult;
use crate::models::user::User;

/// Read-only directory over the `users` table
#[derive(Debug, Clone)]
pub struct PgDirectory {
    pool: PgPool,
}

impl PgDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityProvider for PgDirectory {
    async fn resolve_user(&self, id: Uuid) -> BoardResult<Option<User>> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn resolve_user_by_email(&self, email: &str) -> BoardResult<Option<User>> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn exists(&self, id: Uuid) -> BoardResult<bool> {
        Ok(User::exists(&self.pool, id).await?)
    }
}
