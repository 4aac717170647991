/// Identity provider seam
///
/// User registration and credentials live outside Boardline. The stores only
/// need to resolve ids and e-mail addresses into [`User`] records, which
/// they do through the [`IdentityProvider`] trait.
///
/// Two implementations ship with the crate:
///
/// - [`MemoryDirectory`]: a mutable in-process directory, seedable from JSON
/// - [`PgDirectory`]: read-only lookups over the `users` table
///
/// # Example
///
/// ```
/// use boardline_shared::identity::{IdentityProvider, MemoryDirectory};
/// use boardline_shared::models::user::User;
///
/// # async fn example() -> Result<(), boardline_shared::error::BoardError> {
/// let directory = MemoryDirectory::new();
/// let ada = directory.insert(User::new("ada@example.com", "Ada Lovelace"));
///
/// assert!(directory.exists(ada.id).await?);
/// assert_eq!(
///     directory.resolve_user_by_email("ADA@example.com").await?.map(|u| u.id),
///     Some(ada.id)
/// );
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::BoardResult;
use crate::models::user::User;

pub mod memory;
pub mod postgres;

pub use memory::MemoryDirectory;
pub use postgres::PgDirectory;

/// Resolves users by id or e-mail
///
/// `Ok(None)` means the user does not exist; `Err` is reserved for backend
/// failures.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn resolve_user(&self, id: Uuid) -> BoardResult<Option<User>>;

    /// E-mail comparison is case-insensitive
    async fn resolve_user_by_email(&self, email: &str) -> BoardResult<Option<User>>;

    async fn exists(&self, id: Uuid) -> BoardResult<bool> {
        Ok(self.resolve_user(id).await?.is_some())
    }
}

/// Resolves `ids` in order, skipping ids the provider no longer knows
pub async fn resolve_existing(
    identity: &dyn IdentityProvider,
    ids: impl IntoIterator<Item = Uuid>,
) -> BoardResult<Vec<User>> {
    let mut users = Vec::new();
    for id in ids {
        match identity.resolve_user(id).await? {
            Some(user) => users.push(user),
            None => tracing::warn!(user_id = %id, "Skipping unresolvable user"),
        }
    }
    Ok(users)
}
