use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use super::IdentityProvider;
use crate::error::{BoardError, BoardResult};
use crate::models::user::User;

/// In-process user directory
///
/// Used by the in-memory deployment and by tests. Users can be added at any
/// time; the stores only ever read.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a directory from a JSON array of `{id, email, fullname}` objects
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let users: Vec<User> = serde_json::from_str(json)?;
        let directory = Self::new();
        for user in users {
            directory.insert(user);
        }
        Ok(directory)
    }

    /// Adds (or replaces) a user and returns it
    pub fn insert(&self, user: User) -> User {
        if let Ok(mut users) = self.users.write() {
            users.insert(user.id, user.clone());
        }
        user
    }

    /// Forgets a user; boards and comments keep referring to the id
    pub fn remove(&self, id: Uuid) -> Option<User> {
        self.users.write().ok().and_then(|mut users| users.remove(&id))
    }

    pub fn len(&self) -> usize {
        self.users.read().map(|users| users.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> BoardError {
    BoardError::Storage("user directory lock poisoned".to_string())
}

#[async_trait]
impl IdentityProvider for MemoryDirectory {
    async fn resolve_user(&self, id: Uuid) -> BoardResult<Option<User>> {
        let users = self.users.read().map_err(|_| poisoned())?;
        Ok(users.get(&id).cloned())
    }

    async fn resolve_user_by_email(&self, email: &str) -> BoardResult<Option<User>> {
        let users = self.users.read().map_err(|_| poisoned())?;
        Ok(users
            .values()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolve_by_id_and_email() {
        let directory = MemoryDirectory::new();
        let user = directory.insert(User::new("grace@example.com", "Grace Hopper"));

        assert_eq!(directory.resolve_user(user.id).await.unwrap(), Some(user.clone()));
        assert_eq!(
            directory.resolve_user_by_email("Grace@Example.com").await.unwrap(),
            Some(user.clone())
        );
        assert!(directory.resolve_user(Uuid::new_v4()).await.unwrap().is_none());
        assert!(directory
            .resolve_user_by_email("nobody@example.com")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_exists_default_impl() {
        let directory = MemoryDirectory::new();
        let user = directory.insert(User::new("a@example.com", "A"));

        assert!(directory.exists(user.id).await.unwrap());
        assert!(!directory.exists(Uuid::new_v4()).await.unwrap());
    }

    #[test]
    fn test_from_json() {
        let id = Uuid::new_v4();
        let json = format!(
            r#"[{{"id": "{}", "email": "ada@example.com", "fullname": "Ada Lovelace"}}]"#,
            id
        );

        let directory = MemoryDirectory::from_json(&json).unwrap();
        assert_eq!(directory.len(), 1);

        assert!(MemoryDirectory::from_json("not json").is_err());
    }
}
