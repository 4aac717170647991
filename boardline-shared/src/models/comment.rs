/// Comment model
///
/// Comments are append-only notes on a task. They are never edited; only
/// their author may delete them.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE comments (
///     id UUID PRIMARY KEY,
///     seq BIGSERIAL NOT NULL,
///     task_id UUID NOT NULL REFERENCES tasks(id),
///     author_id UUID NOT NULL REFERENCES users(id),
///     content TEXT NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// `seq` breaks ties between comments created in the same instant so that
/// listing order is stable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Comment entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: Uuid,

    /// Task the comment belongs to (immutable)
    pub task_id: Uuid,

    pub author_id: Uuid,

    /// Trimmed, never empty
    pub content: String,

    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(task_id: Uuid, author_id: Uuid, content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            task_id,
            author_id,
            content,
            created_at: Utc::now(),
        }
    }
}

/// Input for adding a comment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewComment {
    pub content: String,
}

/// Comment with the author's display name resolved
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentView {
    pub id: Uuid,
    pub task_id: Uuid,
    pub author_id: Uuid,

    /// Author's full name, or `None` if the user can no longer be resolved
    pub author: Option<String>,

    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl CommentView {
    pub fn new(comment: Comment, author: Option<String>) -> Self {
        Self {
            id: comment.id,
            task_id: comment.task_id,
            author_id: comment.author_id,
            author,
            content: comment.content,
            created_at: comment.created_at,
        }
    }
}
