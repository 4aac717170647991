use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::BLANK_FIELD;
use crate::auth::authorization::{authorize, Action, EntityKind, Snapshot};
use crate::error::{BoardError, BoardResult};
use crate::identity::IdentityProvider;
use crate::models::comment::{Comment, CommentView};
use crate::storage::{LockScope, Storage};

/// Append-only comments on tasks
#[derive(Clone)]
pub struct CommentLog {
    storage: Arc<dyn Storage>,
    identity: Arc<dyn IdentityProvider>,
}

impl CommentLog {
    pub fn new(storage: Arc<dyn Storage>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { storage, identity }
    }

    async fn author_name(&self, author_id: Uuid) -> BoardResult<Option<String>> {
        Ok(self.identity.resolve_user(author_id).await?.map(|u| u.fullname))
    }

    /// Adds a comment authored by the requester
    ///
    /// Content is stored trimmed and must not be empty.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the task does not exist
    /// - `Forbidden` if the requester is not a member of the task's board
    /// - `Validation` on `content`
    #[instrument(skip_all, fields(task_id = %task_id, requester = %requester))]
    pub async fn add_comment(&self, task_id: Uuid, requester: Uuid, content: &str) -> BoardResult<CommentView> {
        let board_id = self
            .storage
            .board_of_task(task_id)
            .await?
            .ok_or(BoardError::not_found(EntityKind::Task, task_id))?;

        let mut tx = self.storage.begin(LockScope::Shared(board_id)).await?;

        let task = tx
            .task(task_id)
            .await?
            .ok_or(BoardError::not_found(EntityKind::Task, task_id))?;
        let board = tx.board(board_id).await?;
        authorize(
            EntityKind::Comment,
            Action::Create,
            requester,
            &Snapshot::task(Some(&task), board.as_ref()),
            board_id,
        )?;

        let content = content.trim();
        if content.is_empty() {
            return Err(BoardError::invalid("content", BLANK_FIELD));
        }

        let comment = Comment::new(task_id, requester, content.to_string());
        tx.insert_comment(&comment).await?;
        tx.commit().await?;

        debug!(comment_id = %comment.id, "Comment added");

        let author = self.author_name(requester).await?;
        Ok(CommentView::new(comment, author))
    }

    /// Comments of a task, oldest first
    #[instrument(skip_all, fields(task_id = %task_id, requester = %requester))]
    pub async fn list_comments(&self, task_id: Uuid, requester: Uuid) -> BoardResult<Vec<CommentView>> {
        let board_id = self
            .storage
            .board_of_task(task_id)
            .await?
            .ok_or(BoardError::not_found(EntityKind::Task, task_id))?;

        let mut tx = self.storage.begin(LockScope::Shared(board_id)).await?;

        let task = tx
            .task(task_id)
            .await?
            .ok_or(BoardError::not_found(EntityKind::Task, task_id))?;
        let board = tx.board(board_id).await?;
        authorize(
            EntityKind::Comment,
            Action::Read,
            requester,
            &Snapshot::task(Some(&task), board.as_ref()),
            board_id,
        )?;

        let comments = tx.comments_for_task(task_id).await?;
        tx.commit().await?;

        let mut names: HashMap<Uuid, Option<String>> = HashMap::new();
        let mut views = Vec::with_capacity(comments.len());
        for comment in comments {
            let author = match names.get(&comment.author_id) {
                Some(name) => name.clone(),
                None => {
                    let name = self.author_name(comment.author_id).await?;
                    names.insert(comment.author_id, name.clone());
                    name
                }
            };
            views.push(CommentView::new(comment, author));
        }

        Ok(views)
    }

    /// Deletes a comment; author only
    ///
    /// A comment that exists but belongs to a different task is reported
    /// as not-found.
    #[instrument(skip_all, fields(task_id = %task_id, comment_id = %comment_id, requester = %requester))]
    pub async fn delete_comment(&self, task_id: Uuid, comment_id: Uuid, requester: Uuid) -> BoardResult<()> {
        let not_found = || BoardError::not_found(EntityKind::Comment, comment_id);

        let board_id = self.storage.board_of_task(task_id).await?.ok_or_else(not_found)?;
        let mut tx = self.storage.begin(LockScope::Shared(board_id)).await?;

        let comment = tx
            .comment(comment_id)
            .await?
            .filter(|c| c.task_id == task_id);
        authorize(
            EntityKind::Comment,
            Action::Delete,
            requester,
            &Snapshot::comment(comment.as_ref()),
            comment_id,
        )?;

        tx.delete_comments(&[comment_id]).await?;
        tx.commit().await?;

        debug!("Comment deleted");

        Ok(())
    }
}
