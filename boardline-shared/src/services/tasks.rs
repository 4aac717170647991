use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::{authorized_board, check_not_null, check_participant, check_title};
use crate::auth::authorization::{authorize, Action, EntityKind, Snapshot};
use crate::error::{BoardError, BoardResult, ValidationErrors};
use crate::identity::IdentityProvider;
use crate::models::board::Board;
use crate::models::task::{NewTask, Task, TaskPatch, TaskSummary, MAX_TASK_TITLE_LENGTH};
use crate::storage::{LockScope, Storage, StorageTx};

/// Owns tasks, each scoped to one board
#[derive(Clone)]
pub struct TaskStore {
    storage: Arc<dyn Storage>,
    identity: Arc<dyn IdentityProvider>,
}

impl TaskStore {
    pub fn new(storage: Arc<dyn Storage>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { storage, identity }
    }

    /// Opens a transaction locked on the task's board and loads both rows
    ///
    /// The task is re-read under the lock, so a task deleted in between is
    /// reported as not-found.
    async fn begin_for_task(
        &self,
        task_id: Uuid,
        scope: fn(Uuid) -> LockScope,
    ) -> BoardResult<(Box<dyn StorageTx>, Task, Option<Board>)> {
        let board_id = self
            .storage
            .board_of_task(task_id)
            .await?
            .ok_or(BoardError::not_found(EntityKind::Task, task_id))?;

        let mut tx = self.storage.begin(scope(board_id)).await?;
        let task = tx
            .task(task_id)
            .await?
            .ok_or(BoardError::not_found(EntityKind::Task, task_id))?;
        let board = tx.board(board_id).await?;

        Ok((tx, task, board))
    }

    /// Creates a task on a board the requester belongs to
    ///
    /// `created_by` is always the requester. Status defaults to `to-do` and
    /// priority to `medium`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the board does not exist
    /// - `Forbidden` if the requester is not a board member
    /// - `Validation` on `title`, `assignee_id` and `reviewer_id`, collected
    #[instrument(skip_all, fields(board_id = %board_id, requester = %requester))]
    pub async fn create_task(&self, board_id: Uuid, requester: Uuid, data: NewTask) -> BoardResult<Task> {
        let mut tx = self.storage.begin(LockScope::Exclusive(board_id)).await?;

        let board = tx.board(board_id).await?;
        authorize(
            EntityKind::Task,
            Action::Create,
            requester,
            &Snapshot::board(board.as_ref()),
            board_id,
        )?;
        let board = board.ok_or(BoardError::not_found(EntityKind::Board, board_id))?;

        let mut errors = ValidationErrors::new();
        let title = check_title(&mut errors, "title", &data.title, MAX_TASK_TITLE_LENGTH);
        check_participant(&mut errors, self.identity.as_ref(), &board, "assignee_id", data.assignee_id).await?;
        check_participant(&mut errors, self.identity.as_ref(), &board, "reviewer_id", data.reviewer_id).await?;
        errors.into_result()?;

        let task = Task::from_new(
            board_id,
            requester,
            NewTask {
                title: title.unwrap_or_default(),
                ..data
            },
        );

        tx.insert_task(&task).await?;
        tx.commit().await?;

        debug!(task_id = %task.id, "Task created");

        Ok(task)
    }

    /// Applies a partial update
    ///
    /// Present fields (explicit nulls included) are written; absent fields
    /// stay as they are. A null on `title`, `status` or `priority` is a
    /// validation error. Assignee and reviewer are re-validated against the
    /// board whenever a value is supplied.
    #[instrument(skip_all, fields(task_id = %task_id, requester = %requester))]
    pub async fn update_task(&self, task_id: Uuid, requester: Uuid, mut patch: TaskPatch) -> BoardResult<Task> {
        let (mut tx, mut task, board) = self.begin_for_task(task_id, LockScope::Exclusive).await?;

        authorize(
            EntityKind::Task,
            Action::Update,
            requester,
            &Snapshot::task(Some(&task), board.as_ref()),
            task.board_id,
        )?;
        let board = board.ok_or(BoardError::not_found(EntityKind::Board, task.board_id))?;

        let mut errors = ValidationErrors::new();
        if let Some(title) = check_not_null(&mut errors, "title", patch.title.take()) {
            patch.title = check_title(&mut errors, "title", &title, MAX_TASK_TITLE_LENGTH).map(Some);
        }
        patch.status = check_not_null(&mut errors, "status", patch.status.take()).map(Some);
        patch.priority = check_not_null(&mut errors, "priority", patch.priority.take()).map(Some);
        if let Some(assignee) = patch.assignee_id {
            check_participant(&mut errors, self.identity.as_ref(), &board, "assignee_id", assignee).await?;
        }
        if let Some(reviewer) = patch.reviewer_id {
            check_participant(&mut errors, self.identity.as_ref(), &board, "reviewer_id", reviewer).await?;
        }
        errors.into_result()?;

        task.apply(patch);

        tx.update_task(&task).await?;
        tx.commit().await?;

        debug!("Task updated");

        Ok(task)
    }

    /// Deletes a task and its comments
    ///
    /// Allowed for the task's creator and the board owner.
    #[instrument(skip_all, fields(task_id = %task_id, requester = %requester))]
    pub async fn delete_task(&self, task_id: Uuid, requester: Uuid) -> BoardResult<()> {
        let (mut tx, task, board) = self.begin_for_task(task_id, LockScope::Exclusive).await?;

        authorize(
            EntityKind::Task,
            Action::Delete,
            requester,
            &Snapshot::task(Some(&task), board.as_ref()),
            task.board_id,
        )?;

        let comment_ids: Vec<Uuid> = tx
            .comments_for_task(task_id)
            .await?
            .into_iter()
            .map(|c| c.id)
            .collect();

        tx.delete_comments(&comment_ids).await?;
        tx.delete_tasks(&[task_id]).await?;
        tx.commit().await?;

        debug!(comments = comment_ids.len(), "Task deleted");

        Ok(())
    }

    /// Single task with its comment count
    #[instrument(skip_all, fields(task_id = %task_id, requester = %requester))]
    pub async fn get_task(&self, task_id: Uuid, requester: Uuid) -> BoardResult<TaskSummary> {
        let (mut tx, task, board) = self.begin_for_task(task_id, LockScope::Shared).await?;

        authorize(
            EntityKind::Task,
            Action::Read,
            requester,
            &Snapshot::task(Some(&task), board.as_ref()),
            task.board_id,
        )?;

        let comments_count = tx.count_comments(task_id).await?;
        tx.commit().await?;

        Ok(TaskSummary {
            task,
            comments_count,
        })
    }

    /// Every task of a board, oldest first
    #[instrument(skip_all, fields(board_id = %board_id, requester = %requester))]
    pub async fn list_board_tasks(&self, board_id: Uuid, requester: Uuid) -> BoardResult<Vec<TaskSummary>> {
        let mut tx = self.storage.begin(LockScope::Shared(board_id)).await?;

        authorized_board(tx.board(board_id).await?, Action::Read, requester, board_id)?;

        let mut summaries = Vec::new();
        for task in tx.tasks_for_board(board_id).await? {
            let comments_count = tx.count_comments(task.id).await?;
            summaries.push(TaskSummary {
                task,
                comments_count,
            });
        }
        tx.commit().await?;

        Ok(summaries)
    }

    /// Tasks assigned to `user_id`, across all boards
    ///
    /// Not filtered by current membership: a user removed from a board still
    /// sees tasks that were assigned while they were a member.
    #[instrument(skip_all, fields(user_id = %user_id))]
    pub async fn assigned_to(&self, user_id: Uuid) -> BoardResult<Vec<Task>> {
        let mut tx = self.storage.begin(LockScope::None).await?;
        let tasks = tx.tasks_assigned_to(user_id).await?;
        tx.commit().await?;
        Ok(tasks)
    }

    /// Tasks `user_id` reviews, across all boards
    #[instrument(skip_all, fields(user_id = %user_id))]
    pub async fn reviewing(&self, user_id: Uuid) -> BoardResult<Vec<Task>> {
        let mut tx = self.storage.begin(LockScope::None).await?;
        let tasks = tx.tasks_reviewed_by(user_id).await?;
        tx.commit().await?;
        Ok(tasks)
    }
}
