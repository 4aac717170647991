use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::{authorized_board, check_not_null, check_title, check_user_ids};
use crate::auth::authorization::Action;
use crate::error::{BoardResult, ValidationErrors};
use crate::identity::{resolve_existing, IdentityProvider};
use crate::models::board::{
    Board, BoardChanges, BoardDetail, BoardMembership, BoardSummary, NewBoard,
    MAX_BOARD_TITLE_LENGTH,
};
use crate::models::task::TaskSummary;
use crate::storage::{LockScope, Storage};

/// Owns boards and their membership sets
#[derive(Clone)]
pub struct BoardRegistry {
    storage: Arc<dyn Storage>,
    identity: Arc<dyn IdentityProvider>,
}

impl BoardRegistry {
    pub fn new(storage: Arc<dyn Storage>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { storage, identity }
    }

    /// Creates a board owned by `requester`
    ///
    /// The requester is always a member, whatever `data.members` says.
    ///
    /// # Errors
    ///
    /// - `Validation` on `title` if blank or longer than 100 characters
    /// - `Validation` on `members` listing every id the identity provider
    ///   does not know
    #[instrument(skip_all, fields(requester = %requester))]
    pub async fn create_board(&self, requester: Uuid, data: NewBoard) -> BoardResult<BoardSummary> {
        let mut errors = ValidationErrors::new();
        let title = check_title(&mut errors, "title", &data.title, MAX_BOARD_TITLE_LENGTH);
        check_user_ids(&mut errors, self.identity.as_ref(), "members", &data.members).await?;
        errors.into_result()?;

        let board = Board::new(title.unwrap_or_default(), requester, data.members);

        let mut tx = self.storage.begin(LockScope::None).await?;
        tx.insert_board(&board).await?;
        tx.commit().await?;

        debug!(board_id = %board.id, members = board.members.len(), "Board created");

        Ok(BoardSummary::new(&board, &[]))
    }

    /// Changes title and/or membership
    ///
    /// An empty member list is "no change". A non-empty one replaces the
    /// whole set; the owner is put back if omitted. Existing assignments are
    /// not re-checked against the new membership.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the board does not exist
    /// - `Forbidden` if the requester is not a member
    /// - `Validation` on `title` and/or `members`
    #[instrument(skip_all, fields(board_id = %board_id, requester = %requester))]
    pub async fn update_board(
        &self,
        board_id: Uuid,
        requester: Uuid,
        mut changes: BoardChanges,
    ) -> BoardResult<BoardMembership> {
        let mut tx = self.storage.begin(LockScope::Exclusive(board_id)).await?;

        let mut board = authorized_board(tx.board(board_id).await?, Action::Update, requester, board_id)?;

        let mut errors = ValidationErrors::new();
        let title = match check_not_null(&mut errors, "title", changes.title.take()) {
            Some(title) => check_title(&mut errors, "title", &title, MAX_BOARD_TITLE_LENGTH),
            None => None,
        };
        let members = changes.requested_members();
        if let Some(ids) = members {
            check_user_ids(&mut errors, self.identity.as_ref(), "members", ids).await?;
        }
        errors.into_result()?;

        if let Some(title) = title {
            board.title = title;
        }
        if let Some(ids) = members {
            board.replace_members(ids.iter().copied());
        }

        tx.update_board(&board).await?;
        tx.commit().await?;

        debug!(members = board.members.len(), "Board updated");

        let owner = self.identity.resolve_user(board.owner_id).await?;
        let members = resolve_existing(self.identity.as_ref(), board.members.iter().copied()).await?;

        Ok(BoardMembership {
            id: board.id,
            title: board.title,
            owner,
            members,
        })
    }

    /// Deletes a board with all of its tasks and their comments
    ///
    /// Owner only. Members that are not the owner get `Forbidden`, exactly
    /// like non-members.
    #[instrument(skip_all, fields(board_id = %board_id, requester = %requester))]
    pub async fn delete_board(&self, board_id: Uuid, requester: Uuid) -> BoardResult<()> {
        let mut tx = self.storage.begin(LockScope::Exclusive(board_id)).await?;

        authorized_board(tx.board(board_id).await?, Action::Delete, requester, board_id)?;

        let task_ids: Vec<Uuid> = tx
            .tasks_for_board(board_id)
            .await?
            .into_iter()
            .map(|t| t.id)
            .collect();

        let mut comment_ids = Vec::new();
        for task_id in &task_ids {
            comment_ids.extend(tx.comments_for_task(*task_id).await?.into_iter().map(|c| c.id));
        }

        tx.delete_comments(&comment_ids).await?;
        tx.delete_tasks(&task_ids).await?;
        tx.delete_board(board_id).await?;
        tx.commit().await?;

        debug!(
            tasks = task_ids.len(),
            comments = comment_ids.len(),
            "Board deleted"
        );

        Ok(())
    }

    /// Boards the user is a member of, with task counters
    #[instrument(skip_all, fields(user_id = %user_id))]
    pub async fn list_boards_for_user(&self, user_id: Uuid) -> BoardResult<Vec<BoardSummary>> {
        let mut tx = self.storage.begin(LockScope::None).await?;

        let boards = tx.boards_for_member(user_id).await?;
        let mut summaries = Vec::with_capacity(boards.len());
        for board in &boards {
            let tasks = tx.tasks_for_board(board.id).await?;
            summaries.push(BoardSummary::new(board, &tasks));
        }

        tx.commit().await?;
        Ok(summaries)
    }

    /// Board with resolved members and its tasks
    ///
    /// Members the identity provider no longer knows are left out.
    #[instrument(skip_all, fields(board_id = %board_id, requester = %requester))]
    pub async fn get_board_detail(&self, board_id: Uuid, requester: Uuid) -> BoardResult<BoardDetail> {
        let mut tx = self.storage.begin(LockScope::Shared(board_id)).await?;

        let board = authorized_board(tx.board(board_id).await?, Action::Read, requester, board_id)?;

        let mut tasks = Vec::new();
        for task in tx.tasks_for_board(board_id).await? {
            let comments_count = tx.count_comments(task.id).await?;
            tasks.push(TaskSummary {
                task,
                comments_count,
            });
        }
        tx.commit().await?;

        let members = resolve_existing(self.identity.as_ref(), board.members.iter().copied()).await?;

        Ok(BoardDetail {
            id: board.id,
            title: board.title,
            owner_id: board.owner_id,
            members,
            tasks,
        })
    }
}
