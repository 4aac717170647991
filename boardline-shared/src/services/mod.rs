/// The board core: Board Registry, Task Store and Comment Log
///
/// Every operation follows the same sequence:
///
/// 1. open a storage transaction with the lock scope the operation needs
/// 2. fetch the entities involved
/// 3. ask the authorization engine (absence is reported before permission)
/// 4. validate input, collecting every field problem
/// 5. write and commit
///
/// Failures are returned to the caller and never logged here.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use boardline_shared::identity::MemoryDirectory;
/// use boardline_shared::models::{board::NewBoard, user::User};
/// use boardline_shared::services::Services;
/// use boardline_shared::storage::MemoryStorage;
///
/// # async fn example() -> Result<(), boardline_shared::error::BoardError> {
/// let directory = Arc::new(MemoryDirectory::new());
/// let ada = directory.insert(User::new("ada@example.com", "Ada Lovelace"));
///
/// let services = Services::new(Arc::new(MemoryStorage::new()), directory);
/// let board = services
///     .boards
///     .create_board(ada.id, NewBoard { title: "Sprint 1".to_string(), members: vec![] })
///     .await?;
///
/// assert_eq!(board.member_count, 1);
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;
use uuid::Uuid;

use crate::auth::authorization::{authorize, Action, EntityKind, Snapshot};
use crate::error::{BoardError, BoardResult, ValidationErrors};
use crate::identity::IdentityProvider;
use crate::models::board::Board;
use crate::storage::Storage;

pub mod boards;
pub mod comments;
pub mod tasks;

pub use boards::BoardRegistry;
pub use comments::CommentLog;
pub use tasks::TaskStore;

pub const BLANK_FIELD: &str = "This field may not be blank.";
pub const NULL_FIELD: &str = "This field may not be null.";
pub const USER_DOES_NOT_EXIST: &str = "User does not exist.";
pub const USER_NOT_A_MEMBER: &str = "User must be a member of the board.";

/// All three stores over one storage backend and identity provider
#[derive(Clone)]
pub struct Services {
    pub boards: BoardRegistry,
    pub tasks: TaskStore,
    pub comments: CommentLog,
    identity: Arc<dyn IdentityProvider>,
}

impl Services {
    pub fn new(storage: Arc<dyn Storage>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            boards: BoardRegistry::new(storage.clone(), identity.clone()),
            tasks: TaskStore::new(storage.clone(), identity.clone()),
            comments: CommentLog::new(storage, identity.clone()),
            identity,
        }
    }

    /// Identity provider the stores resolve users through
    pub fn identity(&self) -> &dyn IdentityProvider {
        self.identity.as_ref()
    }
}

/// Authorizes a board-level action and hands back the board
///
/// A missing board is reported as not-found before any permission check.
pub(crate) fn authorized_board(
    board: Option<Board>,
    action: Action,
    requester: Uuid,
    board_id: Uuid,
) -> BoardResult<Board> {
    authorize(
        EntityKind::Board,
        action,
        requester,
        &Snapshot::board(board.as_ref()),
        board_id,
    )?;
    board.ok_or(BoardError::not_found(EntityKind::Board, board_id))
}

/// Unwraps a patched required field; an explicit null is recorded as an error
pub(crate) fn check_not_null<T>(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<Option<T>>,
) -> Option<T> {
    match value {
        Some(Some(value)) => Some(value),
        Some(None) => {
            errors.add(field, NULL_FIELD);
            None
        }
        None => None,
    }
}

/// Trims and checks a required title, recording problems under `field`
///
/// Returns the trimmed value only when it is valid.
pub(crate) fn check_title(
    errors: &mut ValidationErrors,
    field: &str,
    value: &str,
    max_chars: usize,
) -> Option<String> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        errors.add(field, BLANK_FIELD);
        return None;
    }

    if trimmed.chars().count() > max_chars {
        errors.add(
            field,
            format!("Ensure this field has no more than {} characters.", max_chars),
        );
        return None;
    }

    Some(trimmed.to_string())
}

/// Checks that every id resolves, recording one combined message under `field`
pub(crate) async fn check_user_ids(
    errors: &mut ValidationErrors,
    identity: &dyn IdentityProvider,
    field: &str,
    ids: &[Uuid],
) -> BoardResult<()> {
    let mut invalid = Vec::new();
    for id in ids {
        if !identity.exists(*id).await? && !invalid.contains(id) {
            invalid.push(*id);
        }
    }

    if !invalid.is_empty() {
        let listed: Vec<String> = invalid.iter().map(Uuid::to_string).collect();
        errors.add(field, format!("Invalid user IDs: {}", listed.join(", ")));
    }

    Ok(())
}

/// Checks an assignee or reviewer against the identity provider and the board
pub(crate) async fn check_participant(
    errors: &mut ValidationErrors,
    identity: &dyn IdentityProvider,
    board: &Board,
    field: &str,
    user_id: Option<Uuid>,
) -> BoardResult<()> {
    let Some(user_id) = user_id else {
        return Ok(());
    };

    if !identity.exists(user_id).await? {
        errors.add(field, USER_DOES_NOT_EXIST);
    } else if !board.is_member(user_id) {
        errors.add(field, USER_NOT_A_MEMBER);
    }

    Ok(())
}
