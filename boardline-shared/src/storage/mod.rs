/// Transactional storage seam
///
/// The stores never talk to a backend directly. They open a [`StorageTx`]
/// scoped to the board they are about to touch, read what they need,
/// decide, then write and commit. Dropping a transaction without calling
/// [`StorageTx::commit`] discards every staged write.
///
/// # Lock scopes
///
/// A board's membership, its task set and every task's assignee/reviewer
/// form one consistency domain. [`LockScope`] says how much of that domain
/// a transaction needs:
///
/// | Scope | Held by |
/// |---|---|
/// | `Exclusive(board)` | membership changes, task writes, cascading deletes |
/// | `Shared(board)` | board/task reads, comment appends and deletes |
/// | `None` | board creation, cross-board queries |
///
/// Exclusive holders are serialized against every other holder of the same
/// board; shared holders only against exclusive ones.
///
/// # Read/write discipline
///
/// Writes are staged until commit. Within one transaction, perform every
/// read before the first write; reads do not observe the transaction's own
/// staged writes on every backend.
///
/// # Backends
///
/// - [`MemoryStorage`]: hash maps plus one `tokio::sync::RwLock` per board
/// - [`PgStorage`]: PostgreSQL via sqlx, `FOR SHARE`/`FOR UPDATE` on the board row

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::BoardResult;
use crate::models::{board::Board, comment::Comment, task::Task};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStorage;
pub use postgres::PgStorage;

/// Portion of a board's consistency domain a transaction locks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockScope {
    None,
    Shared(Uuid),
    Exclusive(Uuid),
}

impl LockScope {
    pub fn board_id(&self) -> Option<Uuid> {
        match self {
            LockScope::None => None,
            LockScope::Shared(id) | LockScope::Exclusive(id) => Some(*id),
        }
    }
}

/// Storage backend
#[async_trait]
pub trait Storage: Send + Sync {
    /// Short backend name reported by the health endpoint
    fn backend(&self) -> &'static str;

    /// Opens a transaction, acquiring the requested board lock first
    ///
    /// Locking a board that does not exist succeeds and locks nothing; the
    /// caller discovers the absence on its first read.
    async fn begin(&self, scope: LockScope) -> BoardResult<Box<dyn StorageTx>>;

    /// Board a task belongs to, read outside any transaction
    ///
    /// `board_id` never changes after creation, so the answer is safe to use
    /// for picking the lock to take before re-reading the task under it.
    async fn board_of_task(&self, task_id: Uuid) -> BoardResult<Option<Uuid>>;
}

/// One unit of work against a [`Storage`]
#[async_trait]
pub trait StorageTx: Send {
    // Boards
    async fn board(&mut self, id: Uuid) -> BoardResult<Option<Board>>;
    async fn boards_for_member(&mut self, user_id: Uuid) -> BoardResult<Vec<Board>>;
    async fn insert_board(&mut self, board: &Board) -> BoardResult<()>;
    /// Persists title and the full member set
    async fn update_board(&mut self, board: &Board) -> BoardResult<()>;
    /// Deletes the board row only; dependents must already be deleted
    async fn delete_board(&mut self, id: Uuid) -> BoardResult<()>;

    // Tasks
    async fn task(&mut self, id: Uuid) -> BoardResult<Option<Task>>;
    async fn tasks_for_board(&mut self, board_id: Uuid) -> BoardResult<Vec<Task>>;
    async fn tasks_assigned_to(&mut self, user_id: Uuid) -> BoardResult<Vec<Task>>;
    async fn tasks_reviewed_by(&mut self, user_id: Uuid) -> BoardResult<Vec<Task>>;
    async fn insert_task(&mut self, task: &Task) -> BoardResult<()>;
    async fn update_task(&mut self, task: &Task) -> BoardResult<()>;
    async fn delete_tasks(&mut self, ids: &[Uuid]) -> BoardResult<()>;

    // Comments
    async fn comment(&mut self, id: Uuid) -> BoardResult<Option<Comment>>;
    /// Oldest first; insertion order breaks timestamp ties
    async fn comments_for_task(&mut self, task_id: Uuid) -> BoardResult<Vec<Comment>>;
    async fn count_comments(&mut self, task_id: Uuid) -> BoardResult<i64>;
    async fn insert_comment(&mut self, comment: &Comment) -> BoardResult<()>;
    async fn delete_comments(&mut self, ids: &[Uuid]) -> BoardResult<()>;

    /// Applies every staged write atomically and releases the board lock
    async fn commit(self: Box<Self>) -> BoardResult<()>;
}
