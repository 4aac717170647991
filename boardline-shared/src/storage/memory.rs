/// In-memory storage backend
///
/// Rows live in hash maps behind a single mutex that is only ever held for
/// the duration of one map operation, never across an `.await`. Board-level
/// isolation comes from a separate table of `tokio::sync::RwLock`s, one per
/// board id, acquired as owned guards when a transaction begins.
///
/// Writes are staged in the transaction and applied under one acquisition
/// of the table mutex at commit, so unlocked readers (cross-board queries)
/// never observe a half-applied cascade.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};
use uuid::Uuid;

use super::{LockScope, Storage, StorageTx};
use crate::error::{BoardError, BoardResult};
use crate::models::{board::Board, comment::Comment, task::Task};

#[derive(Debug, Default)]
struct Tables {
    boards: HashMap<Uuid, Board>,
    tasks: HashMap<Uuid, Task>,
    comments: HashMap<Uuid, StoredComment>,
    next_seq: u64,
}

#[derive(Debug, Clone)]
struct StoredComment {
    seq: u64,
    comment: Comment,
}

#[derive(Debug, Default)]
struct Inner {
    tables: Mutex<Tables>,
    locks: Mutex<HashMap<Uuid, Arc<RwLock<()>>>>,
}

impl Inner {
    fn tables(&self) -> BoardResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| BoardError::Storage("table lock poisoned".to_string()))
    }

    fn locks(&self) -> BoardResult<MutexGuard<'_, HashMap<Uuid, Arc<RwLock<()>>>>> {
        self.locks
            .lock()
            .map_err(|_| BoardError::Storage("board lock table poisoned".to_string()))
    }

    /// Lock handle for an existing board; `None` if the board is unknown
    ///
    /// Both mutexes are taken in the order tables, then locks, here and in
    /// commit, so an entry is never created for a board deleted in between.
    fn board_lock(&self, board_id: Uuid) -> BoardResult<Option<Arc<RwLock<()>>>> {
        let tables = self.tables()?;
        if !tables.boards.contains_key(&board_id) {
            return Ok(None);
        }

        let mut locks = self.locks()?;
        Ok(Some(locks.entry(board_id).or_default().clone()))
    }
}

/// Process-local storage
///
/// Cloning is cheap and clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Inner>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of per-board lock entries currently allocated
    pub fn lock_count(&self) -> usize {
        self.inner.locks().map(|locks| locks.len()).unwrap_or(0)
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn begin(&self, scope: LockScope) -> BoardResult<Box<dyn StorageTx>> {
        let guard = match scope {
            LockScope::None => None,
            LockScope::Shared(board_id) => match self.inner.board_lock(board_id)? {
                Some(lock) => Some(BoardGuard::Shared {
                    _held: lock.read_owned().await,
                }),
                None => None,
            },
            LockScope::Exclusive(board_id) => match self.inner.board_lock(board_id)? {
                Some(lock) => Some(BoardGuard::Exclusive {
                    _held: lock.write_owned().await,
                }),
                None => None,
            },
        };

        Ok(Box::new(MemoryTx {
            inner: self.inner.clone(),
            _guard: guard,
            pending: Vec::new(),
        }))
    }

    async fn board_of_task(&self, task_id: Uuid) -> BoardResult<Option<Uuid>> {
        Ok(self.inner.tables()?.tasks.get(&task_id).map(|t| t.board_id))
    }
}

/// Board lock held for the lifetime of a transaction; released on drop
enum BoardGuard {
    Shared { _held: OwnedRwLockReadGuard<()> },
    Exclusive { _held: OwnedRwLockWriteGuard<()> },
}

enum Write {
    PutBoard(Board),
    DeleteBoard(Uuid),
    PutTask(Task),
    DeleteTasks(Vec<Uuid>),
    InsertComment(Comment),
    DeleteComments(Vec<Uuid>),
}

struct MemoryTx {
    inner: Arc<Inner>,
    _guard: Option<BoardGuard>,
    pending: Vec<Write>,
}

impl MemoryTx {
    fn tasks_where(&self, predicate: impl Fn(&Task) -> bool) -> BoardResult<Vec<Task>> {
        let tables = self.inner.tables()?;
        let mut tasks: Vec<Task> = tables.tasks.values().filter(|t| predicate(*t)).cloned().collect();
        tasks.sort_by_key(|t| (t.created_at, t.id));
        Ok(tasks)
    }
}

#[async_trait]
impl StorageTx for MemoryTx {
    async fn board(&mut self, id: Uuid) -> BoardResult<Option<Board>> {
        Ok(self.inner.tables()?.boards.get(&id).cloned())
    }

    async fn boards_for_member(&mut self, user_id: Uuid) -> BoardResult<Vec<Board>> {
        let tables = self.inner.tables()?;
        let mut boards: Vec<Board> = tables
            .boards
            .values()
            .filter(|b| b.is_member(user_id))
            .cloned()
            .collect();
        boards.sort_by_key(|b| (b.created_at, b.id));
        Ok(boards)
    }

    async fn insert_board(&mut self, board: &Board) -> BoardResult<()> {
        self.pending.push(Write::PutBoard(board.clone()));
        Ok(())
    }

    async fn update_board(&mut self, board: &Board) -> BoardResult<()> {
        self.pending.push(Write::PutBoard(board.clone()));
        Ok(())
    }

    async fn delete_board(&mut self, id: Uuid) -> BoardResult<()> {
        self.pending.push(Write::DeleteBoard(id));
        Ok(())
    }

    async fn task(&mut self, id: Uuid) -> BoardResult<Option<Task>> {
        Ok(self.inner.tables()?.tasks.get(&id).cloned())
    }

    async fn tasks_for_board(&mut self, board_id: Uuid) -> BoardResult<Vec<Task>> {
        self.tasks_where(|t| t.board_id == board_id)
    }

    async fn tasks_assigned_to(&mut self, user_id: Uuid) -> BoardResult<Vec<Task>> {
        self.tasks_where(|t| t.assignee_id == Some(user_id))
    }

    async fn tasks_reviewed_by(&mut self, user_id: Uuid) -> BoardResult<Vec<Task>> {
        self.tasks_where(|t| t.reviewer_id == Some(user_id))
    }

    async fn insert_task(&mut self, task: &Task) -> BoardResult<()> {
        self.pending.push(Write::PutTask(task.clone()));
        Ok(())
    }

    async fn update_task(&mut self, task: &Task) -> BoardResult<()> {
        self.pending.push(Write::PutTask(task.clone()));
        Ok(())
    }

    async fn delete_tasks(&mut self, ids: &[Uuid]) -> BoardResult<()> {
        self.pending.push(Write::DeleteTasks(ids.to_vec()));
        Ok(())
    }

    async fn comment(&mut self, id: Uuid) -> BoardResult<Option<Comment>> {
        Ok(self.inner.tables()?.comments.get(&id).map(|c| c.comment.clone()))
    }

    async fn comments_for_task(&mut self, task_id: Uuid) -> BoardResult<Vec<Comment>> {
        let tables = self.inner.tables()?;
        let mut stored: Vec<&StoredComment> = tables
            .comments
            .values()
            .filter(|c| c.comment.task_id == task_id)
            .collect();
        stored.sort_by_key(|c| (c.comment.created_at, c.seq));
        Ok(stored.into_iter().map(|c| c.comment.clone()).collect())
    }

    async fn count_comments(&mut self, task_id: Uuid) -> BoardResult<i64> {
        let tables = self.inner.tables()?;
        let count = tables
            .comments
            .values()
            .filter(|c| c.comment.task_id == task_id)
            .count();
        Ok(count as i64)
    }

    async fn insert_comment(&mut self, comment: &Comment) -> BoardResult<()> {
        self.pending.push(Write::InsertComment(comment.clone()));
        Ok(())
    }

    async fn delete_comments(&mut self, ids: &[Uuid]) -> BoardResult<()> {
        self.pending.push(Write::DeleteComments(ids.to_vec()));
        Ok(())
    }

    async fn commit(self: Box<Self>) -> BoardResult<()> {
        let MemoryTx {
            inner,
            _guard,
            pending,
        } = *self;

        {
            let mut tables = inner.tables()?;
            let mut deleted_boards = Vec::new();
            for write in pending {
                match write {
                    Write::PutBoard(board) => {
                        tables.boards.insert(board.id, board);
                    }
                    Write::DeleteBoard(id) => {
                        tables.boards.remove(&id);
                        deleted_boards.push(id);
                    }
                    Write::PutTask(task) => {
                        tables.tasks.insert(task.id, task);
                    }
                    Write::DeleteTasks(ids) => {
                        for id in ids {
                            tables.tasks.remove(&id);
                        }
                    }
                    Write::InsertComment(comment) => {
                        let seq = tables.next_seq;
                        tables.next_seq += 1;
                        tables.comments.insert(comment.id, StoredComment { seq, comment });
                    }
                    Write::DeleteComments(ids) => {
                        for id in ids {
                            tables.comments.remove(&id);
                        }
                    }
                }
            }

            // Waiters still holding a clone of a removed lock re-read and
            // find the board gone.
            if !deleted_boards.is_empty() {
                let mut locks = inner.locks()?;
                for id in deleted_boards {
                    locks.remove(&id);
                }
            }
        }

        drop(_guard);
        Ok(())
    }
}
