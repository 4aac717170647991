/// PostgreSQL storage backend
///
/// Each [`StorageTx`] wraps a sqlx transaction. The board lock is the board
/// row itself: `FOR SHARE` for shared scopes, `FOR UPDATE` for exclusive
/// ones, held until commit or rollback.
///
/// Membership is normalized into `board_members`; board reads aggregate it
/// back into a set with `array_agg`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{LockScope, Storage, StorageTx};
use crate::error::BoardResult;
use crate::models::{board::Board, comment::Comment, task::Task};

const BOARD_COLUMNS: &str = r#"
    SELECT b.id, b.title, b.owner_id, b.created_at,
           COALESCE(
               array_agg(m.user_id) FILTER (WHERE m.user_id IS NOT NULL),
               '{}'
           ) AS members
    FROM boards b
    LEFT JOIN board_members m ON m.board_id = b.id
"#;

const TASK_COLUMNS: &str = r#"
    SELECT id, board_id, title, description, status, priority,
           assignee_id, reviewer_id, created_by, due_date,
           created_at, updated_at
    FROM tasks
"#;

#[derive(Debug, sqlx::FromRow)]
struct BoardRow {
    id: Uuid,
    title: String,
    owner_id: Uuid,
    created_at: DateTime<Utc>,
    members: Vec<Uuid>,
}

impl From<BoardRow> for Board {
    fn from(row: BoardRow) -> Self {
        Board {
            id: row.id,
            title: row.title,
            owner_id: row.owner_id,
            members: row.members.into_iter().collect(),
            created_at: row.created_at,
        }
    }
}

/// sqlx-backed storage
#[derive(Debug, Clone)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Storage for PgStorage {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn begin(&self, scope: LockScope) -> BoardResult<Box<dyn StorageTx>> {
        let mut tx = self.pool.begin().await?;

        let lock_query = match scope {
            LockScope::None => None,
            LockScope::Shared(id) => Some((id, "SELECT id FROM boards WHERE id = $1 FOR SHARE")),
            LockScope::Exclusive(id) => Some((id, "SELECT id FROM boards WHERE id = $1 FOR UPDATE")),
        };

        if let Some((board_id, sql)) = lock_query {
            sqlx::query(sql).bind(board_id).fetch_optional(&mut *tx).await?;
        }

        Ok(Box::new(PgTx { tx }))
    }

    async fn board_of_task(&self, task_id: Uuid) -> BoardResult<Option<Uuid>> {
        let board_id = sqlx::query_scalar::<_, Uuid>("SELECT board_id FROM tasks WHERE id = $1")
            .bind(task_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(board_id)
    }
}

struct PgTx {
    tx: Transaction<'static, Postgres>,
}

impl PgTx {
    async fn replace_members(&mut self, board: &Board) -> BoardResult<()> {
        sqlx::query("DELETE FROM board_members WHERE board_id = $1")
            .bind(board.id)
            .execute(&mut *self.tx)
            .await?;

        let members: Vec<Uuid> = board.members.iter().copied().collect();
        sqlx::query(
            r#"
            INSERT INTO board_members (board_id, user_id)
            SELECT $1, UNNEST($2::uuid[])
            "#,
        )
        .bind(board.id)
        .bind(members)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn tasks_where(&mut self, condition: &str, id: Uuid) -> BoardResult<Vec<Task>> {
        let sql = format!("{TASK_COLUMNS} WHERE {condition} = $1 ORDER BY created_at ASC, id ASC");
        let tasks = sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .fetch_all(&mut *self.tx)
            .await?;

        Ok(tasks)
    }
}

#[async_trait]
impl StorageTx for PgTx {
    async fn board(&mut self, id: Uuid) -> BoardResult<Option<Board>> {
        let sql = format!("{BOARD_COLUMNS} WHERE b.id = $1 GROUP BY b.id");
        let row = sqlx::query_as::<_, BoardRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(row.map(Board::from))
    }

    async fn boards_for_member(&mut self, user_id: Uuid) -> BoardResult<Vec<Board>> {
        let sql = format!(
            "{BOARD_COLUMNS}
             WHERE b.id IN (SELECT board_id FROM board_members WHERE user_id = $1)
             GROUP BY b.id
             ORDER BY b.created_at ASC, b.id ASC"
        );
        let rows = sqlx::query_as::<_, BoardRow>(&sql)
            .bind(user_id)
            .fetch_all(&mut *self.tx)
            .await?;

        Ok(rows.into_iter().map(Board::from).collect())
    }

    async fn insert_board(&mut self, board: &Board) -> BoardResult<()> {
        sqlx::query(
            r#"
            INSERT INTO boards (id, title, owner_id, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(board.id)
        .bind(&board.title)
        .bind(board.owner_id)
        .bind(board.created_at)
        .execute(&mut *self.tx)
        .await?;

        self.replace_members(board).await
    }

    async fn update_board(&mut self, board: &Board) -> BoardResult<()> {
        sqlx::query("UPDATE boards SET title = $2 WHERE id = $1")
            .bind(board.id)
            .bind(&board.title)
            .execute(&mut *self.tx)
            .await?;

        self.replace_members(board).await
    }

    async fn delete_board(&mut self, id: Uuid) -> BoardResult<()> {
        sqlx::query("DELETE FROM board_members WHERE board_id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        sqlx::query("DELETE FROM boards WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn task(&mut self, id: Uuid) -> BoardResult<Option<Task>> {
        let sql = format!("{TASK_COLUMNS} WHERE id = $1");
        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(task)
    }

    async fn tasks_for_board(&mut self, board_id: Uuid) -> BoardResult<Vec<Task>> {
        self.tasks_where("board_id", board_id).await
    }

    async fn tasks_assigned_to(&mut self, user_id: Uuid) -> BoardResult<Vec<Task>> {
        self.tasks_where("assignee_id", user_id).await
    }

    async fn tasks_reviewed_by(&mut self, user_id: Uuid) -> BoardResult<Vec<Task>> {
        self.tasks_where("reviewer_id", user_id).await
    }

    async fn insert_task(&mut self, task: &Task) -> BoardResult<()> {
        sqlx::query(
            r#"
            INSERT INTO tasks (
                id, board_id, title, description, status, priority,
                assignee_id, reviewer_id, created_by, due_date,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(task.id)
        .bind(task.board_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status)
        .bind(task.priority)
        .bind(task.assignee_id)
        .bind(task.reviewer_id)
        .bind(task.created_by)
        .bind(task.due_date)
        .bind(task.created_at)
        .bind(task.updated_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn update_task(&mut self, task: &Task) -> BoardResult<()> {
        sqlx::query(
            r#"
            UPDATE tasks
            SET title = $2, description = $3, status = $4, priority = $5,
                assignee_id = $6, reviewer_id = $7, due_date = $8, updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status)
        .bind(task.priority)
        .bind(task.assignee_id)
        .bind(task.reviewer_id)
        .bind(task.due_date)
        .bind(task.updated_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn delete_tasks(&mut self, ids: &[Uuid]) -> BoardResult<()> {
        if ids.is_empty() {
            return Ok(());
        }

        sqlx::query("DELETE FROM tasks WHERE id = ANY($1)")
            .bind(ids.to_vec())
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn comment(&mut self, id: Uuid) -> BoardResult<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, task_id, author_id, content, created_at
            FROM comments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(comment)
    }

    async fn comments_for_task(&mut self, task_id: Uuid) -> BoardResult<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, task_id, author_id, content, created_at
            FROM comments
            WHERE task_id = $1
            ORDER BY created_at ASC, seq ASC
            "#,
        )
        .bind(task_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(comments)
    }

    async fn count_comments(&mut self, task_id: Uuid) -> BoardResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE task_id = $1")
            .bind(task_id)
            .fetch_one(&mut *self.tx)
            .await?;

        Ok(count)
    }

    async fn insert_comment(&mut self, comment: &Comment) -> BoardResult<()> {
        sqlx::query(
            r#"
            INSERT INTO comments (id, task_id, author_id, content, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(comment.id)
        .bind(comment.task_id)
        .bind(comment.author_id)
        .bind(&comment.content)
        .bind(comment.created_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn delete_comments(&mut self, ids: &[Uuid]) -> BoardResult<()> {
        if ids.is_empty() {
            return Ok(());
        }

        sqlx::query("DELETE FROM comments WHERE id = ANY($1)")
            .bind(ids.to_vec())
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn commit(self: Box<Self>) -> BoardResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
