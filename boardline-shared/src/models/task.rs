/// Task model
///
/// Tasks are units of work scoped to exactly one board. The board reference
/// and the creator are fixed at creation; everything else is patchable by
/// any board member.
///
/// # Workflow
///
/// ```text
/// to-do → in-progress → review → done
/// ```
///
/// The workflow is advisory: any status may be set directly.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('to-do', 'in-progress', 'review', 'done');
/// CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY,
///     board_id UUID NOT NULL REFERENCES boards(id),
///     title VARCHAR(200) NOT NULL,
///     description TEXT,
///     status task_status NOT NULL DEFAULT 'to-do',
///     priority task_priority NOT NULL DEFAULT 'medium',
///     assignee_id UUID REFERENCES users(id),
///     reviewer_id UUID REFERENCES users(id),
///     created_by UUID NOT NULL REFERENCES users(id),
///     due_date DATE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::double_option;

/// Maximum task title length (characters)
pub const MAX_TASK_TITLE_LENGTH: usize = 200;

/// Workflow status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    ToDo,
    InProgress,
    Review,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::ToDo => "to-do",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Review => "review",
            TaskStatus::Done => "done",
        }
    }
}

/// Priority level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }
}

/// Task entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Owning board (immutable)
    pub board_id: Uuid,

    pub title: String,

    pub description: Option<String>,

    pub status: TaskStatus,

    pub priority: TaskPriority,

    /// Must have been a board member when assigned
    pub assignee_id: Option<Uuid>,

    /// Must have been a board member when assigned
    pub reviewer_id: Option<Uuid>,

    /// Requester that created the task (never taken from client input)
    pub created_by: Uuid,

    pub due_date: Option<NaiveDate>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Defaults to `to-do`
    #[serde(default)]
    pub status: Option<TaskStatus>,

    /// Defaults to `medium`
    #[serde(default)]
    pub priority: Option<TaskPriority>,

    #[serde(default)]
    pub assignee_id: Option<Uuid>,

    #[serde(default)]
    pub reviewer_id: Option<Uuid>,

    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

impl NewTask {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Partial task update
///
/// Outer `None` means "leave untouched". For nullable fields
/// `Some(None)` clears the value, which is how a request distinguishes
/// "clear the assignee" from "don't touch the assignee". On `title`,
/// `status` and `priority` an explicit null is kept as `Some(None)` so the
/// update can reject it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(default, deserialize_with = "double_option")]
    pub title: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub status: Option<Option<TaskStatus>>,

    #[serde(default, deserialize_with = "double_option")]
    pub priority: Option<Option<TaskPriority>>,

    #[serde(default, deserialize_with = "double_option")]
    pub assignee_id: Option<Option<Uuid>>,

    #[serde(default, deserialize_with = "double_option")]
    pub reviewer_id: Option<Option<Uuid>>,

    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<NaiveDate>>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.assignee_id.is_none()
            && self.reviewer_id.is_none()
            && self.due_date.is_none()
    }
}

impl Task {
    /// Builds a task from creation input, applying defaults
    pub fn from_new(board_id: Uuid, created_by: Uuid, data: NewTask) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4(),
            board_id,
            title: data.title,
            description: data.description,
            status: data.status.unwrap_or_default(),
            priority: data.priority.unwrap_or_default(),
            assignee_id: data.assignee_id,
            reviewer_id: data.reviewer_id,
            created_by,
            due_date: data.due_date,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies every present field of `patch` and bumps `updated_at`
    ///
    /// Nulls on required fields are skipped; callers validate them away first.
    pub fn apply(&mut self, patch: TaskPatch) {
        if let Some(Some(title)) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(Some(status)) = patch.status {
            self.status = status;
        }
        if let Some(Some(priority)) = patch.priority {
            self.priority = priority;
        }
        if let Some(assignee_id) = patch.assignee_id {
            self.assignee_id = assignee_id;
        }
        if let Some(reviewer_id) = patch.reviewer_id {
            self.reviewer_id = reviewer_id;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }

        self.updated_at = Utc::now();
    }
}

/// Task plus its comment count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSummary {
    #[serde(flatten)]
    pub task: Task,

    pub comments_count: i64,
}
