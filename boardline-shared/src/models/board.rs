/// Board model and read views
///
/// A board is a shared container with a title, a single owner and a member
/// set. Tasks point at their board by id; the board row does not own them.
///
/// # Invariant
///
/// The owner is always a member. Every constructor and every membership
/// replacement re-inserts the owner, so no code path can produce a board
/// without it.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE boards (
///     id UUID PRIMARY KEY,
///     title VARCHAR(100) NOT NULL,
///     owner_id UUID NOT NULL REFERENCES users(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE board_members (
///     board_id UUID NOT NULL REFERENCES boards(id),
///     user_id UUID NOT NULL REFERENCES users(id),
///     PRIMARY KEY (board_id, user_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use super::double_option;
use super::task::{Task, TaskPriority, TaskStatus, TaskSummary};
use super::user::User;

/// Maximum board title length (characters)
pub const MAX_BOARD_TITLE_LENGTH: usize = 100;

/// Board entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    /// Unique board ID
    pub id: Uuid,

    /// Display title (never blank)
    pub title: String,

    /// The one user allowed to delete the board
    pub owner_id: Uuid,

    /// Users allowed to read and mutate the board; always contains `owner_id`
    pub members: BTreeSet<Uuid>,

    /// When the board was created
    pub created_at: DateTime<Utc>,
}

impl Board {
    /// Builds a new board; the owner is added to `members` unconditionally
    pub fn new(title: String, owner_id: Uuid, members: impl IntoIterator<Item = Uuid>) -> Self {
        let mut members: BTreeSet<Uuid> = members.into_iter().collect();
        members.insert(owner_id);

        Self {
            id: Uuid::new_v4(),
            title,
            owner_id,
            members,
            created_at: Utc::now(),
        }
    }

    pub fn is_member(&self, user_id: Uuid) -> bool {
        self.members.contains(&user_id)
    }

    pub fn is_owner(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }

    /// Replaces the whole member set, re-adding the owner if it was left out
    pub fn replace_members(&mut self, members: impl IntoIterator<Item = Uuid>) {
        self.members = members.into_iter().collect();
        self.members.insert(self.owner_id);
    }
}

/// Input for creating a board
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewBoard {
    pub title: String,

    /// Additional members; the creator is always added
    #[serde(default)]
    pub members: Vec<Uuid>,
}

/// Input for updating a board
///
/// `members: Some(vec![])` is treated exactly like `None`: an empty list
/// never clears the membership. An explicit `"title": null` arrives as
/// `Some(None)` and is rejected by the update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoardChanges {
    #[serde(default, deserialize_with = "double_option")]
    pub title: Option<Option<String>>,

    #[serde(default)]
    pub members: Option<Vec<Uuid>>,
}

impl BoardChanges {
    /// Member replacement actually requested, if any
    pub fn requested_members(&self) -> Option<&[Uuid]> {
        match &self.members {
            Some(ids) if !ids.is_empty() => Some(ids.as_slice()),
            _ => None,
        }
    }
}

/// Board list entry with task counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSummary {
    pub id: Uuid,
    pub title: String,
    pub owner_id: Uuid,
    pub member_count: usize,
    pub ticket_count: usize,
    pub tasks_to_do_count: usize,
    pub tasks_high_prio_count: usize,
}

impl BoardSummary {
    pub fn new(board: &Board, tasks: &[Task]) -> Self {
        Self {
            id: board.id,
            title: board.title.clone(),
            owner_id: board.owner_id,
            member_count: board.members.len(),
            ticket_count: tasks.len(),
            tasks_to_do_count: tasks.iter().filter(|t| t.status == TaskStatus::ToDo).count(),
            tasks_high_prio_count: tasks
                .iter()
                .filter(|t| t.priority == TaskPriority::High)
                .count(),
        }
    }
}

/// Full board view: resolved members plus tasks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardDetail {
    pub id: Uuid,
    pub title: String,
    pub owner_id: Uuid,
    pub members: Vec<User>,
    pub tasks: Vec<TaskSummary>,
}

/// Board view returned after an update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardMembership {
    pub id: Uuid,
    pub title: String,
    pub owner: Option<User>,
    pub members: Vec<User>,
}
