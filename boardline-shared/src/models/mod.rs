/// Domain models for Boardline
///
/// # Models
///
/// - `user`: Public user records resolved through the identity provider
/// - `board`: Boards, membership and the board read views
/// - `task`: Tasks, creation input and partial updates
/// - `comment`: Append-only task comments

use serde::{Deserialize, Deserializer};

pub mod board;
pub mod comment;
pub mod task;
pub mod user;

pub use board::{Board, BoardChanges, BoardDetail, BoardMembership, BoardSummary, NewBoard};
pub use comment::{Comment, CommentView, NewComment};
pub use task::{NewTask, Task, TaskPatch, TaskPriority, TaskStatus, TaskSummary};
pub use user::User;

/// Deserializes a present field into `Some(value)`, including an explicit `null`
///
/// Combined with `#[serde(default)]` an absent field stays `None`, which lets
/// patch types tell "absent" apart from "set to null".
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
