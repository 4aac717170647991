/// Authorization engine
///
/// Every store consults this module before reading or mutating anything.
/// Decisions are pure functions of the requester id and entity snapshots the
/// store has already fetched; the engine never touches storage.
///
/// # Policy Model
///
/// Policies are a finite table keyed by ([`EntityKind`], [`Action`]). Each
/// entry names a [`Rule`]:
///
/// 1. **BoardMember**: requester ∈ board.members
/// 2. **BoardOwner**: requester == board.owner
/// 3. **TaskCreatorOrBoardOwner**: requester == task.created_by or board.owner
/// 4. **CommentAuthor**: requester == comment.author
/// 5. **Authenticated**: any caller with an identity
///
/// A rule first checks that the snapshots it needs are present. A missing
/// snapshot yields [`Decision::Absent`], which stores report as not-found.
/// Existence is therefore always decided before permission.
///
/// # Example
///
/// ```
/// use boardline_shared::auth::authorization::{decide, Action, Decision, EntityKind, Snapshot};
/// use boardline_shared::models::board::Board;
/// use uuid::Uuid;
///
/// let owner = Uuid::new_v4();
/// let board = Board::new("Sprint 1".to_string(), owner, []);
///
/// let decision = decide(EntityKind::Board, Action::Delete, owner, &Snapshot::board(Some(&board)));
/// assert_eq!(decision, Decision::Allow);
///
/// let stranger = Uuid::new_v4();
/// let decision = decide(EntityKind::Board, Action::Read, stranger, &Snapshot::board(Some(&board)));
/// assert_eq!(decision, Decision::Deny);
/// ```

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{BoardError, BoardResult};
use crate::models::{board::Board, comment::Comment, task::Task};

/// Kind of entity a decision is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Board,
    Task,
    Comment,
    User,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Board => "board",
            EntityKind::Task => "task",
            EntityKind::Comment => "comment",
            EntityKind::User => "user",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operation being authorized
///
/// `Read` on a board also covers listing that board's tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a policy evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The operation may proceed
    Allow,

    /// The entity exists but the requester may not touch it
    Deny,

    /// A snapshot the rule needs is missing; carries the missing kind
    Absent(EntityKind),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// Translates the decision into a store result
    ///
    /// `Absent` becomes not-found for `missing_id`, `Deny` becomes
    /// forbidden for (`kind`, `action`).
    pub fn into_result(self, kind: EntityKind, action: Action, missing_id: Uuid) -> BoardResult<()> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny => Err(BoardError::forbidden(kind, action)),
            Decision::Absent(missing) => Err(BoardError::not_found(missing, missing_id)),
        }
    }
}

/// Predicate attached to a policy entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Authenticated,
    BoardMember,
    BoardOwner,
    TaskCreatorOrBoardOwner,
    CommentAuthor,
}

/// The policy table
pub const POLICIES: &[(EntityKind, Action, Rule)] = &[
    (EntityKind::Board, Action::Create, Rule::Authenticated),
    (EntityKind::Board, Action::Read, Rule::BoardMember),
    (EntityKind::Board, Action::Update, Rule::BoardMember),
    (EntityKind::Board, Action::Delete, Rule::BoardOwner),
    (EntityKind::Task, Action::Create, Rule::BoardMember),
    (EntityKind::Task, Action::Read, Rule::BoardMember),
    (EntityKind::Task, Action::Update, Rule::BoardMember),
    (EntityKind::Task, Action::Delete, Rule::TaskCreatorOrBoardOwner),
    (EntityKind::Comment, Action::Create, Rule::BoardMember),
    (EntityKind::Comment, Action::Read, Rule::BoardMember),
    (EntityKind::Comment, Action::Delete, Rule::CommentAuthor),
];

/// Looks up the rule for a (kind, action) pair
pub fn rule_for(kind: EntityKind, action: Action) -> Option<Rule> {
    POLICIES
        .iter()
        .find(|(k, a, _)| *k == kind && *a == action)
        .map(|(_, _, rule)| *rule)
}

/// Entity snapshots handed to the engine
///
/// For task and comment decisions the owning board must be supplied too;
/// rules only ever read what is here.
#[derive(Debug, Clone, Copy, Default)]
pub struct Snapshot<'a> {
    pub board: Option<&'a Board>,
    pub task: Option<&'a Task>,
    pub comment: Option<&'a Comment>,
}

impl<'a> Snapshot<'a> {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn board(board: Option<&'a Board>) -> Self {
        Self {
            board,
            ..Self::default()
        }
    }

    pub fn task(task: Option<&'a Task>, board: Option<&'a Board>) -> Self {
        Self {
            board,
            task,
            comment: None,
        }
    }

    pub fn comment(comment: Option<&'a Comment>) -> Self {
        Self {
            comment,
            ..Self::default()
        }
    }
}

impl Rule {
    /// Evaluates the rule against the snapshot
    pub fn evaluate(&self, requester: Uuid, snapshot: &Snapshot<'_>) -> Decision {
        match self {
            Rule::Authenticated => Decision::Allow,

            Rule::BoardMember => match snapshot.board {
                None => Decision::Absent(EntityKind::Board),
                Some(board) => allow_if(board.is_member(requester)),
            },

            Rule::BoardOwner => match snapshot.board {
                None => Decision::Absent(EntityKind::Board),
                Some(board) => allow_if(board.owner_id == requester),
            },

            Rule::TaskCreatorOrBoardOwner => match (snapshot.task, snapshot.board) {
                (None, _) => Decision::Absent(EntityKind::Task),
                (Some(_), None) => Decision::Absent(EntityKind::Board),
                (Some(task), Some(board)) => {
                    allow_if(task.created_by == requester || board.owner_id == requester)
                }
            },

            Rule::CommentAuthor => match snapshot.comment {
                None => Decision::Absent(EntityKind::Comment),
                Some(comment) => allow_if(comment.author_id == requester),
            },
        }
    }
}

fn allow_if(condition: bool) -> Decision {
    if condition {
        Decision::Allow
    } else {
        Decision::Deny
    }
}

/// Evaluates the policy for (kind, action)
///
/// Pairs with no table entry are denied.
pub fn decide(kind: EntityKind, action: Action, requester: Uuid, snapshot: &Snapshot<'_>) -> Decision {
    match rule_for(kind, action) {
        Some(rule) => rule.evaluate(requester, snapshot),
        None => Decision::Deny,
    }
}

/// Evaluates the policy and converts the decision into a store result
///
/// `missing_id` is the id the caller looked up; it is reported when a
/// required snapshot is absent.
pub fn authorize(
    kind: EntityKind,
    action: Action,
    requester: Uuid,
    snapshot: &Snapshot<'_>,
    missing_id: Uuid,
) -> BoardResult<()> {
    decide(kind, action, requester, snapshot).into_result(kind, action, missing_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::NewTask;

    fn board_with(owner: Uuid, members: &[Uuid]) -> Board {
        Board::new("Board".to_string(), owner, members.iter().copied())
    }

    fn task_on(board: &Board, creator: Uuid) -> Task {
        Task::from_new(board.id, creator, NewTask::titled("Task"))
    }

    #[test]
    fn test_every_pair_has_at_most_one_rule() {
        for (i, (kind, action, _)) in POLICIES.iter().enumerate() {
            let duplicates = POLICIES[i + 1..]
                .iter()
                .filter(|(k, a, _)| k == kind && a == action)
                .count();
            assert_eq!(duplicates, 0, "duplicate policy for {kind} {action}");
        }
    }

    #[test]
    fn test_board_read_requires_membership() {
        let owner = Uuid::new_v4();
        let member = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let board = board_with(owner, &[member]);
        let snapshot = Snapshot::board(Some(&board));

        assert_eq!(decide(EntityKind::Board, Action::Read, owner, &snapshot), Decision::Allow);
        assert_eq!(decide(EntityKind::Board, Action::Read, member, &snapshot), Decision::Allow);
        assert_eq!(decide(EntityKind::Board, Action::Read, stranger, &snapshot), Decision::Deny);
    }

    #[test]
    fn test_board_delete_is_owner_only() {
        let owner = Uuid::new_v4();
        let member = Uuid::new_v4();
        let board = board_with(owner, &[member]);
        let snapshot = Snapshot::board(Some(&board));

        assert_eq!(decide(EntityKind::Board, Action::Delete, owner, &snapshot), Decision::Allow);
        assert_eq!(decide(EntityKind::Board, Action::Delete, member, &snapshot), Decision::Deny);
    }

    #[test]
    fn test_absent_board_is_reported_before_permission() {
        let requester = Uuid::new_v4();
        let snapshot = Snapshot::board(None);

        assert_eq!(
            decide(EntityKind::Board, Action::Update, requester, &snapshot),
            Decision::Absent(EntityKind::Board)
        );
        assert_eq!(
            decide(EntityKind::Task, Action::Create, requester, &snapshot),
            Decision::Absent(EntityKind::Board)
        );
    }

    #[test]
    fn test_task_delete_creator_or_owner() {
        let owner = Uuid::new_v4();
        let creator = Uuid::new_v4();
        let other = Uuid::new_v4();
        let board = board_with(owner, &[creator, other]);
        let task = task_on(&board, creator);
        let snapshot = Snapshot::task(Some(&task), Some(&board));

        assert_eq!(decide(EntityKind::Task, Action::Delete, creator, &snapshot), Decision::Allow);
        assert_eq!(decide(EntityKind::Task, Action::Delete, owner, &snapshot), Decision::Allow);
        assert_eq!(decide(EntityKind::Task, Action::Delete, other, &snapshot), Decision::Deny);

        // but any member may update
        assert_eq!(decide(EntityKind::Task, Action::Update, other, &snapshot), Decision::Allow);
    }

    #[test]
    fn test_task_delete_with_missing_task() {
        let owner = Uuid::new_v4();
        let board = board_with(owner, &[]);
        let snapshot = Snapshot::task(None, Some(&board));

        assert_eq!(
            decide(EntityKind::Task, Action::Delete, owner, &snapshot),
            Decision::Absent(EntityKind::Task)
        );
    }

    #[test]
    fn test_comment_delete_is_author_only() {
        let owner = Uuid::new_v4();
        let author = Uuid::new_v4();
        let board = board_with(owner, &[author]);
        let task = task_on(&board, owner);
        let comment = Comment::new(task.id, author, "looks good".to_string());
        let snapshot = Snapshot::comment(Some(&comment));

        assert_eq!(decide(EntityKind::Comment, Action::Delete, author, &snapshot), Decision::Allow);
        // not even the board owner
        assert_eq!(decide(EntityKind::Comment, Action::Delete, owner, &snapshot), Decision::Deny);
        assert_eq!(
            decide(EntityKind::Comment, Action::Delete, author, &Snapshot::comment(None)),
            Decision::Absent(EntityKind::Comment)
        );
    }

    #[test]
    fn test_unlisted_pair_is_denied() {
        let owner = Uuid::new_v4();
        let board = board_with(owner, &[]);

        assert!(rule_for(EntityKind::Comment, Action::Update).is_none());
        assert_eq!(
            decide(EntityKind::Comment, Action::Update, owner, &Snapshot::board(Some(&board))),
            Decision::Deny
        );
        assert_eq!(
            decide(EntityKind::User, Action::Read, owner, &Snapshot::none()),
            Decision::Deny
        );
    }

    #[test]
    fn test_into_result_mapping() {
        let id = Uuid::new_v4();

        assert!(Decision::Allow.into_result(EntityKind::Board, Action::Read, id).is_ok());

        let err = Decision::Deny
            .into_result(EntityKind::Board, Action::Read, id)
            .unwrap_err();
        assert!(matches!(
            err,
            BoardError::Forbidden { kind: EntityKind::Board, action: Action::Read }
        ));

        let err = Decision::Absent(EntityKind::Task)
            .into_result(EntityKind::Comment, Action::Create, id)
            .unwrap_err();
        assert!(matches!(err, BoardError::NotFound { kind: EntityKind::Task, id: missing } if missing == id));
    }
}
