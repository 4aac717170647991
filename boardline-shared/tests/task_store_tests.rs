/// Integration tests for the Task Store (in-memory backend)

mod common;

use boardline_shared::auth::authorization::{Action, EntityKind};
use boardline_shared::error::BoardError;
use boardline_shared::models::board::BoardChanges;
use boardline_shared::models::task::{NewTask, TaskPatch, TaskPriority, TaskStatus};
use boardline_shared::services::{NULL_FIELD, USER_DOES_NOT_EXIST, USER_NOT_A_MEMBER};
use chrono::NaiveDate;
use common::Fixture;
use uuid::Uuid;

#[tokio::test]
async fn test_create_task_defaults() {
    let fx = Fixture::new();
    let board = fx.board(&fx.alice, &[&fx.bob]).await;

    let task = fx.task(board.id, &fx.bob, "Fix bug").await;

    assert_eq!(task.board_id, board.id);
    assert_eq!(task.created_by, fx.bob.id);
    assert_eq!(task.status, TaskStatus::ToDo);
    assert_eq!(task.priority, TaskPriority::Medium);
    assert!(task.assignee_id.is_none());
    assert!(task.reviewer_id.is_none());
}

#[tokio::test]
async fn test_create_task_with_all_fields() {
    let fx = Fixture::new();
    let board = fx.board(&fx.alice, &[&fx.bob, &fx.carol]).await;
    let due = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();

    let task = fx
        .services
        .tasks
        .create_task(
            board.id,
            fx.alice.id,
            NewTask {
                title: "Release".to_string(),
                description: Some("cut the tag".to_string()),
                status: Some(TaskStatus::InProgress),
                priority: Some(TaskPriority::High),
                assignee_id: Some(fx.bob.id),
                reviewer_id: Some(fx.carol.id),
                due_date: Some(due),
            },
        )
        .await
        .unwrap();

    assert_eq!(task.status, TaskStatus::InProgress);
    assert_eq!(task.priority, TaskPriority::High);
    assert_eq!(task.assignee_id, Some(fx.bob.id));
    assert_eq!(task.reviewer_id, Some(fx.carol.id));
    assert_eq!(task.due_date, Some(due));
}

#[tokio::test]
async fn test_create_task_on_missing_board() {
    let fx = Fixture::new();
    let missing = Uuid::new_v4();

    let err = fx
        .services
        .tasks
        .create_task(missing, fx.alice.id, NewTask::titled("Orphan"))
        .await
        .unwrap_err();

    assert!(matches!(err, BoardError::NotFound { kind: EntityKind::Board, id } if id == missing));
}

#[tokio::test]
async fn test_create_task_by_non_member_is_forbidden() {
    let fx = Fixture::new();
    let board = fx.board(&fx.alice, &[]).await;

    let err = fx
        .services
        .tasks
        .create_task(board.id, fx.dave.id, NewTask::titled("Sneaky"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        BoardError::Forbidden {
            kind: EntityKind::Task,
            action: Action::Create
        }
    ));
}

#[tokio::test]
async fn test_assignee_must_be_member() {
    let fx = Fixture::new();
    let board = fx.board(&fx.alice, &[&fx.bob]).await;

    let mut data = NewTask::titled("Fix bug");
    data.assignee_id = Some(fx.carol.id);

    let err = fx
        .services
        .tasks
        .create_task(board.id, fx.alice.id, data)
        .await
        .unwrap_err();

    match err {
        BoardError::Validation(errors) => {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors.errors()[0].field, "assignee_id");
            assert_eq!(errors.errors()[0].message, USER_NOT_A_MEMBER);
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    let tasks = fx.services.tasks.list_board_tasks(board.id, fx.alice.id).await.unwrap();
    assert!(tasks.is_empty());
}

#[tokio::test]
async fn test_assignee_and_reviewer_errors_are_collected() {
    let fx = Fixture::new();
    let board = fx.board(&fx.alice, &[]).await;

    let mut data = NewTask::titled("");
    data.assignee_id = Some(Uuid::new_v4());
    data.reviewer_id = Some(fx.dave.id);

    let err = fx
        .services
        .tasks
        .create_task(board.id, fx.alice.id, data)
        .await
        .unwrap_err();

    match err {
        BoardError::Validation(errors) => {
            assert_eq!(errors.len(), 3);
            assert!(errors.has_field("title"));

            let assignee = errors.errors().iter().find(|e| e.field == "assignee_id").unwrap();
            assert_eq!(assignee.message, USER_DOES_NOT_EXIST);

            let reviewer = errors.errors().iter().find(|e| e.field == "reviewer_id").unwrap();
            assert_eq!(reviewer.message, USER_NOT_A_MEMBER);
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_update_task_absent_vs_null() {
    let fx = Fixture::new();
    let board = fx.board(&fx.alice, &[&fx.bob]).await;

    let mut data = NewTask::titled("Fix bug");
    data.description = Some("stack trace attached".to_string());
    data.assignee_id = Some(fx.bob.id);
    let task = fx.services.tasks.create_task(board.id, fx.alice.id, data).await.unwrap();

    // absent assignee stays
    let updated = fx
        .services
        .tasks
        .update_task(
            task.id,
            fx.bob.id,
            TaskPatch {
                status: Some(Some(TaskStatus::Review)),
                ..TaskPatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.status, TaskStatus::Review);
    assert_eq!(updated.assignee_id, Some(fx.bob.id));
    assert_eq!(updated.description.as_deref(), Some("stack trace attached"));
    assert!(updated.updated_at >= task.updated_at);

    // explicit null clears
    let updated = fx
        .services
        .tasks
        .update_task(
            task.id,
            fx.bob.id,
            TaskPatch {
                assignee_id: Some(None),
                description: Some(None),
                ..TaskPatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.assignee_id, None);
    assert_eq!(updated.description, None);
    assert_eq!(updated.status, TaskStatus::Review);
    assert_eq!(updated.created_by, fx.alice.id);
}

#[tokio::test]
async fn test_update_task_revalidates_assignee() {
    let fx = Fixture::new();
    let board = fx.board(&fx.alice, &[&fx.bob]).await;
    let task = fx.task(board.id, &fx.alice, "Fix bug").await;

    let err = fx
        .services
        .tasks
        .update_task(
            task.id,
            fx.alice.id,
            TaskPatch {
                title: Some(Some("Fix it properly".to_string())),
                reviewer_id: Some(Some(fx.dave.id)),
                ..TaskPatch::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, BoardError::Validation(ref e) if e.has_field("reviewer_id")));

    // nothing applied
    let current = fx.services.tasks.get_task(task.id, fx.alice.id).await.unwrap();
    assert_eq!(current.task.title, "Fix bug");
    assert_eq!(current.task.reviewer_id, None);
}

#[tokio::test]
async fn test_update_task_by_non_member_is_forbidden() {
    let fx = Fixture::new();
    let board = fx.board(&fx.alice, &[]).await;
    let task = fx.task(board.id, &fx.alice, "Fix bug").await;

    let err = fx
        .services
        .tasks
        .update_task(task.id, fx.dave.id, TaskPatch::default())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        BoardError::Forbidden {
            kind: EntityKind::Task,
            action: Action::Update
        }
    ));
}

#[tokio::test]
async fn test_missing_task_is_not_found() {
    let fx = Fixture::new();
    let missing = Uuid::new_v4();

    let err = fx
        .services
        .tasks
        .update_task(missing, fx.alice.id, TaskPatch::default())
        .await
        .unwrap_err();
    assert!(matches!(err, BoardError::NotFound { kind: EntityKind::Task, id } if id == missing));

    let err = fx.services.tasks.delete_task(missing, fx.alice.id).await.unwrap_err();
    assert!(matches!(err, BoardError::NotFound { kind: EntityKind::Task, .. }));

    let err = fx.services.tasks.get_task(missing, fx.alice.id).await.unwrap_err();
    assert!(matches!(err, BoardError::NotFound { kind: EntityKind::Task, .. }));
}

#[tokio::test]
async fn test_delete_task_permissions() {
    let fx = Fixture::new();
    let board = fx.board(&fx.alice, &[&fx.bob, &fx.carol, &fx.dave]).await;
    let task = fx.task(board.id, &fx.bob, "Bob's task").await;

    // dave is a member, but neither creator nor owner
    let err = fx.services.tasks.delete_task(task.id, fx.dave.id).await.unwrap_err();
    assert!(matches!(
        err,
        BoardError::Forbidden {
            kind: EntityKind::Task,
            action: Action::Delete
        }
    ));

    // the creator may
    fx.services.tasks.delete_task(task.id, fx.bob.id).await.unwrap();

    // and so may the board owner
    let other = fx.task(board.id, &fx.carol, "Carol's task").await;
    fx.services.tasks.delete_task(other.id, fx.alice.id).await.unwrap();

    let tasks = fx.services.tasks.list_board_tasks(board.id, fx.alice.id).await.unwrap();
    assert!(tasks.is_empty());
}

#[tokio::test]
async fn test_delete_task_cascades_to_comments() {
    let fx = Fixture::new();
    let board = fx.board(&fx.alice, &[&fx.bob]).await;
    let task = fx.task(board.id, &fx.alice, "Fix bug").await;
    let comment = fx
        .services
        .comments
        .add_comment(task.id, fx.bob.id, "repro steps?")
        .await
        .unwrap();

    fx.services.tasks.delete_task(task.id, fx.alice.id).await.unwrap();

    let err = fx
        .services
        .comments
        .delete_comment(task.id, comment.id, fx.bob.id)
        .await
        .unwrap_err();
    assert!(matches!(err, BoardError::NotFound { .. }));
}

#[tokio::test]
async fn test_get_and_list_board_tasks() {
    let fx = Fixture::new();
    let board = fx.board(&fx.alice, &[&fx.bob]).await;
    let first = fx.task(board.id, &fx.alice, "First").await;
    let second = fx.task(board.id, &fx.bob, "Second").await;
    fx.services.comments.add_comment(second.id, fx.alice.id, "nice").await.unwrap();

    let summary = fx.services.tasks.get_task(second.id, fx.bob.id).await.unwrap();
    assert_eq!(summary.task.title, "Second");
    assert_eq!(summary.comments_count, 1);

    let tasks = fx.services.tasks.list_board_tasks(board.id, fx.bob.id).await.unwrap();
    let ids: Vec<Uuid> = tasks.iter().map(|t| t.task.id).collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&first.id));
    assert!(ids.contains(&second.id));

    let err = fx.services.tasks.get_task(first.id, fx.dave.id).await.unwrap_err();
    assert!(matches!(err, BoardError::Forbidden { kind: EntityKind::Task, action: Action::Read }));

    let err = fx.services.tasks.list_board_tasks(board.id, fx.dave.id).await.unwrap_err();
    assert!(matches!(err, BoardError::Forbidden { kind: EntityKind::Board, action: Action::Read }));
}

#[tokio::test]
async fn test_assigned_and_reviewing_queries_span_boards() {
    let fx = Fixture::new();
    let one = fx.board(&fx.alice, &[&fx.bob]).await;
    let two = fx.board(&fx.carol, &[&fx.bob]).await;

    let mut a = NewTask::titled("A");
    a.assignee_id = Some(fx.bob.id);
    let mut b = NewTask::titled("B");
    b.assignee_id = Some(fx.bob.id);
    b.reviewer_id = Some(fx.carol.id);
    let mut c = NewTask::titled("C");
    c.reviewer_id = Some(fx.bob.id);

    fx.services.tasks.create_task(one.id, fx.alice.id, a).await.unwrap();
    fx.services.tasks.create_task(two.id, fx.carol.id, b).await.unwrap();
    fx.services.tasks.create_task(two.id, fx.carol.id, c).await.unwrap();

    let assigned = fx.services.tasks.assigned_to(fx.bob.id).await.unwrap();
    let mut titles: Vec<&str> = assigned.iter().map(|t| t.title.as_str()).collect();
    titles.sort();
    assert_eq!(titles, vec!["A", "B"]);

    let reviewing = fx.services.tasks.reviewing(fx.bob.id).await.unwrap();
    assert_eq!(reviewing.len(), 1);
    assert_eq!(reviewing[0].title, "C");

    assert!(fx.services.tasks.assigned_to(fx.dave.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_assignments_survive_membership_shrink() {
    let fx = Fixture::new();
    let board = fx.board(&fx.alice, &[&fx.bob]).await;

    let mut data = NewTask::titled("Fix bug");
    data.assignee_id = Some(fx.bob.id);
    let task = fx.services.tasks.create_task(board.id, fx.alice.id, data).await.unwrap();

    fx.services
        .boards
        .update_board(
            board.id,
            fx.alice.id,
            BoardChanges {
                title: None,
                members: Some(vec![fx.alice.id]),
            },
        )
        .await
        .unwrap();

    // write-time check only: the stored assignment is left alone
    let current = fx.services.tasks.get_task(task.id, fx.alice.id).await.unwrap();
    assert_eq!(current.task.assignee_id, Some(fx.bob.id));

    // but it cannot be set again
    let err = fx
        .services
        .tasks
        .update_task(
            task.id,
            fx.alice.id,
            TaskPatch {
                assignee_id: Some(Some(fx.bob.id)),
                ..TaskPatch::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, BoardError::Validation(ref e) if e.has_field("assignee_id")));
}

#[tokio::test]
async fn test_update_task_rejects_null_required_fields() {
    let fx = Fixture::new();
    let board = fx.board(&fx.alice, &[&fx.bob]).await;
    let task = fx.task(board.id, &fx.alice, "Fix bug").await;

    let patch: TaskPatch =
        serde_json::from_str(r#"{"title": null, "status": null, "priority": null, "description": "ignored"}"#)
            .unwrap();
    let err = fx
        .services
        .tasks
        .update_task(task.id, fx.bob.id, patch)
        .await
        .unwrap_err();

    let errors = match err {
        BoardError::Validation(errors) => errors,
        other => panic!("expected validation error, got {other:?}"),
    };
    assert_eq!(errors.len(), 3);
    for field in ["title", "status", "priority"] {
        assert!(errors.has_field(field), "missing error for {field}");
    }
    assert!(errors.errors().iter().all(|e| e.message == NULL_FIELD));

    // nothing applied
    let current = fx.services.tasks.get_task(task.id, fx.alice.id).await.unwrap();
    assert_eq!(current.task.title, "Fix bug");
    assert_eq!(current.task.status, TaskStatus::ToDo);
    assert_eq!(current.task.priority, TaskPriority::Medium);
    assert_eq!(current.task.description, None);
}
