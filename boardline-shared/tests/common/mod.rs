//! Shared fixtures for board core integration tests
#![allow(dead_code)]

use std::sync::Arc;

use boardline_shared::identity::MemoryDirectory;
use boardline_shared::models::board::{BoardSummary, NewBoard};
use boardline_shared::models::task::{NewTask, Task};
use boardline_shared::models::user::User;
use boardline_shared::services::Services;
use boardline_shared::storage::{MemoryStorage, Storage};
use uuid::Uuid;

/// Memory-backed services plus four known users
///
/// `alice` usually owns boards, `bob` and `carol` are invited, `dave` is a
/// registered outsider.
pub struct Fixture {
    pub services: Services,
    pub directory: Arc<MemoryDirectory>,
    pub storage: Arc<MemoryStorage>,
    pub alice: User,
    pub bob: User,
    pub carol: User,
    pub dave: User,
}

impl Fixture {
    pub fn new() -> Self {
        let directory = Arc::new(MemoryDirectory::new());
        let storage = Arc::new(MemoryStorage::new());

        let alice = directory.insert(User::new("alice@example.com", "Alice Archer"));
        let bob = directory.insert(User::new("bob@example.com", "Bob Baker"));
        let carol = directory.insert(User::new("carol@example.com", "Carol Cooper"));
        let dave = directory.insert(User::new("dave@example.com", "Dave Dyer"));

        let services = Services::new(storage.clone() as Arc<dyn Storage>, directory.clone());

        Self {
            services,
            directory,
            storage,
            alice,
            bob,
            carol,
            dave,
        }
    }

    pub async fn board(&self, owner: &User, members: &[&User]) -> BoardSummary {
        self.services
            .boards
            .create_board(
                owner.id,
                NewBoard {
                    title: "Sprint 1".to_string(),
                    members: members.iter().map(|u| u.id).collect(),
                },
            )
            .await
            .expect("create board")
    }

    pub async fn task(&self, board_id: Uuid, creator: &User, title: &str) -> Task {
        self.services
            .tasks
            .create_task(board_id, creator.id, NewTask::titled(title))
            .await
            .expect("create task")
    }
}
