//! Common test utilities for API tests
//!
//! Builds the full router over in-memory storage, registers users in the
//! directory and signs tokens for them. No database is needed.
#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use boardline_api::app::{build_router, AppState};
use boardline_api::config::Config;
use boardline_shared::auth::jwt::{create_token, Claims};
use boardline_shared::identity::MemoryDirectory;
use boardline_shared::models::user::User;
use serde_json::Value;
use std::sync::Arc;
use tower::Service as _;

pub const TEST_SECRET: &str = "test-secret-key-at-least-32-bytes-long";

/// Test context containing the router and a few users
pub struct TestContext {
    pub app: axum::Router,
    pub directory: Arc<MemoryDirectory>,
    pub alice: User,
    pub bob: User,
    pub carol: User,
}

impl TestContext {
    pub fn new() -> Self {
        let config = Config::from_lookup(|key| match key {
            "JWT_SECRET" => Some(TEST_SECRET.to_string()),
            _ => None,
        })
        .expect("test config");

        let directory = Arc::new(MemoryDirectory::new());
        let alice = directory.insert(User::new("alice@example.com", "Alice Archer"));
        let bob = directory.insert(User::new("bob@example.com", "Bob Baker"));
        let carol = directory.insert(User::new("carol@example.com", "Carol Cooper"));

        let state = AppState::in_memory(directory.clone(), config);
        let app = build_router(state);

        TestContext {
            app,
            directory,
            alice,
            bob,
            carol,
        }
    }

    /// Returns authorization header value for `user`
    pub fn auth_header(&self, user: &User) -> String {
        let token = create_token(&Claims::new(user.id), TEST_SECRET).expect("sign token");
        format!("Bearer {}", token)
    }

    /// Sends a request as `user` (or anonymously) and returns status and JSON body
    ///
    /// Empty bodies come back as `Value::Null`.
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        user: Option<&User>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header("authorization", self.auth_header(user));
        }

        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        (status, json)
    }

    pub async fn get(&self, uri: &str, user: &User) -> (StatusCode, Value) {
        self.send("GET", uri, Some(user), None).await
    }

    pub async fn post(&self, uri: &str, user: &User, body: Value) -> (StatusCode, Value) {
        self.send("POST", uri, Some(user), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, user: &User, body: Value) -> (StatusCode, Value) {
        self.send("PATCH", uri, Some(user), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, user: &User) -> (StatusCode, Value) {
        self.send("DELETE", uri, Some(user), None).await
    }

    /// Creates a board owned by `owner` and returns its id
    pub async fn create_board(&self, owner: &User, members: &[&User]) -> String {
        let members: Vec<String> = members.iter().map(|u| u.id.to_string()).collect();
        let (status, body) = self
            .post(
                "/v1/boards",
                owner,
                serde_json::json!({ "title": "Sprint 1", "members": members }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create board: {body}");
        body["id"].as_str().unwrap().to_string()
    }

    /// Creates a task on `board_id` and returns its id
    pub async fn create_task(&self, board_id: &str, creator: &User, title: &str) -> String {
        let (status, body) = self
            .post(
                "/v1/tasks",
                creator,
                serde_json::json!({ "board": board_id, "title": title }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create task: {body}");
        body["id"].as_str().unwrap().to_string()
    }
}
