//! # Boardline Shared Library
//!
//! The board core: boards shared between members, tasks scoped to a board,
//! and comments scoped to a task, together with the authorization and
//! consistency rules that tie them together.
//!
//! ## Module Organization
//!
//! - `models`: Entities and read views
//! - `auth`: Bearer token validation and the authorization policy table
//! - `identity`: User lookups through the external identity provider
//! - `storage`: Transactional storage seam with memory and PostgreSQL backends
//! - `services`: Board Registry, Task Store and Comment Log
//! - `db`: Connection pool and migrations for the PostgreSQL backend
//! - `error`: The core error taxonomy

pub mod auth;
pub mod db;
pub mod error;
pub mod identity;
pub mod models;
pub mod services;
pub mod storage;

/// Current version of the Boardline shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
