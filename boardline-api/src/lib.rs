//! # Boardline API Server Library
//!
//! HTTP transport over the board core: maps requests to Board Registry,
//! Task Store and Comment Log operations and their outcomes to status codes.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod routes;
