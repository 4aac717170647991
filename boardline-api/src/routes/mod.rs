/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `boards`: Board Registry endpoints
/// - `tasks`: Task Store endpoints
/// - `comments`: Comment Log endpoints
/// - `users`: Identity lookups (email check)

pub mod boards;
pub mod comments;
pub mod health;
pub mod tasks;
pub mod users;
