/// API route handlers
///
/// - `health`: Health check endpoint
/// - `auth`: Identity endpoints (register, login, external login, me)
/// - `tasks`: Owner-scoped task CRUD

pub mod auth;
pub mod health;
pub mod tasks;
