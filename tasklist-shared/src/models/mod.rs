/// Database models
///
/// - `user`: User accounts (password or external-identity credentials)
/// - `task`: Per-user task records

pub mod task;
pub mod user;
