//! # Tasklist Shared Library
//!
//! Shared types and business logic used by the tasklist API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models (users, tasks)
//! - `auth`: Bearer tokens, password hashing, external identity verification
//! - `db`: Connection pool and migrations
//! - `mail`: Task-creation email notifier

pub mod auth;
pub mod db;
pub mod mail;
pub mod models;

/// Current version of the tasklist shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
