//! # Teamboard Shared Library
//!
//! Domain types, persistence and business rules for the Teamboard API.
//!
//! ## Module Organization
//!
//! - `models`: row types, enums and their SQL
//! - `db`: connection pool and migrations
//! - `store`: persistence trait with Postgres and in-memory implementations
//! - `auth`: passwords, tokens, current user resolution, authorization guard
//! - `services`: team, board, task, invitation, membership and notification workflows

pub mod auth;
pub mod db;
pub mod models;
pub mod services;
pub mod store;

/// Current version of the shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
