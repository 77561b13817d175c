//! # Taskboard Shared Library
//!
//! Domain types, storage and business logic used by the Taskboard API server.
//!
//! ## Module Organization
//!
//! - `models`: database models for users, projects, tasks and comments
//! - `db`: connection pool and migrations
//! - `listing`: filtering, sorting and pagination of task and project lists
//! - `report`: project report aggregates and xlsx export
//! - `auth`: passwords, sessions and access checks

pub mod auth;
pub mod db;
pub mod listing;
pub mod models;
pub mod report;

/// Current version of the Taskboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
