/// API route handlers, one module per resource
///
/// - `root`: `/` redirect
/// - `health`: health check
/// - `auth`: register, login, logout
/// - `tasks`: task listings, detail and mutations
/// - `comments`: task comments
/// - `projects`: projects, task links and reports
/// - `users`: user directory and per-user task lists

pub mod auth;
pub mod comments;
pub mod health;
pub mod projects;
pub mod root;
pub mod tasks;
pub mod users;
