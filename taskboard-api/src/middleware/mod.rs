/// Middleware for the API server
///
/// - `security`: hardening response headers
///
/// Session resolution lives in `app::session_layer` because it needs the
/// application state.

pub mod security;
