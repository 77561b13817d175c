/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and registration rules
/// - [`session`]: HS256 session token issue and validation
/// - [`middleware`]: session lookup from cookies or bearer headers
/// - [`authorization`]: per-action access checks on tasks and comments
///
/// # Example
///
/// ```no_run
/// use chrono::Duration;
/// use taskboard_shared::auth::password::{hash_password, verify_password};
/// use taskboard_shared::auth::session::{issue_session, SessionClaims};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("Us3r!password")?;
/// assert!(verify_password("Us3r!password", &hash)?);
///
/// let claims = SessionClaims::new(Uuid::new_v4(), Duration::days(14));
/// let token = issue_session(&claims, "a-session-secret-that-is-long-enough")?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod middleware;
pub mod password;
pub mod session;
