/// Session resolution for HTTP requests
///
/// A request is authenticated by a session token found either in the
/// `taskboard_session` cookie (browser flow) or in an
/// `Authorization: Bearer <token>` header (API clients). The cookie wins when
/// both are present.
///
/// [`authenticate`] validates the token, loads the user and returns the
/// [`AuthContext`] that handlers read from request extensions:
///
/// ```no_run
/// use axum::Extension;
/// use taskboard_shared::auth::middleware::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("hello {}", auth.email)
/// }
/// ```

use axum::http::{header, HeaderMap};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::session::{validate_session, SessionError};
use crate::models::user::User;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "taskboard_session";

/// The logged-in user of the current request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub email: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl From<&User> for AuthContext {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("No session")]
    MissingCredentials,

    #[error("Invalid session: {0}")]
    InvalidSession(#[from] SessionError),

    #[error("User no longer exists or is inactive")]
    UnknownUser,

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Session token carried by the request, cookie first
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    cookie_value(headers, SESSION_COOKIE).or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
    })
}

/// Resolves the current user from request headers
pub async fn authenticate(pool: &PgPool, headers: &HeaderMap, secret: &str) -> Result<AuthContext, AuthError> {
    let token = extract_token(headers).ok_or(AuthError::MissingCredentials)?;
    let claims = validate_session(token, secret)?;

    let user = User::find_by_id(pool, claims.sub)
        .await?
        .filter(|user| user.is_active)
        .ok_or(AuthError::UnknownUser)?;

    Ok(AuthContext::from(&user))
}

/// `Set-Cookie` value storing a session token
pub fn session_cookie(token: &str, ttl: Duration, secure: bool) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        ttl.num_seconds().max(0)
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value deleting the session cookie
pub fn clear_session_cookie(secure: bool) -> String {
    session_cookie("", Duration::zero(), secure)
}

fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_extract_token_from_cookie() {
        let map = headers(&[(header::COOKIE, "theme=dark; taskboard_session=abc.def.ghi; other=1")]);
        assert_eq!(extract_token(&map), Some("abc.def.ghi"));
    }

    #[test]
    fn test_extract_token_from_bearer() {
        let map = headers(&[(header::AUTHORIZATION, "Bearer abc.def.ghi")]);
        assert_eq!(extract_token(&map), Some("abc.def.ghi"));

        let basic = headers(&[(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")]);
        assert_eq!(extract_token(&basic), None);
    }

    #[test]
    fn test_cookie_wins_over_bearer() {
        let map = headers(&[
            (header::AUTHORIZATION, "Bearer from-header"),
            (header::COOKIE, "taskboard_session=from-cookie"),
        ]);
        assert_eq!(extract_token(&map), Some("from-cookie"));
    }

    #[test]
    fn test_empty_cookie_is_ignored() {
        let map = headers(&[(header::COOKIE, "taskboard_session=")]);
        assert_eq!(extract_token(&map), None);
        assert_eq!(extract_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("tok", Duration::hours(1), false);
        assert_eq!(cookie, "taskboard_session=tok; Path=/; HttpOnly; SameSite=Lax; Max-Age=3600");

        let secure = session_cookie("tok", Duration::hours(1), true);
        assert!(secure.ends_with("; Secure"));

        let cleared = clear_session_cookie(false);
        assert!(cleared.starts_with("taskboard_session=;"));
        assert!(cleared.contains("Max-Age=0"));
    }
}
