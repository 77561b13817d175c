/// Session tokens
///
/// A login issues an HS256-signed JWT carrying the user ID. The HTTP layer
/// stores it in an HTTP-only cookie (or accepts it as a bearer token) and
/// validates it on every request.
///
/// - **Algorithm**: HS256
/// - **Issuer**: `taskboard`, checked on validation
/// - **Lifetime**: configurable, 14 days by default
/// - **Secret**: at least 32 bytes
///
/// # Example
///
/// ```
/// use chrono::Duration;
/// use taskboard_shared::auth::session::{issue_session, validate_session, SessionClaims};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "a-session-secret-that-is-long-enough";
/// let user_id = Uuid::new_v4();
///
/// let token = issue_session(&SessionClaims::new(user_id, Duration::hours(1)), secret)?;
/// assert_eq!(validate_session(&token, secret)?.sub, user_id);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Issuer claim of every session token
pub const SESSION_ISSUER: &str = "taskboard";

/// Default session lifetime in hours (14 days)
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 336;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Failed to create session token: {0}")]
    CreateError(String),

    #[error("Invalid session token: {0}")]
    Invalid(String),

    #[error("Session has expired")]
    Expired,
}

/// Session token claims
///
/// - `sub`: user ID
/// - `iss`: always `"taskboard"`
/// - `iat` / `nbf` / `exp`: Unix timestamps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: Uuid,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub nbf: i64,
}

impl SessionClaims {
    pub fn new(user_id: Uuid, ttl: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id,
            iss: SESSION_ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            nbf: now.timestamp(),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Signs session claims
pub fn issue_session(claims: &SessionClaims, secret: &str) -> Result<String, SessionError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| SessionError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Checks signature, issuer, expiry and not-before, returning the claims
pub fn validate_session(token: &str, secret: &str) -> Result<SessionClaims, SessionError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[SESSION_ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;
    validation.leeway = 0;

    let data = decode::<SessionClaims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => SessionError::Expired,
        _ => SessionError::Invalid(e.to_string()),
    })?;

    Ok(data.claims)
}
