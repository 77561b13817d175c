/// Configuration management for the Taskboard API server
///
/// Configuration is read from environment variables; a `.env` file is loaded
/// first when present (development).
///
/// # Environment Variables
///
/// - `DATABASE_URL` (required): PostgreSQL connection string
/// - `DATABASE_MAX_CONNECTIONS` (default 10)
/// - `API_HOST` (default `0.0.0.0`), `API_PORT` (default 8080)
/// - `SESSION_SECRET` (required, at least 32 characters)
/// - `SESSION_TTL_HOURS` (default 336, two weeks)
/// - `CORS_ORIGINS`: comma separated origins, `*` for any (default `*`)
/// - `PRODUCTION`: `true` enables HSTS and `Secure` cookies (default false)
/// - `LOGIN_PATH`: where anonymous requests are redirected (default `/v1/auth/login`)
///
/// # Example
///
/// ```no_run
/// use taskboard_api::config::Config;
///
/// let config = Config::from_env().expect("Failed to load configuration");
/// println!("Listening on {}", config.bind_address());
/// ```

use serde::{Deserialize, Serialize};
use std::env;
use taskboard_shared::auth::session::DEFAULT_SESSION_TTL_HOURS;

pub const DEFAULT_LOGIN_PATH: &str = "/v1/auth/login";

const MIN_SECRET_LENGTH: usize = 32;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,

    pub database: DatabaseConfig,

    pub session: SessionConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,

    pub port: u16,

    /// Allowed CORS origins; `["*"]` allows any
    pub cors_origins: Vec<String>,

    /// Production mode: HSTS header and `Secure` cookies
    pub production: bool,

    /// Redirect target for unauthenticated requests
    pub login_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,

    pub max_connections: u32,
}

/// Session token configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// HS256 signing secret
    #[serde(skip_serializing)]
    pub secret: String,

    pub ttl_hours: i64,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing, a number does not
    /// parse, or the session secret is shorter than 32 characters.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let api_host = lookup("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let api_port = lookup("API_PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse::<u16>()?;

        let cors_origins = parse_origins(&lookup("CORS_ORIGINS").unwrap_or_else(|| "*".to_string()));

        let production = lookup("PRODUCTION")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

        let login_path = lookup("LOGIN_PATH")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOGIN_PATH.to_string());

        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = lookup("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|| "10".to_string())
            .parse::<u32>()?;

        let secret = lookup("SESSION_SECRET")
            .ok_or_else(|| anyhow::anyhow!("SESSION_SECRET environment variable is required"))?;

        if secret.len() < MIN_SECRET_LENGTH {
            anyhow::bail!("SESSION_SECRET must be at least {MIN_SECRET_LENGTH} characters long");
        }

        let ttl_hours = match lookup("SESSION_TTL_HOURS") {
            Some(v) => v.parse::<i64>()?,
            None => DEFAULT_SESSION_TTL_HOURS,
        };

        if ttl_hours <= 0 {
            anyhow::bail!("SESSION_TTL_HOURS must be positive");
        }

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                cors_origins,
                production,
                login_path,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            session: SessionConfig { secret, ttl_hours },
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.session.ttl_hours)
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn load(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("DATABASE_URL", "postgresql://localhost/test"), ("SESSION_SECRET", SECRET)]).unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.api.cors_origins, vec!["*".to_string()]);
        assert!(!config.api.production);
        assert_eq!(config.api.login_path, DEFAULT_LOGIN_PATH);
        assert_eq!(config.session.ttl_hours, 336);
        assert_eq!(config.session_ttl(), chrono::Duration::days(14));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("DATABASE_URL", "postgresql://localhost/test"),
            ("SESSION_SECRET", SECRET),
            ("API_HOST", "127.0.0.1"),
            ("API_PORT", "3000"),
            ("CORS_ORIGINS", "https://a.example, https://b.example,"),
            ("PRODUCTION", "TRUE"),
            ("LOGIN_PATH", "/login"),
            ("SESSION_TTL_HOURS", "8"),
        ])
        .unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:3000");
        assert_eq!(
            config.api.cors_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
        assert!(config.api.production);
        assert_eq!(config.api.login_path, "/login");
        assert_eq!(config.session.ttl_hours, 8);
    }

    #[test]
    fn test_missing_required() {
        assert!(load(&[("SESSION_SECRET", SECRET)]).is_err());
        assert!(load(&[("DATABASE_URL", "postgresql://localhost/test")]).is_err());
    }

    #[test]
    fn test_short_secret_rejected() {
        let err = load(&[("DATABASE_URL", "postgresql://localhost/test"), ("SESSION_SECRET", "short")]).unwrap_err();
        assert!(err.to_string().contains("at least 32"));
    }

    #[test]
    fn test_bad_numbers_rejected() {
        assert!(load(&[
            ("DATABASE_URL", "postgresql://localhost/test"),
            ("SESSION_SECRET", SECRET),
            ("API_PORT", "eighty"),
        ])
        .is_err());
        assert!(load(&[
            ("DATABASE_URL", "postgresql://localhost/test"),
            ("SESSION_SECRET", SECRET),
            ("SESSION_TTL_HOURS", "0"),
        ])
        .is_err());
    }
}
