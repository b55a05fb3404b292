use std::time::Duration;

use ecom_core::auth::SessionSettings;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Time allowed for background jobs to stop after the server drains (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Upper bound on each identity provider / ledger call (default: `10`).
    pub auth_call_timeout_secs: u64,
    /// Whether the refresh cookie carries the `Secure` attribute (default: `true`).
    pub refresh_cookie_secure: bool,
    /// Interval between session ledger cleanups (default: `3600`).
    pub session_cleanup_interval_secs: u64,
    /// How long revoked session records are kept (default: `24`).
    pub revoked_session_retention_hours: i64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                           | Default                 |
    /// |-----------------------------------|-------------------------|
    /// | `HOST`                            | `0.0.0.0`               |
    /// | `PORT`                            | `3000`                  |
    /// | `CORS_ORIGINS`                    | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`            | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS`           | `30`                    |
    /// | `AUTH_CALL_TIMEOUT_SECS`          | `10`                    |
    /// | `REFRESH_COOKIE_SECURE`           | `true`                  |
    /// | `SESSION_CLEANUP_INTERVAL_SECS`   | `3600`                  |
    /// | `REVOKED_SESSION_RETENTION_HOURS` | `24`                    |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let auth_call_timeout_secs: u64 = std::env::var("AUTH_CALL_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".into())
            .parse()
            .expect("AUTH_CALL_TIMEOUT_SECS must be a valid u64");

        let refresh_cookie_secure: bool = std::env::var("REFRESH_COOKIE_SECURE")
            .unwrap_or_else(|_| "true".into())
            .parse()
            .expect("REFRESH_COOKIE_SECURE must be true or false");

        let session_cleanup_interval_secs: u64 = std::env::var("SESSION_CLEANUP_INTERVAL_SECS")
            .unwrap_or_else(|_| "3600".into())
            .parse()
            .expect("SESSION_CLEANUP_INTERVAL_SECS must be a valid u64");

        let revoked_session_retention_hours: i64 = std::env::var("REVOKED_SESSION_RETENTION_HOURS")
            .unwrap_or_else(|_| "24".into())
            .parse()
            .expect("REVOKED_SESSION_RETENTION_HOURS must be a valid i64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            auth_call_timeout_secs,
            refresh_cookie_secure,
            session_cleanup_interval_secs,
            revoked_session_retention_hours,
        }
    }

    /// Settings handed to the session manager.
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            call_timeout: Duration::from_secs(self.auth_call_timeout_secs),
        }
    }
}
