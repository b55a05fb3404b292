//! REST client for the GoTrue auth endpoints.
//!
//! Covers the password and refresh-token grants, user lookup, logout,
//! signup, admin deletion, password recovery and password update using
//! [`reqwest`]. Every request carries the `apikey` header.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::GoTrueConfig;

/// Token lifetime assumed when the provider reports neither `expires_at`
/// nor `expires_in`.
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// HTTP client for a GoTrue deployment.
#[derive(Clone)]
pub struct GoTrueClient {
    client: reqwest::Client,
    config: GoTrueConfig,
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// The `user` object embedded in most responses.
#[derive(Debug, Clone, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// Response of `POST /token`.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Absolute expiry as a unix timestamp (seconds).
    #[serde(default)]
    pub expires_at: Option<i64>,
    /// Relative lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<i64>,
    pub user: UserResponse,
}

impl TokenResponse {
    /// Absolute access-token expiry, derived from whichever field the
    /// provider sent.
    pub fn expiry(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.expires_at
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .unwrap_or_else(|| {
                let secs = self.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
                now + chrono::Duration::seconds(secs)
            })
    }
}

/// Response of `POST /signup`.
///
/// With email confirmation enabled the user object comes back at the top
/// level; with auto-confirm a session is returned with the user nested.
#[derive(Debug, Deserialize)]
pub struct SignupResponse {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub user: Option<UserResponse>,
}

impl SignupResponse {
    pub fn user_id(&self) -> Option<Uuid> {
        self.id.or_else(|| self.user.as_ref().map(|u| u.id))
    }
}

#[derive(Debug, Serialize)]
struct PasswordGrantBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RefreshGrantBody<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Serialize)]
struct SignupBody<'a, D: Serialize> {
    email: &'a str,
    password: &'a str,
    data: &'a D,
}

#[derive(Debug, Serialize)]
struct RecoverBody<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct UpdatePasswordBody<'a> {
    password: &'a str,
}

/// Error payload. GoTrue has used several shapes over time; every field is
/// optional and the first present one wins.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Errors from the GoTrue REST layer.
#[derive(Debug, thiserror::Error)]
pub enum GoTrueError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// GoTrue returned a non-2xx status code.
    #[error("GoTrue API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Machine-readable error code, when the body carried one.
        code: Option<String>,
        /// Human-readable message or the raw body.
        message: String,
    },

    /// An admin endpoint was called without a service-role key.
    #[error("SUPABASE_SERVICE_ROLE_KEY is not configured")]
    MissingServiceRoleKey,

    /// A 2xx response did not contain what the endpoint promises.
    #[error("Unexpected GoTrue response: {0}")]
    InvalidResponse(String),
}

impl GoTrueError {
    /// Build an [`GoTrueError::Api`] from a status and raw body.
    pub fn from_body(status: u16, body: &str) -> Self {
        let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
        let code = parsed.error_code.or_else(|| parsed.error.clone());
        let message = parsed
            .msg
            .or(parsed.message)
            .or(parsed.error_description)
            .or(parsed.error)
            .unwrap_or_else(|| body.to_string());
        Self::Api {
            status,
            code,
            message,
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

impl GoTrueClient {
    pub fn new(config: GoTrueConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: GoTrueConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &GoTrueConfig {
        &self.config
    }

    /// `POST /token?grant_type=password`
    pub async fn password_grant(
        &self,
        email: &str,
        password: &str,
    ) -> Result<TokenResponse, GoTrueError> {
        let response = self
            .request(reqwest::Method::POST, "/token")
            .query(&[("grant_type", "password")])
            .json(&PasswordGrantBody { email, password })
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// `POST /token?grant_type=refresh_token`
    pub async fn refresh_grant(&self, refresh_token: &str) -> Result<TokenResponse, GoTrueError> {
        let response = self
            .request(reqwest::Method::POST, "/token")
            .query(&[("grant_type", "refresh_token")])
            .json(&RefreshGrantBody { refresh_token })
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// `GET /user` with the caller's access token.
    pub async fn get_user(&self, access_token: &str) -> Result<UserResponse, GoTrueError> {
        let response = self
            .request(reqwest::Method::GET, "/user")
            .bearer_auth(access_token)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// `POST /logout`, ending the provider session behind the token.
    pub async fn logout(&self, access_token: &str) -> Result<(), GoTrueError> {
        let response = self
            .request(reqwest::Method::POST, "/logout")
            .bearer_auth(access_token)
            .send()
            .await?;

        Self::check_status(response).await
    }

    /// `POST /signup` with profile fields stored as user metadata.
    pub async fn signup<D: Serialize>(
        &self,
        email: &str,
        password: &str,
        data: &D,
    ) -> Result<Uuid, GoTrueError> {
        let response = self
            .request(reqwest::Method::POST, "/signup")
            .json(&SignupBody {
                email,
                password,
                data,
            })
            .send()
            .await?;

        let body: SignupResponse = Self::parse_response(response).await?;
        body.user_id()
            .ok_or_else(|| GoTrueError::InvalidResponse("signup response carried no user id".into()))
    }

    /// `DELETE /admin/users/{id}` using the service-role key.
    pub async fn admin_delete_user(&self, user_id: Uuid) -> Result<(), GoTrueError> {
        let key = self
            .config
            .service_role_key
            .as_deref()
            .ok_or(GoTrueError::MissingServiceRoleKey)?;

        let response = self
            .client
            .delete(format!("{}/admin/users/{user_id}", self.config.base_url))
            .header("apikey", key)
            .bearer_auth(key)
            .send()
            .await?;

        Self::check_status(response).await
    }

    /// `POST /recover`, mailing a recovery link.
    pub async fn recover(&self, email: &str) -> Result<(), GoTrueError> {
        let mut request = self.request(reqwest::Method::POST, "/recover");
        if let Some(redirect) = &self.config.recovery_redirect_url {
            request = request.query(&[("redirect_to", redirect.as_str())]);
        }
        let response = request.json(&RecoverBody { email }).send().await?;

        Self::check_status(response).await
    }

    /// `PUT /user` setting a new password.
    pub async fn update_password(
        &self,
        access_token: &str,
        password: &str,
    ) -> Result<(), GoTrueError> {
        let response = self
            .request(reqwest::Method::PUT, "/user")
            .bearer_auth(access_token)
            .json(&UpdatePasswordBody { password })
            .send()
            .await?;

        Self::check_status(response).await
    }

    /// `GET /health`
    pub async fn health(&self) -> Result<(), GoTrueError> {
        let response = self.request(reqwest::Method::GET, "/health").send().await?;
        Self::check_status(response).await
    }

    // ---- private helpers ----

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{path}", self.config.base_url))
            .header("apikey", &self.config.api_key)
    }

    /// Return the response unchanged on success, or a [`GoTrueError::Api`]
    /// built from the status and body.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, GoTrueError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            let err = GoTrueError::from_body(status.as_u16(), &body);
            tracing::debug!(status = status.as_u16(), error = %err, "GoTrue request rejected");
            return Err(err);
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, GoTrueError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    async fn check_status(response: reqwest::Response) -> Result<(), GoTrueError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}
