//! Error taxonomy for the session lifecycle.

use super::ports::StoreError;

/// Every failure the session manager can report.
///
/// Callers switch on the variant (or its [`code`](AuthError::code)); messages
/// never carry provider or SQL details for the client-facing variants.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Bad credentials, or the provider refused the exchange.
    #[error("Invalid email or password")]
    AuthenticationFailed,

    /// Access token rejected by the provider (expired, malformed, revoked).
    #[error("Invalid or expired authentication token")]
    InvalidToken,

    /// Refresh token was already rotated out or revoked by logout.
    #[error("Refresh token has been revoked")]
    TokenRevoked,

    /// Refresh token is not present in the session ledger.
    #[error("Refresh token is not recognised")]
    UnknownToken,

    /// No refresh token cookie was sent.
    #[error("Refresh token not provided")]
    MissingRefreshToken,

    /// Signup for an email that already has an account.
    #[error("An account with this email already exists")]
    EmailAlreadyExists,

    /// Session ledger or user store write/read failure.
    #[error("Persistence failed: {0}")]
    PersistenceFailed(String),

    /// Network or infrastructure failure talking to the identity provider.
    #[error("Identity provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The provider refused to end the session.
    #[error("An error occurred during logout")]
    LogoutFailed,

    /// The provider refused to create the account.
    #[error("Account creation failed: {0}")]
    AccountCreationFailed(String),
}

impl AuthError {
    /// Stable machine-checkable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed => "AUTHENTICATION_FAILED",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::TokenRevoked => "TOKEN_REVOKED",
            Self::UnknownToken => "UNKNOWN_TOKEN",
            Self::MissingRefreshToken => "MISSING_REFRESH_TOKEN",
            Self::EmailAlreadyExists => "EMAIL_ALREADY_EXISTS",
            Self::PersistenceFailed(_) => "PERSISTENCE_FAILED",
            Self::ProviderUnavailable(_) => "PROVIDER_UNAVAILABLE",
            Self::LogoutFailed => "LOGOUT_FAILED",
            Self::AccountCreationFailed(_) => "ACCOUNT_CREATION_FAILED",
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        AuthError::PersistenceFailed(err.to_string())
    }
}
