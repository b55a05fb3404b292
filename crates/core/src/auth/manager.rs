//! The session lifecycle manager.
//!
//! [`SessionManager`] owns no mutable state of its own. Every transition is
//! a short sequence of provider and ledger calls, each bounded by
//! [`SessionSettings::call_timeout`]. The ordering inside
//! [`refresh_session`](SessionManager::refresh_session) is what makes a
//! refresh token single use: the ledger record is revoked before the
//! provider is asked for a successor, so a replayed or racing token fails
//! closed.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use super::error::AuthError;
use super::ports::{
    AccountMetadata, CredentialProvider, NewSessionRecord, NewUserProfile, Principal,
    ProviderError, SessionLedger, SignupNotifier, StoreError, TokenGrant, UserStore,
};
use crate::roles::DEFAULT_ROLE;
use crate::types::{OwnerId, Timestamp};

/// Default bound on a single provider or ledger call.
const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Tunables for [`SessionManager`].
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Upper bound on each provider / ledger round trip.
    pub call_timeout: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

/// Credentials handed back after login or refresh.
///
/// The HTTP layer puts `refresh_token` in an HTTP-only cookie and only
/// returns `access_token` and `expires_at` in the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: Timestamp,
}

impl From<TokenGrant> for Session {
    fn from(grant: TokenGrant) -> Self {
        Self {
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
            expires_at: grant.expires_at,
        }
    }
}

/// Signup input after request validation.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub phone_number: String,
    /// Falls back to [`DEFAULT_ROLE`] when absent.
    pub role: Option<String>,
}

/// Coordinates credential issuance, rotation and revocation between the
/// identity provider and the local session ledger.
pub struct SessionManager {
    provider: Arc<dyn CredentialProvider>,
    ledger: Arc<dyn SessionLedger>,
    users: Arc<dyn UserStore>,
    notifier: Arc<dyn SignupNotifier>,
    settings: SessionSettings,
}

impl SessionManager {
    pub fn new(
        provider: Arc<dyn CredentialProvider>,
        ledger: Arc<dyn SessionLedger>,
        users: Arc<dyn UserStore>,
        notifier: Arc<dyn SignupNotifier>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            provider,
            ledger,
            users,
            notifier,
            settings,
        }
    }

    /// Password login. Records the issued refresh token in the ledger.
    ///
    /// If the ledger insert fails the just-issued provider session is
    /// invalidated (best effort) and [`AuthError::PersistenceFailed`] is
    /// returned.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let grant = self
            .provider_call(self.provider.token_by_password(email, password))
            .await
            .map_err(|e| provider_failure(e, AuthError::AuthenticationFailed))?;

        let owner_id = grant.owner_id;
        if let Err(err) = self
            .store_call(self.ledger.insert(NewSessionRecord::from_grant(&grant)))
            .await
        {
            tracing::error!(%owner_id, error = %err, "Failed to record session, invalidating issued token");
            if let Err(cleanup) = self
                .provider_call(self.provider.invalidate(&grant.access_token))
                .await
            {
                tracing::warn!(%owner_id, error = %cleanup, "Compensating provider logout failed");
            }
            return Err(err.into());
        }

        tracing::info!(%owner_id, "Session established");
        Ok(grant.into())
    }

    /// Check an access token with the provider. The `Bearer ` prefix must
    /// already be stripped.
    pub async fn validate_access_token(&self, access_token: &str) -> Result<Principal, AuthError> {
        if access_token.is_empty() {
            return Err(AuthError::InvalidToken);
        }
        self.provider_call(self.provider.validate(access_token))
            .await
            .map_err(|e| provider_failure(e, AuthError::InvalidToken))
    }

    /// Rotate a refresh token.
    ///
    /// 1. empty token -> [`AuthError::MissingRefreshToken`]
    /// 2. not in the ledger -> [`AuthError::UnknownToken`]
    /// 3. already revoked -> [`AuthError::TokenRevoked`]
    /// 4. revoke the record; a write error or a lost race fails here and the
    ///    provider is never contacted
    /// 5. provider exchange -> [`AuthError::AuthenticationFailed`] on rejection
    /// 6. record the successor token
    pub async fn refresh_session(&self, refresh_token: &str) -> Result<Session, AuthError> {
        if refresh_token.is_empty() {
            return Err(AuthError::MissingRefreshToken);
        }

        let record = self
            .store_call(self.ledger.find_by_refresh_token(refresh_token))
            .await?
            .ok_or(AuthError::UnknownToken)?;

        if record.revoked {
            tracing::warn!(session_id = %record.id, owner_id = %record.owner_id, "Rejected reuse of a revoked refresh token");
            return Err(AuthError::TokenRevoked);
        }

        let claimed = self.store_call(self.ledger.mark_revoked(record.id)).await?;
        if !claimed {
            tracing::warn!(session_id = %record.id, owner_id = %record.owner_id, "Refresh token revoked concurrently");
            return Err(AuthError::TokenRevoked);
        }

        let grant = self
            .provider_call(self.provider.refresh(refresh_token))
            .await
            .map_err(|e| provider_failure(e, AuthError::AuthenticationFailed))?;

        if grant.refresh_token == refresh_token {
            tracing::error!(owner_id = %grant.owner_id, "Provider returned the presented refresh token unchanged");
            return Err(AuthError::AuthenticationFailed);
        }

        self.store_call(self.ledger.insert(NewSessionRecord::from_grant(&grant)))
            .await?;

        tracing::info!(previous_session_id = %record.id, owner_id = %grant.owner_id, "Session rotated");
        Ok(grant.into())
    }

    /// End the session behind `access_token`.
    ///
    /// Validates first, then revokes every live ledger record of the
    /// principal, then invalidates the provider session. The provider call
    /// is made even if the ledger revocation failed; the first failure is
    /// returned.
    pub async fn logout(&self, access_token: &str) -> Result<(), AuthError> {
        let principal = self.validate_access_token(access_token).await?;
        let owner_id = principal.owner_id;

        let revoked = self
            .store_call(self.ledger.revoke_all_for_owner(owner_id))
            .await;
        match &revoked {
            Ok(count) => tracing::info!(%owner_id, revoked = count, "Revoked sessions on logout"),
            Err(err) => tracing::error!(%owner_id, error = %err, "Failed to revoke sessions on logout"),
        }

        let invalidated = self
            .provider_call(self.provider.invalidate(access_token))
            .await;
        if let Err(err) = &invalidated {
            tracing::error!(%owner_id, error = %err, "Provider logout failed");
        }

        revoked?;
        invalidated.map_err(|e| provider_failure(e, AuthError::LogoutFailed))
    }

    /// Create a provider account and its local profile.
    ///
    /// The two writes are not transactional: when the local insert fails the
    /// provider account is deleted (best effort, at most once) before
    /// [`AuthError::PersistenceFailed`] is returned. On success the signup
    /// notifier runs on a detached task.
    pub async fn signup(&self, account: NewAccount) -> Result<OwnerId, AuthError> {
        if self
            .store_call(self.users.exists_by_email(&account.email))
            .await?
        {
            return Err(AuthError::EmailAlreadyExists);
        }

        let role = account.role.unwrap_or_else(|| DEFAULT_ROLE.to_string());
        let metadata = AccountMetadata {
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            phone_number: account.phone_number.clone(),
            role: role.clone(),
        };

        let owner_id = self
            .provider_call(
                self.provider
                    .create_account(&account.email, &account.password, &metadata),
            )
            .await
            .map_err(|e| match e {
                ProviderError::AlreadyExists => AuthError::EmailAlreadyExists,
                ProviderError::Rejected { message, .. } => AuthError::AccountCreationFailed(message),
                ProviderError::Unavailable(msg) => AuthError::ProviderUnavailable(msg),
            })?;

        let profile = NewUserProfile {
            auth_id: owner_id,
            email: account.email,
            first_name: account.first_name,
            last_name: account.last_name,
            phone_number: account.phone_number,
            role,
        };

        if let Err(err) = self.store_call(self.users.insert(&profile)).await {
            tracing::error!(%owner_id, error = %err, "Failed to persist user profile, deleting provider account");
            match self
                .provider_call(self.provider.admin_delete_account(owner_id))
                .await
            {
                Ok(()) => tracing::info!(%owner_id, "Deleted orphaned provider account"),
                Err(cleanup) => {
                    tracing::error!(%owner_id, error = %cleanup, "Compensating account deletion failed")
                }
            }
            return Err(err.into());
        }

        tracing::info!(%owner_id, role = %profile.role, "Account created");

        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            if let Err(err) = notifier.account_created(&profile).await {
                tracing::warn!(owner_id = %profile.auth_id, error = %err, "Signup notification failed");
            }
        });

        Ok(owner_id)
    }

    /// Ask the provider to mail a recovery link.
    pub async fn request_password_recovery(&self, email: &str) -> Result<(), AuthError> {
        self.provider_call(self.provider.send_password_recovery(email))
            .await
            .map_err(|e| provider_failure(e, AuthError::AuthenticationFailed))
    }

    /// Set a new password using the access token from a recovery link.
    ///
    /// All ledger records of the principal are revoked afterwards so refresh
    /// tokens issued before the reset cannot be exchanged.
    pub async fn reset_password(
        &self,
        access_token: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let principal = self.validate_access_token(access_token).await?;
        let owner_id = principal.owner_id;

        self.provider_call(self.provider.update_password(access_token, new_password))
            .await
            .map_err(|e| provider_failure(e, AuthError::AuthenticationFailed))?;

        let revoked = self
            .store_call(self.ledger.revoke_all_for_owner(owner_id))
            .await?;
        tracing::info!(%owner_id, revoked, "Password reset, prior sessions revoked");
        Ok(())
    }

    // ---- private helpers ----

    async fn provider_call<T, F>(&self, call: F) -> Result<T, ProviderError>
    where
        F: Future<Output = Result<T, ProviderError>>,
    {
        match tokio::time::timeout(self.settings.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Unavailable(
                "identity provider call timed out".into(),
            )),
        }
    }

    async fn store_call<T, F>(&self, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.settings.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::new("storage call timed out")),
        }
    }
}

/// Map a provider failure: infrastructure problems stay distinguishable,
/// refusals become `rejected`.
fn provider_failure(err: ProviderError, rejected: AuthError) -> AuthError {
    match err {
        ProviderError::Unavailable(msg) => AuthError::ProviderUnavailable(msg),
        ProviderError::Rejected { .. } | ProviderError::AlreadyExists => rejected,
    }
}
