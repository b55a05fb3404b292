//! Collaborator traits consumed by [`SessionManager`](super::SessionManager).
//!
//! Production implementations live in `ecom-identity` (GoTrue HTTP client)
//! and `ecom-db` (Postgres ledger and user store). All traits are object
//! safe so they can be held as `Arc<dyn _>` and injected at startup.

use async_trait::async_trait;
use serde::Serialize;

use crate::types::{DbId, OwnerId, Timestamp};

// ---------------------------------------------------------------------------
// Values exchanged with the collaborators
// ---------------------------------------------------------------------------

/// Token pair issued by the identity provider on login or refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub owner_id: OwnerId,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: Timestamp,
}

/// The account an access token belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub owner_id: OwnerId,
    pub email: Option<String>,
}

/// Profile fields attached to a new provider account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountMetadata {
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub role: String,
}

/// A session ledger row. The refresh token itself is not carried back out
/// of the ledger; lookups are by exact token value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub id: DbId,
    pub owner_id: OwnerId,
    pub revoked: bool,
    pub expires_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Input for [`SessionLedger::insert`]. New records are never revoked.
#[derive(Debug, Clone)]
pub struct NewSessionRecord {
    pub owner_id: OwnerId,
    pub refresh_token: String,
    pub expires_at: Timestamp,
}

impl NewSessionRecord {
    pub fn from_grant(grant: &TokenGrant) -> Self {
        Self {
            owner_id: grant.owner_id,
            refresh_token: grant.refresh_token.clone(),
            expires_at: grant.expires_at,
        }
    }
}

/// Local mirror of a provider account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUserProfile {
    pub auth_id: OwnerId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub role: String,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure reported by a [`CredentialProvider`].
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The provider answered and refused the request.
    #[error("Provider rejected the request ({status}): {message}")]
    Rejected {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// Account creation for an identity the provider already knows.
    #[error("Account already exists at the provider")]
    AlreadyExists,

    /// Transport failure, timeout, or a 5xx from the provider.
    #[error("Provider unavailable: {0}")]
    Unavailable(String),
}

/// Failure reported by a [`SessionLedger`] or [`UserStore`].
#[derive(Debug, thiserror::Error)]
#[error("Storage error: {0}")]
pub struct StoreError(#[source] Box<dyn std::error::Error + Send + Sync>);

impl StoreError {
    pub fn new(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self(source.into())
    }
}

/// Failure reported by a [`SignupNotifier`]. Only ever logged.
pub type NotifyError = Box<dyn std::error::Error + Send + Sync>;

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// External identity service issuing and validating credentials.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Password-grant token exchange.
    async fn token_by_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<TokenGrant, ProviderError>;

    /// Resolve the principal behind an access token.
    async fn validate(&self, access_token: &str) -> Result<Principal, ProviderError>;

    /// Exchange a refresh token for a new pair.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, ProviderError>;

    /// End the provider session behind an access token.
    async fn invalidate(&self, access_token: &str) -> Result<(), ProviderError>;

    async fn create_account(
        &self,
        email: &str,
        password: &str,
        metadata: &AccountMetadata,
    ) -> Result<OwnerId, ProviderError>;

    /// Administrative deletion using a service-level credential.
    async fn admin_delete_account(&self, owner_id: OwnerId) -> Result<(), ProviderError>;

    /// Send a password recovery link to `email`.
    async fn send_password_recovery(&self, email: &str) -> Result<(), ProviderError>;

    /// Set a new password for the account behind `access_token`.
    async fn update_password(
        &self,
        access_token: &str,
        new_password: &str,
    ) -> Result<(), ProviderError>;
}

/// Local record of every issued refresh token.
#[async_trait]
pub trait SessionLedger: Send + Sync {
    async fn insert(&self, record: NewSessionRecord) -> Result<SessionRecord, StoreError>;

    /// Exact-match lookup, including revoked records.
    async fn find_by_refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<Option<SessionRecord>, StoreError>;

    /// Conditionally flip `revoked` from `false` to `true`.
    ///
    /// Returns `true` only for the caller whose update took effect; `false`
    /// means the record was already revoked. The write must be visible to
    /// every later [`find_by_refresh_token`](Self::find_by_refresh_token).
    async fn mark_revoked(&self, id: DbId) -> Result<bool, StoreError>;

    /// Revoke every non-revoked record for `owner_id`, returning how many flipped.
    async fn revoke_all_for_owner(&self, owner_id: OwnerId) -> Result<u64, StoreError>;
}

/// Local user profile table.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError>;

    async fn insert(&self, profile: &NewUserProfile) -> Result<(), StoreError>;
}

/// Downstream notification after a successful signup (welcome / verification mail).
#[async_trait]
pub trait SignupNotifier: Send + Sync {
    async fn account_created(&self, profile: &NewUserProfile) -> Result<(), NotifyError>;
}
