//! Postgres-backed implementations of the session manager's storage ports.

use async_trait::async_trait;
use ecom_core::auth::ports::{
    NewSessionRecord, NewUserProfile, SessionLedger, SessionRecord, StoreError, UserStore,
};
use ecom_core::types::{DbId, OwnerId};
use sha2::{Digest, Sha256};

use crate::models::session::CreateUserToken;
use crate::models::user::CreateUser;
use crate::repositories::{SessionRepo, UserRepo};
use crate::DbPool;

/// Compute the SHA-256 hex digest of a refresh token for storage and lookup.
pub fn hash_refresh_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// [`SessionLedger`] over the `user_tokens` table.
///
/// Tokens never reach the database in clear; every lookup hashes first.
#[derive(Clone)]
pub struct PgSessionLedger {
    pool: DbPool,
}

impl PgSessionLedger {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionLedger for PgSessionLedger {
    async fn insert(&self, record: NewSessionRecord) -> Result<SessionRecord, StoreError> {
        let input = CreateUserToken {
            user_id: record.owner_id,
            refresh_token_hash: hash_refresh_token(&record.refresh_token),
            expires_at: record.expires_at,
        };
        let row = SessionRepo::create(&self.pool, &input)
            .await
            .map_err(StoreError::new)?;
        Ok(row.into())
    }

    async fn find_by_refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<Option<SessionRecord>, StoreError> {
        let row = SessionRepo::find_by_refresh_token_hash(&self.pool, &hash_refresh_token(refresh_token))
            .await
            .map_err(StoreError::new)?;
        Ok(row.map(Into::into))
    }

    async fn mark_revoked(&self, id: DbId) -> Result<bool, StoreError> {
        SessionRepo::revoke(&self.pool, id)
            .await
            .map_err(StoreError::new)
    }

    async fn revoke_all_for_owner(&self, owner_id: OwnerId) -> Result<u64, StoreError> {
        SessionRepo::revoke_all_for_user(&self.pool, owner_id)
            .await
            .map_err(StoreError::new)
    }
}

/// [`UserStore`] over the `users` table.
#[derive(Clone)]
pub struct PgUserStore {
    pool: DbPool,
}

impl PgUserStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        UserRepo::exists_by_email(&self.pool, email)
            .await
            .map_err(StoreError::new)
    }

    async fn insert(&self, profile: &NewUserProfile) -> Result<(), StoreError> {
        UserRepo::create(&self.pool, &CreateUser::from(profile))
            .await
            .map_err(StoreError::new)?;
        Ok(())
    }
}
