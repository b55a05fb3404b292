//! Session ledger row and insert DTO.

use ecom_core::auth::ports::SessionRecord;
use ecom_core::types::{DbId, OwnerId, Timestamp};
use sqlx::FromRow;

/// A row from the `user_tokens` table.
#[derive(Debug, Clone, FromRow)]
pub struct UserToken {
    pub id: DbId,
    pub user_id: OwnerId,
    pub refresh_token_hash: String,
    pub is_revoked: bool,
    pub expires_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub del_flg: bool,
}

/// DTO for recording a newly issued refresh token.
pub struct CreateUserToken {
    pub user_id: OwnerId,
    pub refresh_token_hash: String,
    pub expires_at: Timestamp,
}

impl From<UserToken> for SessionRecord {
    fn from(row: UserToken) -> Self {
        Self {
            id: row.id,
            owner_id: row.user_id,
            revoked: row.is_revoked,
            expires_at: row.expires_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
