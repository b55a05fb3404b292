//! Repository for the `user_tokens` table.

use sqlx::PgPool;
use ecom_core::types::{DbId, OwnerId};

use crate::models::session::{CreateUserToken, UserToken};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, refresh_token_hash, is_revoked, expires_at, \
                        created_at, updated_at, del_flg";

/// Provides ledger operations over issued refresh tokens.
pub struct SessionRepo;

impl SessionRepo {
    /// Insert a new, non-revoked token record, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateUserToken) -> Result<UserToken, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_tokens (user_id, refresh_token_hash, expires_at)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserToken>(&query)
            .bind(input.user_id)
            .bind(&input.refresh_token_hash)
            .bind(input.expires_at)
            .fetch_one(pool)
            .await
    }

    /// Find a record by its refresh token hash.
    ///
    /// Revoked and expired records are returned too; the caller decides what
    /// a revoked record means. Soft-deleted rows are excluded.
    pub async fn find_by_refresh_token_hash(
        pool: &PgPool,
        hash: &str,
    ) -> Result<Option<UserToken>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM user_tokens
             WHERE refresh_token_hash = $1
               AND del_flg = false"
        );
        sqlx::query_as::<_, UserToken>(&query)
            .bind(hash)
            .fetch_optional(pool)
            .await
    }

    /// Revoke a single record. Returns `true` only if this call flipped it.
    pub async fn revoke(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE user_tokens SET is_revoked = true, updated_at = NOW()
             WHERE id = $1 AND is_revoked = false",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Revoke all live records for a user. Returns the count of revoked rows.
    pub async fn revoke_all_for_user(pool: &PgPool, user_id: OwnerId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE user_tokens SET is_revoked = true, updated_at = NOW()
             WHERE user_id = $1 AND is_revoked = false AND del_flg = false",
        )
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Delete records that have expired, or were revoked more than
    /// `revoked_retention_hours` ago. Returns the count of deleted rows.
    pub async fn purge_stale(pool: &PgPool, revoked_retention_hours: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM user_tokens
             WHERE expires_at < NOW()
                OR (is_revoked = true AND updated_at < NOW() - make_interval(hours => $1::int))",
        )
        .bind(revoked_retention_hours)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
