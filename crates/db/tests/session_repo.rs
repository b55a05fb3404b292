//! Integration tests for the `user_tokens` ledger.
//!
//! Require a Postgres instance reachable through `DATABASE_URL`; run with
//! `cargo test -p ecom-db -- --ignored`.

use chrono::{Duration, Utc};
use ecom_core::auth::ports::{NewSessionRecord, SessionLedger};
use ecom_db::models::session::CreateUserToken;
use ecom_db::repositories::SessionRepo;
use ecom_db::{hash_refresh_token, PgSessionLedger};
use sqlx::PgPool;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_record(owner_id: Uuid, token: &str) -> NewSessionRecord {
    NewSessionRecord {
        owner_id,
        refresh_token: token.to_string(),
        expires_at: Utc::now() + Duration::hours(1),
    }
}

// ---------------------------------------------------------------------------
// Ledger behaviour
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_insert_and_lookup_by_exact_token(pool: PgPool) {
    let ledger = PgSessionLedger::new(pool.clone());
    let owner = Uuid::new_v4();

    let created = ledger.insert(new_record(owner, "R1")).await.unwrap();
    assert_eq!(created.owner_id, owner);
    assert!(!created.revoked);

    let found = ledger.find_by_refresh_token("R1").await.unwrap().unwrap();
    assert_eq!(found.id, created.id);

    assert!(ledger.find_by_refresh_token("R1 ").await.unwrap().is_none());
    assert!(ledger.find_by_refresh_token("r1").await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_token_is_stored_hashed(pool: PgPool) {
    let ledger = PgSessionLedger::new(pool.clone());
    ledger.insert(new_record(Uuid::new_v4(), "R1")).await.unwrap();

    let (stored,): (String,) = sqlx::query_as("SELECT refresh_token_hash FROM user_tokens")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(stored, hash_refresh_token("R1"));
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_mark_revoked_flips_once(pool: PgPool) {
    let ledger = PgSessionLedger::new(pool.clone());
    let record = ledger.insert(new_record(Uuid::new_v4(), "R1")).await.unwrap();

    assert!(ledger.mark_revoked(record.id).await.unwrap());
    assert!(!ledger.mark_revoked(record.id).await.unwrap());

    let found = ledger.find_by_refresh_token("R1").await.unwrap().unwrap();
    assert!(found.revoked);
    assert!(found.updated_at >= record.updated_at);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_concurrent_revocations_have_one_winner(pool: PgPool) {
    let ledger = PgSessionLedger::new(pool.clone());
    let record = ledger.insert(new_record(Uuid::new_v4(), "R1")).await.unwrap();

    let (a, b) = tokio::join!(ledger.mark_revoked(record.id), ledger.mark_revoked(record.id));
    assert!(a.unwrap() ^ b.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_revoke_all_for_owner_leaves_others(pool: PgPool) {
    let ledger = PgSessionLedger::new(pool.clone());
    let owner = Uuid::new_v4();
    let other = Uuid::new_v4();
    ledger.insert(new_record(owner, "R1")).await.unwrap();
    ledger.insert(new_record(owner, "R2")).await.unwrap();
    ledger.insert(new_record(other, "R3")).await.unwrap();

    assert_eq!(ledger.revoke_all_for_owner(owner).await.unwrap(), 2);
    assert_eq!(ledger.revoke_all_for_owner(owner).await.unwrap(), 0);

    let untouched = ledger.find_by_refresh_token("R3").await.unwrap().unwrap();
    assert!(!untouched.revoked);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_duplicate_token_is_rejected(pool: PgPool) {
    let ledger = PgSessionLedger::new(pool.clone());
    ledger.insert(new_record(Uuid::new_v4(), "R1")).await.unwrap();

    assert!(ledger.insert(new_record(Uuid::new_v4(), "R1")).await.is_err());
}

// ---------------------------------------------------------------------------
// Housekeeping
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_purge_stale_removes_expired_and_old_revoked(pool: PgPool) {
    let owner = Uuid::new_v4();
    let expired = SessionRepo::create(
        &pool,
        &CreateUserToken {
            user_id: owner,
            refresh_token_hash: hash_refresh_token("expired"),
            expires_at: Utc::now() - Duration::minutes(1),
        },
    )
    .await
    .unwrap();
    let old_revoked = SessionRepo::create(
        &pool,
        &CreateUserToken {
            user_id: owner,
            refresh_token_hash: hash_refresh_token("old-revoked"),
            expires_at: Utc::now() + Duration::hours(1),
        },
    )
    .await
    .unwrap();
    let fresh_revoked = SessionRepo::create(
        &pool,
        &CreateUserToken {
            user_id: owner,
            refresh_token_hash: hash_refresh_token("fresh-revoked"),
            expires_at: Utc::now() + Duration::hours(1),
        },
    )
    .await
    .unwrap();
    let live = SessionRepo::create(
        &pool,
        &CreateUserToken {
            user_id: owner,
            refresh_token_hash: hash_refresh_token("live"),
            expires_at: Utc::now() + Duration::hours(1),
        },
    )
    .await
    .unwrap();

    SessionRepo::revoke(&pool, old_revoked.id).await.unwrap();
    SessionRepo::revoke(&pool, fresh_revoked.id).await.unwrap();
    sqlx::query("UPDATE user_tokens SET updated_at = NOW() - INTERVAL '25 hours' WHERE id = $1")
        .bind(old_revoked.id)
        .execute(&pool)
        .await
        .unwrap();

    let purged = SessionRepo::purge_stale(&pool, 24).await.unwrap();
    assert_eq!(purged, 2);

    let remaining: Vec<Uuid> =
        sqlx::query_scalar("SELECT id FROM user_tokens WHERE user_id = $1")
            .bind(owner)
            .fetch_all(&pool)
            .await
            .unwrap();
    assert!(!remaining.contains(&expired.id));
    assert!(!remaining.contains(&old_revoked.id));
    assert!(remaining.contains(&fresh_revoked.id));
    assert!(remaining.contains(&live.id));
}
