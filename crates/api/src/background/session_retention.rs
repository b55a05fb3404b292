//! Periodic cleanup of the session ledger.
//!
//! Deletes `user_tokens` rows that have expired, or that were revoked and
//! left untouched for longer than the retention window. Runs on a fixed
//! interval using `tokio::time::interval`.

use std::time::Duration;

use ecom_db::repositories::SessionRepo;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

/// Run the session retention loop until `cancel` is triggered.
pub async fn run(
    pool: PgPool,
    interval: Duration,
    revoked_retention_hours: i64,
    cancel: CancellationToken,
) {
    tracing::info!(
        revoked_retention_hours,
        interval_secs = interval.as_secs(),
        "Session retention job started"
    );

    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!("Session retention job stopping");
                break;
            }
            _ = ticker.tick() => {
                match SessionRepo::purge_stale(&pool, revoked_retention_hours).await {
                    Ok(deleted) => {
                        if deleted > 0 {
                            tracing::info!(deleted, "Session retention: purged stale records");
                        } else {
                            tracing::debug!("Session retention: no records to purge");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Session retention: cleanup failed");
                    }
                }
            }
        }
    }
}
