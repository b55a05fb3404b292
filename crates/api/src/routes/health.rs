//! Liveness and readiness reporting.
//!
//! The identity provider is not probed here: it is checked once at startup
//! and its failures already surface per request as `PROVIDER_UNAVAILABLE`.

use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// `ok` when the session ledger is reachable. `degraded` means Postgres did
/// not answer, so login, refresh and logout will fail with
/// `PERSISTENCE_FAILED` while access-token validation still works.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Degraded,
}

impl HealthStatus {
    fn from_ledger(reachable: bool) -> Self {
        if reachable {
            Self::Ok
        } else {
            Self::Degraded
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: &'static str,
    pub db_healthy: bool,
}

/// GET /health
///
/// Always `200`; readiness is read from the body.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = match ecom_db::health_check(&state.pool).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Session ledger unreachable");
            false
        }
    };

    Json(HealthResponse {
        status: HealthStatus::from_ledger(db_healthy),
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
