//! Route definitions for browser pages served at the root.

use axum::routing::get;
use axum::Router;

use crate::handlers::pages;
use crate::state::AppState;

/// Root-level HTML pages.
pub fn router() -> Router<AppState> {
    Router::new().route("/reset-password", get(pages::reset_password_page))
}
