pub mod auth;
pub mod health;
pub mod pages;

use axum::Router;

use crate::state::AppState;

/// The JSON API. `/health` and the `/reset-password` page are merged at the
/// root by [`build_app_router`](crate::router::build_app_router).
///
/// Route hierarchy:
///
/// ```text
/// /auth
///     POST /login             login
///     POST /refresh           rotate refresh cookie
///     GET  /validate          check bearer token
///     POST /logout            end session, clear cookie
///     POST /signup            create account
///     POST /forgot-password   mail recovery link
///     POST /reset-password    set new password from recovery link
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/auth", auth::router())
}
