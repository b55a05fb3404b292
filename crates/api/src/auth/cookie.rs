//! The refresh-token cookie.
//!
//! The refresh token only ever travels in this cookie: `HttpOnly`,
//! `SameSite=Strict`, `Path=/`, `Secure` unless disabled for local
//! development, expiring with the session.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use ecom_core::types::Timestamp;
use time::OffsetDateTime;

/// Cookie name carrying the refresh token.
pub const REFRESH_COOKIE: &str = "refresh_token";

/// Build the refresh cookie for a newly issued token.
pub fn refresh_cookie(value: String, expires_at: Timestamp, secure: bool) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE, value))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .path("/")
        .expires(OffsetDateTime::from_unix_timestamp(expires_at.timestamp()).ok())
        .build()
}

/// The refresh token presented by the client, or an empty string.
pub fn read_refresh_token(jar: &CookieJar) -> String {
    jar.get(REFRESH_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .unwrap_or_default()
}

/// Emit an empty, already-expired refresh cookie.
///
/// Added unconditionally so the `Set-Cookie` header is sent even when the
/// request carried no cookie.
pub fn clear_refresh_cookie(jar: CookieJar, secure: bool) -> CookieJar {
    let mut cookie = Cookie::build((REFRESH_COOKIE, ""))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .path("/")
        .build();
    cookie.make_removal();
    jar.add(cookie)
}
