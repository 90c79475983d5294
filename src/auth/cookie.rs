//! Rendered cookie strings for the refresh credential.
//!
//! The server-side route gate reads a `refreshToken` cookie on every
//! navigation; the credential store mirrors the persisted refresh token
//! into this rendered form whenever it rotates, and expires it on logout.

use chrono::{DateTime, Duration, Utc};

/// Cookie name read by the server-side route gate
pub const REFRESH_COOKIE_NAME: &str = "refreshToken";

/// Cookie lifetime in days, matching the refresh credential's intended lifetime
const MAX_AGE_DAYS: i64 = 30;

/// `Max-Age` value in seconds
const MAX_AGE_SECS: i64 = MAX_AGE_DAYS * 24 * 60 * 60;

/// HTTP-date format for the `Expires` attribute
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Render the mirrored refresh cookie.
///
/// Path-scoped to the whole origin and `SameSite=Strict`, so cross-site
/// requests never carry the credential.
pub fn refresh_cookie(value: &str, now: DateTime<Utc>) -> String {
    let expires = now + Duration::days(MAX_AGE_DAYS);
    format!(
        "{}={}; Path=/; Max-Age={}; Expires={}; SameSite=Strict",
        REFRESH_COOKIE_NAME,
        value,
        MAX_AGE_SECS,
        expires.format(HTTP_DATE_FORMAT)
    )
}

/// Render the removal form of the cookie, used on logout.
pub fn clear_cookie() -> String {
    format!("{}=; Path=/; Max-Age=0; SameSite=Strict", REFRESH_COOKIE_NAME)
}
