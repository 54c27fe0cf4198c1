//! Auth cookie plumbing.
//!
//! The three credentials ride in separate HttpOnly, SameSite=Lax cookies
//! scoped to the whole origin. Token values never appear in URLs or
//! response bodies; these helpers are the only place they touch the
//! transport.

use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};

/// Cookie name for the short-lived access credential.
pub const ACCESS_COOKIE: &str = "agora_access";

/// Cookie name for the rotation credential.
pub const REFRESH_COOKIE: &str = "agora_refresh";

/// Cookie name for the opaque session token.
pub const SESSION_COOKIE: &str = "agora_session";

/// Cookie name for the external-login correlation state.
pub const OAUTH_STATE_COOKIE: &str = "agora_oauth_state";

/// Max age for the correlation state cookie (10 minutes).
pub const OAUTH_STATE_MAX_AGE: i64 = 600;

/// Build a Set-Cookie value.
fn build_cookie(name: &str, value: &str, max_age_seconds: i64, secure: bool) -> String {
    let secure_flag = if secure { "; Secure" } else { "" };
    format!(
        "{name}={value}; HttpOnly{secure_flag}; SameSite=Lax; Path=/; Max-Age={max_age_seconds}"
    )
}

/// Build a Set-Cookie value that expires a cookie immediately.
fn clear_cookie(name: &str, secure: bool) -> String {
    build_cookie(name, "", 0, secure)
}

fn append(headers: &mut HeaderMap, value: String) {
    if let Ok(value) = HeaderValue::from_str(&value) {
        headers.append(SET_COOKIE, value);
    }
}

/// Set the full credential cookie set after login or refresh.
pub fn set_auth_cookies(
    headers: &mut HeaderMap,
    access_token: &str,
    access_max_age_seconds: i64,
    refresh_token: &str,
    refresh_max_age_seconds: i64,
    session_token: &str,
    session_max_age_seconds: i64,
    secure: bool,
) {
    append(
        headers,
        build_cookie(ACCESS_COOKIE, access_token, access_max_age_seconds, secure),
    );
    append(
        headers,
        build_cookie(REFRESH_COOKIE, refresh_token, refresh_max_age_seconds, secure),
    );
    append(
        headers,
        build_cookie(SESSION_COOKIE, session_token, session_max_age_seconds, secure),
    );
}

/// Clear all three credential cookies.
pub fn clear_auth_cookies(headers: &mut HeaderMap, secure: bool) {
    append(headers, clear_cookie(ACCESS_COOKIE, secure));
    append(headers, clear_cookie(REFRESH_COOKIE, secure));
    append(headers, clear_cookie(SESSION_COOKIE, secure));
}

/// Set the external-login correlation state cookie.
pub fn set_oauth_state_cookie(headers: &mut HeaderMap, state: &str, secure: bool) {
    append(
        headers,
        build_cookie(OAUTH_STATE_COOKIE, state, OAUTH_STATE_MAX_AGE, secure),
    );
}

/// Clear the external-login correlation state cookie.
pub fn clear_oauth_state_cookie(headers: &mut HeaderMap, secure: bool) {
    append(headers, clear_cookie(OAUTH_STATE_COOKIE, secure));
}

/// Extract a cookie value from request headers.
///
/// Parses the Cookie header (format: `name1=value1; name2=value2`).
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookie_header = headers.get(COOKIE)?;
    let cookie_str = cookie_header.to_str().ok()?;

    for part in cookie_str.split(';') {
        let part = part.trim();
        if let Some(value) = part.strip_prefix(name) {
            if let Some(value) = value.strip_prefix('=') {
                if !value.is_empty() {
                    return Some(value.trim().to_string());
                }
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("agora_access=tok-a; agora_session=tok-s"),
        );
        assert_eq!(
            extract_cookie(&headers, ACCESS_COOKIE).as_deref(),
            Some("tok-a")
        );
        assert_eq!(
            extract_cookie(&headers, SESSION_COOKIE).as_deref(),
            Some("tok-s")
        );
        assert_eq!(extract_cookie(&headers, REFRESH_COOKIE), None);
    }

    #[test]
    fn test_empty_cookie_value_is_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("agora_access="));
        assert_eq!(extract_cookie(&headers, ACCESS_COOKIE), None);
    }

    #[test]
    fn test_cookie_attributes() {
        let cookie = build_cookie(ACCESS_COOKIE, "v", 900, true);
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=900"));
    }

    #[test]
    fn test_set_auth_cookies_sets_three() {
        let mut headers = HeaderMap::new();
        set_auth_cookies(&mut headers, "a", 900, "r", 604800, "s", 86400, false);
        assert_eq!(headers.get_all(SET_COOKIE).iter().count(), 3);
    }
}
