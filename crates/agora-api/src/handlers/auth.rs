//! Auth handlers — register, login, logout, refresh, me.

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use agora_auth::session::LoginGrant;
use agora_core::error::AppError;

use crate::cookies::{
    REFRESH_COOKIE, SESSION_COOKIE, clear_auth_cookies, extract_cookie, set_auth_cookies,
};
use crate::dto::request::{LoginRequest, RegisterRequest};
use crate::dto::response::{MessageResponse, UserResponse};
use crate::extractors::{AuthUser, device_meta_from_headers};
use crate::state::AppState;

use super::validate_body;

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    validate_body(&req)?;

    let user = state
        .user_service
        .register(&req.email, &req.password, req.display_name.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// POST /api/auth/login
///
/// On success the three credential cookies are set and a sanitized
/// profile is returned. A pending second factor surfaces as its own
/// status with no cookies set.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> Result<(HeaderMap, Json<UserResponse>), AppError> {
    validate_body(&req)?;

    let device = device_meta_from_headers(&headers);

    let user = state
        .identity_resolver
        .resolve_password(&req.email, &req.password, req.totp_code.as_deref())
        .await?;

    let grant = state.session_manager.open(&user, &device).await?;

    let _ = state
        .user_repo
        .update_last_login(user.id, chrono::Utc::now())
        .await;

    let mut out = HeaderMap::new();
    apply_grant_cookies(&state, &mut out, &grant);

    Ok((out, Json(UserResponse::from(&user))))
}

/// POST /api/auth/logout
///
/// Revokes the session identified by the session cookie (with its
/// credential cascade) and clears all three cookies. Clearing happens
/// even when no valid session was found.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<(HeaderMap, Json<MessageResponse>), AppError> {
    if let Some(session_token) = extract_cookie(&headers, SESSION_COOKIE) {
        state.session_manager.revoke(&session_token, "logout").await?;
    }

    let mut out = HeaderMap::new();
    clear_auth_cookies(&mut out, state.config.server.cookie_secure);

    Ok((out, Json(MessageResponse::new("Logged out"))))
}

/// POST /api/auth/refresh
///
/// Rotation from the refresh cookie alone. Success replaces all three
/// cookies; any failure clears them and tells the caller only to
/// re-authenticate.
pub async fn refresh(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let device = device_meta_from_headers(&headers);

    let Some(refresh_token) = extract_cookie(&headers, REFRESH_COOKIE) else {
        return refresh_failure(&state, AppError::session_invalid());
    };

    let rotation = match state.refresh_manager.rotate(&refresh_token, &device).await {
        Ok(rotation) => rotation,
        Err(e) => return refresh_failure(&state, e),
    };

    let mut out = HeaderMap::new();
    let secure = state.config.server.cookie_secure;
    let access_ttl = state.config.auth.jwt_access_ttl_minutes as i64 * 60;
    let refresh_ttl = state.config.auth.jwt_refresh_ttl_hours as i64 * 3600;
    let session_ttl = state.config.session.lifetime_hours as i64 * 3600;

    set_auth_cookies(
        &mut out,
        &rotation.access_token,
        access_ttl,
        &rotation.refresh_token,
        refresh_ttl,
        // The session itself survives rotation; re-issue its cookie
        // unchanged when the client still carries it.
        &extract_cookie(&headers, SESSION_COOKIE).unwrap_or_default(),
        session_ttl,
        secure,
    );

    (out, Json(MessageResponse::new("Credentials rotated"))).into_response()
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<UserResponse>, AppError> {
    let user = state
        .user_repo
        .find_by_id(auth.user_id)
        .await?
        .ok_or_else(AppError::session_invalid)?;

    Ok(Json(UserResponse::from(&user)))
}

/// Applies the full cookie set for a fresh login grant.
pub(crate) fn apply_grant_cookies(state: &AppState, headers: &mut HeaderMap, grant: &LoginGrant) {
    let secure = state.config.server.cookie_secure;
    let access_ttl = state.config.auth.jwt_access_ttl_minutes as i64 * 60;
    let refresh_ttl = state.config.auth.jwt_refresh_ttl_hours as i64 * 3600;
    let session_ttl = state.config.session.lifetime_hours as i64 * 3600;

    set_auth_cookies(
        headers,
        &grant.access_token,
        access_ttl,
        &grant.refresh_token,
        refresh_ttl,
        &grant.session_token,
        session_ttl,
        secure,
    );
}

/// A failed refresh clears all three cookies alongside the error body.
fn refresh_failure(state: &AppState, err: AppError) -> Response {
    let mut out = HeaderMap::new();
    clear_auth_cookies(&mut out, state.config.server.cookie_secure);
    (out, err).into_response()
}
