//! External identity login handlers.
//!
//! The two-step protocol: `authorize` hands out the provider redirect URL
//! with opaque correlation state (also pinned in a short-lived cookie);
//! `callback` verifies the state echo, resolves the code into a profile,
//! and completes login through the identity resolver.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::HeaderMap;

use agora_auth::token::generate_opaque_token;
use agora_core::error::AppError;

use crate::cookies::{
    OAUTH_STATE_COOKIE, clear_oauth_state_cookie, extract_cookie, set_oauth_state_cookie,
};
use crate::dto::request::OAuthCallbackRequest;
use crate::dto::response::{OAuthAuthorizeResponse, UserResponse};
use crate::extractors::device_meta_from_headers;
use crate::handlers::auth::apply_grant_cookies;
use crate::state::AppState;

use super::validate_body;

/// GET /api/auth/oauth/{provider}/authorize
pub async fn authorize(
    State(state): State<AppState>,
    Path(provider_name): Path<String>,
) -> Result<(HeaderMap, Json<OAuthAuthorizeResponse>), AppError> {
    let provider = state
        .oauth_providers
        .get(&provider_name)
        .ok_or_else(|| AppError::not_found("Unknown identity provider"))?;

    let correlation_state = generate_opaque_token();
    let redirect_url = provider.authorize_url(&correlation_state)?;

    let mut out = HeaderMap::new();
    set_oauth_state_cookie(
        &mut out,
        &correlation_state,
        state.config.server.cookie_secure,
    );

    Ok((out, Json(OAuthAuthorizeResponse { redirect_url })))
}

/// POST /api/auth/oauth/{provider}/callback
pub async fn callback(
    State(state): State<AppState>,
    Path(provider_name): Path<String>,
    headers: HeaderMap,
    Json(req): Json<OAuthCallbackRequest>,
) -> Result<(HeaderMap, Json<UserResponse>), AppError> {
    validate_body(&req)?;

    let provider = state
        .oauth_providers
        .get(&provider_name)
        .ok_or_else(|| AppError::not_found("Unknown identity provider"))?;

    let stored_state = extract_cookie(&headers, OAUTH_STATE_COOKIE)
        .ok_or_else(|| AppError::validation("Missing login correlation state"))?;
    if stored_state != req.state {
        return Err(AppError::validation("Login correlation state mismatch"));
    }

    let profile = provider.resolve_callback(&req.code).await?;

    let user = state
        .identity_resolver
        .resolve_external(&profile, req.totp_code.as_deref())
        .await?;

    let device = device_meta_from_headers(&headers);
    let grant = state.session_manager.open(&user, &device).await?;

    let _ = state
        .user_repo
        .update_last_login(user.id, chrono::Utc::now())
        .await;

    let mut out = HeaderMap::new();
    clear_oauth_state_cookie(&mut out, state.config.server.cookie_secure);
    apply_grant_cookies(&state, &mut out, &grant);

    Ok((out, Json(UserResponse::from(&user))))
}
