//! The authentication gate.
//!
//! A request moves from *unauthenticated* to *authenticated* only by
//! passing every step: credential present → signature and expiry valid →
//! session cross-check → account still active. Any failure anywhere
//! leaves the request unauthenticated; protected endpoints turn that into
//! a rejection, optional endpoints proceed anonymously.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;

use agora_auth::fingerprint::DeviceMeta;
use agora_core::error::AppError;
use agora_service::context::RequestContext;

use crate::cookies::{ACCESS_COOKIE, SESSION_COOKIE, extract_cookie};
use crate::state::AppState;

/// Extracted authenticated user context, with the session cross-check.
///
/// This is the default gate: the credential's signature and expiry are
/// verified, then the bound session is validated against the presented
/// credential hash — revocation takes effect immediately, not at token
/// expiry.
#[derive(Debug, Clone)]
pub struct AuthUser(pub RequestContext);

impl std::ops::Deref for AuthUser {
    type Target = RequestContext;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let access_token = extract_cookie(&parts.headers, ACCESS_COOKIE)
            .ok_or_else(AppError::session_invalid)?;
        let session_token = extract_cookie(&parts.headers, SESSION_COOKIE)
            .ok_or_else(AppError::session_invalid)?;

        let claims = state.jwt_decoder.decode_access(&access_token)?;

        // Cross-check against the session record: active, unexpired, and
        // bound to exactly this credential.
        let session = state
            .session_manager
            .validate(&session_token, &access_token)
            .await?
            .ok_or_else(AppError::session_invalid)?;

        if session.id != claims.session_id() || session.user_id != claims.user_id() {
            return Err(AppError::session_invalid());
        }

        let user = state
            .user_repo
            .find_by_id(claims.user_id())
            .await?
            .ok_or_else(AppError::session_invalid)?;

        if !user.is_active {
            return Err(AppError::account_disabled());
        }

        Ok(AuthUser(context_from_claims(&parts.headers, &claims)))
    }
}

/// Authenticated user context without the session cross-check.
///
/// A per-endpoint latency opt-out: signature, expiry, and account state
/// only. Revocation is then bounded by the access credential's TTL.
#[derive(Debug, Clone)]
pub struct FastAuthUser(pub RequestContext);

impl std::ops::Deref for FastAuthUser {
    type Target = RequestContext;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<AppState> for FastAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let access_token = extract_cookie(&parts.headers, ACCESS_COOKIE)
            .ok_or_else(AppError::session_invalid)?;

        let claims = state.jwt_decoder.decode_access(&access_token)?;

        let user = state
            .user_repo
            .find_by_id(claims.user_id())
            .await?
            .ok_or_else(AppError::session_invalid)?;

        if !user.is_active {
            return Err(AppError::account_disabled());
        }

        Ok(FastAuthUser(context_from_claims(&parts.headers, &claims)))
    }
}

/// Optional authentication: `None` instead of a rejection.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<RequestContext>);

impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match AuthUser::from_request_parts(parts, state).await {
            Ok(AuthUser(ctx)) => Ok(MaybeAuthUser(Some(ctx))),
            Err(_) => Ok(MaybeAuthUser(None)),
        }
    }
}

fn context_from_claims(
    headers: &HeaderMap,
    claims: &agora_auth::jwt::Claims,
) -> RequestContext {
    let device = device_meta_from_headers(headers);
    RequestContext::new(
        claims.user_id(),
        claims.session_id(),
        claims.tier,
        claims.email.clone(),
        device.ip_address,
        device.user_agent,
    )
}

/// Derive device metadata from request headers.
///
/// Takes the first hop of X-Forwarded-For; a missing header means the
/// service sits in front of no proxy and the peer address is unavailable
/// at this layer.
pub fn device_meta_from_headers(headers: &HeaderMap) -> DeviceMeta {
    let ip_address = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string());

    let user_agent = headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    DeviceMeta::new(ip_address, user_agent)
}
