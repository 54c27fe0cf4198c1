//! Second-factor enrollment handlers.

use axum::Json;
use axum::extract::State;

use agora_core::error::AppError;
use agora_entity::user::User;

use crate::dto::request::{TwoFactorConfirmRequest, TwoFactorDisableRequest};
use crate::dto::response::{MessageResponse, TwoFactorSetupResponse, TwoFactorStatusResponse};
use crate::extractors::{AuthUser, FastAuthUser};
use crate::state::AppState;

use super::validate_body;

/// POST /api/auth/2fa/setup
pub async fn setup(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<TwoFactorSetupResponse>, AppError> {
    let user = load_user(&state, &auth).await?;
    let setup = state.twofactor_service.setup(&user).await?;

    Ok(Json(TwoFactorSetupResponse {
        secret: setup.secret,
        otpauth_uri: setup.otpauth_uri,
        qr_code_base64: setup.qr_code_base64,
        recovery_codes: setup.recovery_codes,
    }))
}

/// POST /api/auth/2fa/confirm
pub async fn confirm(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<TwoFactorConfirmRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    validate_body(&req)?;

    let user = load_user(&state, &auth).await?;
    state.twofactor_service.confirm(&user, &req.code).await?;

    Ok(Json(MessageResponse::new("Second factor enabled")))
}

/// POST /api/auth/2fa/disable
pub async fn disable(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<TwoFactorDisableRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let user = load_user(&state, &auth).await?;
    state
        .twofactor_service
        .disable(&user, req.password.as_deref(), req.code.as_deref())
        .await?;

    Ok(Json(MessageResponse::new("Second factor disabled")))
}

/// GET /api/auth/2fa/status
///
/// Read-only status; skips the session cross-check for latency.
pub async fn status(
    State(state): State<AppState>,
    auth: FastAuthUser,
) -> Result<Json<TwoFactorStatusResponse>, AppError> {
    let user = state
        .user_repo
        .find_by_id(auth.user_id)
        .await?
        .ok_or_else(AppError::session_invalid)?;
    let status = state.twofactor_service.status(&user);

    Ok(Json(TwoFactorStatusResponse {
        enabled: status.enabled,
        pending_confirmation: status.pending_confirmation,
        recovery_codes_remaining: status.recovery_codes_remaining,
    }))
}

async fn load_user(state: &AppState, auth: &AuthUser) -> Result<User, AppError> {
    state
        .user_repo
        .find_by_id(auth.user_id)
        .await?
        .ok_or_else(AppError::session_invalid)
}
