//! Password reset handlers — the three-step exchange.

use axum::Json;
use axum::extract::State;

use agora_core::error::AppError;

use crate::dto::request::{ResetCommitRequest, ResetRequestRequest, ResetVerifyRequest};
use crate::dto::response::{MessageResponse, ResetVerifyResponse};
use crate::state::AppState;

use super::validate_body;

/// POST /api/auth/password-reset/request
///
/// Always answers success; the response must not reveal whether the email
/// belongs to an account.
pub async fn request_code(
    State(state): State<AppState>,
    Json(req): Json<ResetRequestRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    validate_body(&req)?;

    state.reset_service.issue(&req.email).await?;

    Ok(Json(MessageResponse::new(
        "If the email exists, a reset code has been sent",
    )))
}

/// POST /api/auth/password-reset/verify
pub async fn verify_code(
    State(state): State<AppState>,
    Json(req): Json<ResetVerifyRequest>,
) -> Result<Json<ResetVerifyResponse>, AppError> {
    validate_body(&req)?;

    state.reset_service.verify(&req.email, &req.code).await?;

    Ok(Json(ResetVerifyResponse { verified: true }))
}

/// POST /api/auth/password-reset/commit
///
/// Requires the code to have passed verification. On success every
/// session and rotation credential of the account is revoked.
pub async fn commit_reset(
    State(state): State<AppState>,
    Json(req): Json<ResetCommitRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    validate_body(&req)?;

    state
        .reset_service
        .commit(&req.email, &req.code, &req.new_password)
        .await?;

    Ok(Json(MessageResponse::new("Password has been reset")))
}
