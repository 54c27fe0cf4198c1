//! Administrative account and session handlers.
//!
//! Compromise-response surface: deactivate an account or cut off all of
//! its sessions. Every handler here sits behind the admin tier gate.

use axum::Json;
use axum::extract::{Path, State};
use uuid::Uuid;

use agora_core::error::AppError;

use crate::dto::request::SetActiveRequest;
use crate::dto::response::{CountResponse, UserResponse};
use crate::extractors::AuthUser;
use crate::middleware::tier::require_admin;
use crate::state::AppState;

/// PUT /api/admin/users/{id}/active
///
/// Flips the account's active flag. The row is retained either way.
/// Deactivation also revokes every session of the account — withdrawn
/// trust takes effect immediately, not at credential expiry.
pub async fn set_user_active(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
    Json(req): Json<SetActiveRequest>,
) -> Result<Json<UserResponse>, AppError> {
    require_admin(&auth)?;

    state
        .user_repo
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    state.user_repo.set_active(user_id, req.active).await?;

    if !req.active {
        state
            .session_manager
            .revoke_all(user_id, "account deactivated")
            .await?;
    }

    let user = state
        .user_repo
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok(Json(UserResponse::from(&user)))
}

/// DELETE /api/admin/users/{id}/sessions
///
/// Administrative revocation of every session of another account, for
/// compromise response.
pub async fn revoke_user_sessions(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<CountResponse>, AppError> {
    require_admin(&auth)?;

    let count = state
        .session_manager
        .revoke_all(user_id, "administrative revocation")
        .await?;

    Ok(Json(CountResponse { count }))
}
