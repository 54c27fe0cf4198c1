//! Session listing and revocation handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use uuid::Uuid;

use agora_core::error::AppError;

use crate::cookies::clear_auth_cookies;
use crate::dto::response::{CountResponse, MessageResponse, SessionResponse};
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/sessions
pub async fn list_sessions(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<SessionResponse>>, AppError> {
    let sessions = state.session_manager.list_for_user(auth.user_id).await?;

    Ok(Json(
        sessions
            .iter()
            .map(|s| SessionResponse::from_session(s, auth.session_id))
            .collect(),
    ))
}

/// DELETE /api/sessions/{id}
///
/// Revokes one of the caller's own sessions. Revoking the current one
/// also clears the caller's cookies.
pub async fn revoke_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(session_id): Path<Uuid>,
) -> Result<(HeaderMap, Json<MessageResponse>), AppError> {
    let session = state
        .session_manager
        .find_by_id(session_id)
        .await?
        .filter(|s| s.user_id == auth.user_id)
        .ok_or_else(|| AppError::not_found("Session not found"))?;

    state
        .session_manager
        .revoke_by_id(session.id, "revoked by user")
        .await?;

    let mut out = HeaderMap::new();
    if session.id == auth.session_id {
        clear_auth_cookies(&mut out, state.config.server.cookie_secure);
    }

    Ok((out, Json(MessageResponse::new("Session revoked"))))
}

/// DELETE /api/sessions
///
/// Revokes every session of the caller — including the current one, so
/// the caller's own cookies are cleared as well.
pub async fn revoke_all_sessions(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<(HeaderMap, Json<CountResponse>), AppError> {
    let count = state
        .session_manager
        .revoke_all(auth.user_id, "revoked all by user")
        .await?;

    let mut out = HeaderMap::new();
    clear_auth_cookies(&mut out, state.config.server.cookie_secure);

    Ok((out, Json(CountResponse { count })))
}
