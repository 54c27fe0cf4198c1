//! Session lifecycle manager — creation, validation, revocation.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use agora_core::config::session::SessionConfig;
use agora_core::error::AppError;
use agora_database::repositories::session::SessionRepository;
use agora_entity::session::{CreateSession, Session};
use agora_entity::user::User;

use crate::fingerprint::DeviceMeta;
use crate::jwt::JwtEncoder;
use crate::refresh::RefreshManager;
use crate::token::{generate_opaque_token, hash_token, verify_token_hash};

/// Everything issued when a login completes: the session plus the three
/// credentials the transport layer stores. Raw token values exist only in
/// this struct on their way into cookies; the datastore holds digests.
#[derive(Debug, Clone)]
pub struct LoginGrant {
    /// The created session.
    pub session: Session,
    /// Opaque session token.
    pub session_token: String,
    /// Short-lived access credential.
    pub access_token: String,
    /// Access credential expiry.
    pub access_expires_at: chrono::DateTime<Utc>,
    /// Rotation credential.
    pub refresh_token: String,
    /// Rotation credential expiry.
    pub refresh_expires_at: chrono::DateTime<Utc>,
}

/// Manages the session lifecycle.
///
/// A session binds a user to the hash of exactly one currently-valid
/// short-lived credential. Validation is fail-closed; revocation cascades
/// to the session's rotation credentials inside the repository transaction.
#[derive(Clone)]
pub struct SessionManager {
    /// Session persistence.
    session_repo: Arc<SessionRepository>,
    /// Rotation credential lifecycle, for issuance at login.
    refresh_manager: Arc<RefreshManager>,
    /// Credential encoder.
    jwt_encoder: Arc<JwtEncoder>,
    /// Session configuration.
    config: SessionConfig,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("config", &self.config)
            .finish()
    }
}

impl SessionManager {
    /// Creates a new session manager.
    pub fn new(
        session_repo: Arc<SessionRepository>,
        refresh_manager: Arc<RefreshManager>,
        jwt_encoder: Arc<JwtEncoder>,
        config: SessionConfig,
    ) -> Self {
        Self {
            session_repo,
            refresh_manager,
            jwt_encoder,
            config,
        }
    }

    /// Opens a new session for an already-resolved identity and issues the
    /// full credential set.
    ///
    /// The session ID is generated up front so the signed credentials can
    /// carry it before the row exists.
    pub async fn open(&self, user: &User, device: &DeviceMeta) -> Result<LoginGrant, AppError> {
        let session_id = Uuid::new_v4();

        let access = self.jwt_encoder.generate_access(user, session_id)?;
        let session_token = generate_opaque_token();
        let expires_at = Utc::now() + Duration::hours(self.config.lifetime_hours as i64);

        let session = self
            .session_repo
            .create(&CreateSession {
                id: session_id,
                user_id: user.id,
                token_hash: hash_token(&session_token),
                access_token_hash: hash_token(&access.token),
                ip_address: device.ip_address.clone(),
                user_agent: device.user_agent.clone(),
                device_fingerprint: device.fingerprint(),
                expires_at,
            })
            .await?;

        let (refresh_token, refresh_record) =
            self.refresh_manager.issue(user, session_id, device).await?;

        info!(
            user_id = %user.id,
            session_id = %session_id,
            "Session opened"
        );

        Ok(LoginGrant {
            session,
            session_token,
            access_token: access.token,
            access_expires_at: access.expires_at,
            refresh_token,
            refresh_expires_at: refresh_record.expires_at,
        })
    }

    /// Validates a session against a presented short-lived credential.
    ///
    /// Fail-closed: the session must be active, unexpired, and its stored
    /// hash must equal the hash of the presented credential. Any mismatch
    /// yields `None` — an invalid session is an expected condition, not an
    /// error. On success, last-activity is updated (a display and
    /// idle-policy signal, not a security boundary).
    pub async fn validate(
        &self,
        session_token: &str,
        access_token: &str,
    ) -> Result<Option<Session>, AppError> {
        let Some(session) = self
            .session_repo
            .find_by_token_hash(&hash_token(session_token))
            .await?
        else {
            return Ok(None);
        };

        if !session.is_valid() {
            return Ok(None);
        }

        if !verify_token_hash(access_token, &session.access_token_hash) {
            warn!(
                session_id = %session.id,
                "Presented credential does not match session binding"
            );
            return Ok(None);
        }

        self.session_repo.touch_activity(session.id).await?;

        Ok(Some(session))
    }

    /// Revokes the session identified by its opaque token. Cascades to the
    /// session's rotation credentials atomically.
    pub async fn revoke(&self, session_token: &str, reason: &str) -> Result<bool, AppError> {
        let Some(session) = self
            .session_repo
            .find_by_token_hash(&hash_token(session_token))
            .await?
        else {
            return Ok(false);
        };
        self.revoke_by_id(session.id, reason).await
    }

    /// Revokes a session by ID, with the credential cascade.
    pub async fn revoke_by_id(&self, session_id: Uuid, reason: &str) -> Result<bool, AppError> {
        let revoked = self.session_repo.revoke(session_id, reason).await?;
        if revoked {
            info!(session_id = %session_id, reason = %reason, "Session revoked");
        }
        Ok(revoked)
    }

    /// Revokes every active session for a user. Returns the count.
    pub async fn revoke_all(&self, user_id: Uuid, reason: &str) -> Result<u64, AppError> {
        let count = self.session_repo.revoke_all_for_user(user_id, reason).await?;
        info!(user_id = %user_id, count = count, reason = %reason, "All sessions revoked");
        Ok(count)
    }

    /// Lists the active sessions for a user (session-listing endpoint).
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Session>, AppError> {
        self.session_repo.find_active_by_user(user_id).await
    }

    /// Looks up a session by ID.
    pub async fn find_by_id(&self, session_id: Uuid) -> Result<Option<Session>, AppError> {
        self.session_repo.find_by_id(session_id).await
    }
}
