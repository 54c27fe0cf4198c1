//! Rotation credential lifecycle — issuance, validation, atomic rotation,
//! reuse detection.
//!
//! The core protocol: each rotation revokes every existing credential for
//! the session before issuing the next, in one transaction. Whichever
//! party rotates first wins; the loser's stale credential is dead, and its
//! next use reads as reuse-of-revoked, which cuts the whole session off.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use agora_core::config::session::SessionConfig;
use agora_core::error::AppError;
use agora_database::repositories::refresh_token::RefreshTokenRepository;
use agora_database::repositories::session::SessionRepository;
use agora_database::repositories::user::UserRepository;
use agora_entity::token::{CreateRefreshToken, RefreshToken};
use agora_entity::user::User;

use crate::fingerprint::DeviceMeta;
use crate::jwt::{JwtDecoder, JwtEncoder};
use crate::token::hash_token;

/// Result of a successful rotation: the replacement credential set and the
/// identity it belongs to.
#[derive(Debug, Clone)]
pub struct RotationResult {
    /// The user the credentials belong to.
    pub user: User,
    /// The session the credentials are bound to.
    pub session_id: Uuid,
    /// New short-lived access credential.
    pub access_token: String,
    /// Access credential expiry.
    pub access_expires_at: chrono::DateTime<Utc>,
    /// New rotation credential.
    pub refresh_token: String,
    /// Rotation credential expiry.
    pub refresh_expires_at: chrono::DateTime<Utc>,
}

/// Manages the rotation credential lifecycle.
#[derive(Clone)]
pub struct RefreshManager {
    /// Rotation credential persistence.
    refresh_repo: Arc<RefreshTokenRepository>,
    /// Session persistence, for cross-checks and rebinding.
    session_repo: Arc<SessionRepository>,
    /// User persistence, for account-state checks at rotation.
    user_repo: Arc<UserRepository>,
    /// Credential encoder.
    jwt_encoder: Arc<JwtEncoder>,
    /// Credential decoder.
    jwt_decoder: Arc<JwtDecoder>,
    /// Session configuration (strict fingerprinting, anomaly window).
    config: SessionConfig,
}

impl std::fmt::Debug for RefreshManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshManager")
            .field("config", &self.config)
            .finish()
    }
}

impl RefreshManager {
    /// Creates a new refresh manager.
    pub fn new(
        refresh_repo: Arc<RefreshTokenRepository>,
        session_repo: Arc<SessionRepository>,
        user_repo: Arc<UserRepository>,
        jwt_encoder: Arc<JwtEncoder>,
        jwt_decoder: Arc<JwtDecoder>,
        config: SessionConfig,
    ) -> Self {
        Self {
            refresh_repo,
            session_repo,
            user_repo,
            jwt_encoder,
            jwt_decoder,
            config,
        }
    }

    /// Issues a rotation credential bound to a session.
    ///
    /// Returns the raw signed token (for the transport) and the stored
    /// record. The unique nonce in the claims makes every value distinct
    /// even when issued back-to-back for the same session.
    pub async fn issue(
        &self,
        user: &User,
        session_id: Uuid,
        device: &DeviceMeta,
    ) -> Result<(String, RefreshToken), AppError> {
        let signed = self.jwt_encoder.generate_refresh(user, session_id)?;

        let record = self
            .refresh_repo
            .create(&CreateRefreshToken {
                user_id: user.id,
                session_id,
                token_hash: hash_token(&signed.token),
                expires_at: signed.expires_at,
                device_fingerprint: device.fingerprint(),
                user_agent: device.user_agent.clone(),
                ip_address: device.ip_address.clone(),
            })
            .await?;

        Ok((signed.token, record))
    }

    /// Validates a rotation credential without rotating it.
    ///
    /// Rejects revoked and expired credentials. A valid-looking credential
    /// whose session is no longer active is treated as tampering evidence:
    /// it is revoked on the spot, not merely rejected.
    pub async fn validate(&self, raw_token: &str) -> Result<Option<RefreshToken>, AppError> {
        let claims = match self.jwt_decoder.decode_refresh(raw_token) {
            Ok(c) => c,
            Err(_) => return Ok(None),
        };

        let Some(record) = self
            .refresh_repo
            .find_by_token_hash(&hash_token(raw_token))
            .await?
        else {
            return Ok(None);
        };

        if record.is_revoked() || record.is_expired() {
            return Ok(None);
        }

        let session = self.session_repo.find_by_id(claims.session_id()).await?;
        if !session.map(|s| s.is_valid()).unwrap_or(false) {
            warn!(
                token_id = %record.id,
                session_id = %record.session_id,
                "Live credential bound to a dead session; revoking"
            );
            self.refresh_repo.revoke(record.id).await?;
            return Ok(None);
        }

        Ok(Some(record))
    }

    /// Rotates a credential: validates it, revokes every credential for its
    /// session, and issues the replacement set atomically.
    ///
    /// Two concurrent rotations of the same credential cannot both succeed;
    /// the claim is a conditional update checked by affected-row count, and
    /// the loser fails closed.
    pub async fn rotate(
        &self,
        raw_token: &str,
        device: &DeviceMeta,
    ) -> Result<RotationResult, AppError> {
        let claims = self
            .jwt_decoder
            .decode_refresh(raw_token)
            .map_err(|_| AppError::session_invalid())?;

        let record = self
            .refresh_repo
            .find_by_token_hash(&hash_token(raw_token))
            .await?
            .ok_or_else(AppError::session_invalid)?;

        // The signed claims and the stored row must agree on the binding.
        if record.session_id != claims.session_id() || record.user_id != claims.user_id() {
            return Err(AppError::session_invalid());
        }

        // Reuse of a revoked credential: log with full context, revoke the
        // whole session, return the generic failure.
        if record.is_revoked() {
            warn!(
                token_id = %record.id,
                session_id = %record.session_id,
                user_id = %record.user_id,
                presented_ip = ?device.ip_address,
                presented_agent = ?device.user_agent,
                issued_ip = ?record.ip_address,
                "Revoked rotation credential presented again; revoking session"
            );
            self.session_repo
                .revoke(record.session_id, "rotation credential reuse detected")
                .await?;
            return Err(AppError::credential_reuse(
                "Rotation credential has already been used",
            ));
        }

        if record.is_expired() {
            return Err(AppError::session_invalid());
        }

        let session = self
            .session_repo
            .find_by_id(record.session_id)
            .await?
            .filter(|s| s.is_valid());
        let Some(session) = session else {
            self.refresh_repo.revoke(record.id).await?;
            return Err(AppError::session_invalid());
        };

        // Strict mode treats fingerprint drift as probable compromise.
        if let (Some(stored), Some(presented)) =
            (record.device_fingerprint.as_deref(), device.fingerprint())
        {
            if stored != presented {
                if self.config.strict_fingerprint {
                    warn!(
                        token_id = %record.id,
                        session_id = %record.session_id,
                        "Fingerprint mismatch on rotation under strict mode; revoking"
                    );
                    self.refresh_repo.revoke(record.id).await?;
                    return Err(AppError::session_invalid());
                }
                warn!(
                    token_id = %record.id,
                    session_id = %record.session_id,
                    "Fingerprint drift on rotation"
                );
            }
        }

        self.check_rotation_anomaly(record.session_id).await?;

        let user = self
            .user_repo
            .find_by_id(record.user_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(AppError::session_invalid)?;

        let new_refresh = self.jwt_encoder.generate_refresh(&user, record.session_id)?;
        let successor = CreateRefreshToken {
            user_id: user.id,
            session_id: record.session_id,
            token_hash: hash_token(&new_refresh.token),
            expires_at: new_refresh.expires_at,
            device_fingerprint: device.fingerprint(),
            user_agent: device.user_agent.clone(),
            ip_address: device.ip_address.clone(),
        };

        // Atomic claim. None means a concurrent rotation already claimed
        // the credential; the loser fails closed, no cascade.
        let Some(_created) = self.refresh_repo.rotate(record.id, &successor).await? else {
            warn!(
                token_id = %record.id,
                session_id = %record.session_id,
                "Lost rotation race; credential already claimed"
            );
            return Err(AppError::credential_reuse(
                "Rotation credential has already been used",
            ));
        };

        let access = self.jwt_encoder.generate_access(&user, record.session_id)?;
        self.session_repo
            .rebind_access_hash(record.session_id, &hash_token(&access.token))
            .await?;

        info!(
            user_id = %user.id,
            session_id = %record.session_id,
            "Rotation credential rotated"
        );

        Ok(RotationResult {
            user,
            session_id: session.id,
            access_token: access.token,
            access_expires_at: access.expires_at,
            refresh_token: new_refresh.token,
            refresh_expires_at: new_refresh.expires_at,
        })
    }

    /// Revokes a single credential by its raw value.
    pub async fn revoke(&self, raw_token: &str) -> Result<bool, AppError> {
        let Some(record) = self
            .refresh_repo
            .find_by_token_hash(&hash_token(raw_token))
            .await?
        else {
            return Ok(false);
        };
        self.refresh_repo.revoke(record.id).await
    }

    /// Revokes every live credential for a session.
    pub async fn revoke_for_session(&self, session_id: Uuid) -> Result<u64, AppError> {
        self.refresh_repo.revoke_for_session(session_id).await
    }

    /// Revokes every live credential for a user.
    pub async fn revoke_for_user(&self, user_id: Uuid) -> Result<u64, AppError> {
        self.refresh_repo.revoke_for_user(user_id).await
    }

    /// Rolling-window anomaly check: a session accumulating rotation
    /// events from too many distinct source addresses is cut off
    /// proactively. The count lives in the datastore so the check holds
    /// across replicas.
    async fn check_rotation_anomaly(&self, session_id: Uuid) -> Result<(), AppError> {
        let sources = self
            .refresh_repo
            .count_distinct_sources(session_id, self.config.anomaly_window_minutes)
            .await?;

        if sources > self.config.anomaly_max_addresses {
            warn!(
                session_id = %session_id,
                distinct_sources = sources,
                window_minutes = self.config.anomaly_window_minutes,
                "Rotation anomaly: too many distinct source addresses; revoking session"
            );
            self.session_repo
                .revoke(session_id, "rotation anomaly: too many source addresses")
                .await?;
            return Err(AppError::session_invalid());
        }

        Ok(())
    }
}
