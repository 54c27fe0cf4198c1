//! Refresh token (rotation credential) entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A long-lived, single-use-per-rotation-cycle credential.
///
/// At most one non-revoked row exists per session at any time: every
/// successful rotation revokes the prior generation in the same
/// transaction that inserts the next one, so a stolen stale token dies
/// the moment either party rotates.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RefreshToken {
    /// Unique credential identifier.
    pub id: Uuid,
    /// The user this credential belongs to.
    pub user_id: Uuid,
    /// The session this credential is bound to.
    pub session_id: Uuid,
    /// SHA-256 hash of the signed token value.
    #[serde(skip_serializing)]
    pub token_hash: String,
    /// When the credential expires.
    pub expires_at: DateTime<Utc>,
    /// When the credential was revoked; null while live.
    pub revoked_at: Option<DateTime<Utc>>,
    /// Device fingerprint captured at issuance.
    pub device_fingerprint: Option<String>,
    /// User-Agent captured at issuance.
    pub user_agent: Option<String>,
    /// Source IP captured at issuance.
    pub ip_address: Option<String>,
    /// When the credential was issued.
    pub created_at: DateTime<Utc>,
}

impl RefreshToken {
    /// Check whether the credential has been revoked.
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    /// Check whether the credential has expired.
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// Data required to store a newly issued rotation credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRefreshToken {
    /// Owning user.
    pub user_id: Uuid,
    /// Bound session.
    pub session_id: Uuid,
    /// SHA-256 hash of the signed token value.
    pub token_hash: String,
    /// Expiry.
    pub expires_at: DateTime<Utc>,
    /// Device fingerprint at issuance.
    pub device_fingerprint: Option<String>,
    /// User-Agent at issuance.
    pub user_agent: Option<String>,
    /// Source IP at issuance.
    pub ip_address: Option<String>,
}
