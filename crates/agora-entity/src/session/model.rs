//! Session entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One logical login.
///
/// A session binds a user to the hash of their currently valid short-lived
/// credential. Sessions are created at login and invalidated on logout,
/// password reset, or detected compromise; rows are never deleted so the
/// audit trail survives revocation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    /// Unique session identifier.
    pub id: Uuid,
    /// The user this session belongs to.
    pub user_id: Uuid,
    /// SHA-256 hash of the opaque session token.
    #[serde(skip_serializing)]
    pub token_hash: String,
    /// SHA-256 hash of the access token currently bound to this session.
    /// Rotation replaces it; a presented credential must hash to exactly
    /// this value to authenticate.
    #[serde(skip_serializing)]
    pub access_token_hash: String,
    /// IP address from which the session was created.
    pub ip_address: Option<String>,
    /// User-Agent header value.
    pub user_agent: Option<String>,
    /// Derived device fingerprint.
    pub device_fingerprint: Option<String>,
    /// Whether the session may still authenticate requests.
    pub is_active: bool,
    /// Why the session was revoked, if it was.
    pub revoked_reason: Option<String>,
    /// When the session was created (login time).
    pub created_at: DateTime<Utc>,
    /// Last activity timestamp. Display and idle-policy signal only.
    pub last_activity: DateTime<Utc>,
    /// When the session expires.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// A session is valid iff active and not expired.
    pub fn is_valid(&self) -> bool {
        self.is_active && self.expires_at > Utc::now()
    }

    /// Check whether the session has expired.
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// Data required to create a new session.
///
/// The ID is generated by the caller, not the database: the session ID is
/// embedded in the JWT claims before the row exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSession {
    /// Pre-generated session identifier.
    pub id: Uuid,
    /// The user this session belongs to.
    pub user_id: Uuid,
    /// SHA-256 hash of the opaque session token.
    pub token_hash: String,
    /// SHA-256 hash of the bound access token.
    pub access_token_hash: String,
    /// IP address of the client.
    pub ip_address: Option<String>,
    /// User-Agent header.
    pub user_agent: Option<String>,
    /// Derived device fingerprint.
    pub device_fingerprint: Option<String>,
    /// When the session expires.
    pub expires_at: DateTime<Utc>,
}
