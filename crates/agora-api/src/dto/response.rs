//! Response DTOs.
//!
//! Profiles are sanitized here: hashes, secrets, and token digests never
//! leave the service, and issued tokens ride only in cookies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use agora_entity::session::Session;
use agora_entity::user::User;

/// Sanitized user profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    /// User ID.
    pub id: Uuid,
    /// Email.
    pub email: String,
    /// Display name.
    pub display_name: Option<String>,
    /// Avatar URL.
    pub avatar_url: Option<String>,
    /// Access tier.
    pub tier: String,
    /// Whether the email is verified.
    pub email_verified: bool,
    /// Whether a second factor is enrolled.
    pub totp_enabled: bool,
    /// Whether the account is federated (no password login).
    pub federated: bool,
    /// Created at.
    pub created_at: DateTime<Utc>,
    /// Last login.
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            avatar_url: user.avatar_url.clone(),
            tier: user.tier.to_string(),
            email_verified: user.email_verified,
            totp_enabled: user.totp_enabled,
            federated: user.is_federated(),
            created_at: user.created_at,
            last_login_at: user.last_login_at,
        }
    }
}

/// One entry in the session listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    /// Session ID.
    pub id: Uuid,
    /// IP address at login.
    pub ip_address: Option<String>,
    /// User agent at login.
    pub user_agent: Option<String>,
    /// Created at (login time).
    pub created_at: DateTime<Utc>,
    /// Last activity.
    pub last_activity: DateTime<Utc>,
    /// Expiry.
    pub expires_at: DateTime<Utc>,
    /// Whether this is the caller's own session.
    pub current: bool,
}

impl SessionResponse {
    /// Builds a listing entry, marking the caller's own session.
    pub fn from_session(session: &Session, current_session_id: Uuid) -> Self {
        Self {
            id: session.id,
            ip_address: session.ip_address.clone(),
            user_agent: session.user_agent.clone(),
            created_at: session.created_at,
            last_activity: session.last_activity,
            expires_at: session.expires_at,
            current: session.id == current_session_id,
        }
    }
}

/// Simple message response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Message.
    pub message: String,
}

impl MessageResponse {
    /// Creates a message response.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Count response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountResponse {
    /// Count value.
    pub count: u64,
}

/// Reset code verification outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetVerifyResponse {
    /// Whether the code is now verified.
    pub verified: bool,
}

/// External-login redirect target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthAuthorizeResponse {
    /// The provider URL to redirect the user to.
    pub redirect_url: String,
}

/// Second-factor enrollment data. Returned exactly once, at setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwoFactorSetupResponse {
    /// Base32 secret for manual entry.
    pub secret: String,
    /// otpauth:// provisioning URI.
    pub otpauth_uri: String,
    /// QR code PNG, base64-encoded.
    pub qr_code_base64: String,
    /// One-time recovery codes.
    pub recovery_codes: Vec<String>,
}

/// Second-factor status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwoFactorStatusResponse {
    /// Whether the second factor is enforced.
    pub enabled: bool,
    /// Whether a secret awaits confirmation.
    pub pending_confirmation: bool,
    /// Unused recovery codes remaining.
    pub recovery_codes_remaining: usize,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status.
    pub status: String,
    /// Database status.
    pub database: String,
    /// Version.
    pub version: String,
}
