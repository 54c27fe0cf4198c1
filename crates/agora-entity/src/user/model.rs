//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::tier::UserTier;

/// A registered user on the Agora platform.
///
/// The password hash is null exactly when the account was created through
/// an external identity provider; such accounts can never log in with a
/// password.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: Uuid,
    /// Email address, stored lowercase, unique.
    pub email: String,
    /// Argon2 password hash. Null for federated accounts.
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    /// External identity provider subject ID, if linked.
    pub oauth_id: Option<String>,
    /// Human-readable display name.
    pub display_name: Option<String>,
    /// Avatar URL, refreshed from the external provider on callback.
    pub avatar_url: Option<String>,
    /// Access tier.
    pub tier: UserTier,
    /// Whether the account may authenticate. Deactivation flips this flag;
    /// rows are never deleted.
    pub is_active: bool,
    /// Whether the email address has been verified.
    pub email_verified: bool,
    /// Whether a second factor is required at login.
    pub totp_enabled: bool,
    /// Base32-encoded TOTP secret, present once enrollment starts.
    #[serde(skip_serializing)]
    pub totp_secret: Option<String>,
    /// SHA-256 digests of unused one-time backup codes.
    #[serde(skip_serializing)]
    pub backup_codes: Option<serde_json::Value>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
    /// Last successful login time.
    pub last_login_at: Option<DateTime<Utc>>,
}

impl User {
    /// Check if the user can present a password at all.
    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }

    /// Check if this account came from an external identity provider.
    pub fn is_federated(&self) -> bool {
        self.oauth_id.is_some()
    }

    /// Check if this user has admin privileges.
    pub fn is_admin(&self) -> bool {
        self.tier.is_admin()
    }
}

/// Data required to create a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Email address (will be lowercased).
    pub email: String,
    /// Pre-hashed password. None for federated accounts.
    pub password_hash: Option<String>,
    /// External identity provider subject ID, if any.
    pub oauth_id: Option<String>,
    /// Display name.
    pub display_name: Option<String>,
    /// Avatar URL.
    pub avatar_url: Option<String>,
    /// Assigned tier.
    pub tier: UserTier,
    /// Whether the email is already verified (true for federated signups).
    pub email_verified: bool,
}
