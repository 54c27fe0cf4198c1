//! Request context carrying the authenticated identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use agora_entity::user::UserTier;

/// Context for the current authenticated request.
///
/// Attached by the authentication gate and passed into service methods so
/// that every operation knows *who* is acting and from *which* session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The authenticated user's ID.
    pub user_id: Uuid,
    /// The current session ID.
    pub session_id: Uuid,
    /// The user's tier at the time the credential was issued.
    pub tier: UserTier,
    /// The email (convenience field from the claims).
    pub email: String,
    /// IP address of the request origin.
    pub ip_address: Option<String>,
    /// User-Agent header value.
    pub user_agent: Option<String>,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(
        user_id: Uuid,
        session_id: Uuid,
        tier: UserTier,
        email: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Self {
        Self {
            user_id,
            session_id,
            tier,
            email,
            ip_address,
            user_agent,
            request_time: Utc::now(),
        }
    }

    /// Returns whether the current user is an admin.
    pub fn is_admin(&self) -> bool {
        matches!(self.tier, UserTier::Admin)
    }

    /// Returns whether the current user is at least a moderator.
    pub fn is_moderator_or_above(&self) -> bool {
        matches!(self.tier, UserTier::Admin | UserTier::Moderator)
    }
}
