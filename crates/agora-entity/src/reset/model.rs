//! One-time password reset code entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A short-lived numeric code bound to an email address.
///
/// State machine: issued → verified → used, strictly in that order and
/// each transition at most once. Issuing a new code marks every prior
/// code for the email as used, so only one code is ever outstanding.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PasswordResetCode {
    /// Unique code identifier.
    pub id: Uuid,
    /// The email the code was issued for.
    pub email: String,
    /// SHA-256 hash of the 6-digit code.
    #[serde(skip_serializing)]
    pub code_hash: String,
    /// When the code expires.
    pub expires_at: DateTime<Utc>,
    /// Whether the code passed verification.
    pub verified: bool,
    /// Whether the code has been consumed (or superseded).
    pub used: bool,
    /// Verification attempts so far. Every call counts, success or not.
    pub attempts: i32,
    /// Attempt budget; verification fails closed at this count.
    pub max_attempts: i32,
    /// When the code was issued.
    pub created_at: DateTime<Utc>,
}

impl PasswordResetCode {
    /// Check whether the code has expired.
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }

    /// Check whether the attempt budget is exhausted.
    pub fn attempts_exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }

    /// Check whether the code can still be committed: verified, unused,
    /// and unexpired.
    pub fn is_committable(&self) -> bool {
        self.verified && !self.used && !self.is_expired()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn code(verified: bool, used: bool, attempts: i32, expired: bool) -> PasswordResetCode {
        let now = Utc::now();
        PasswordResetCode {
            id: Uuid::new_v4(),
            email: "a@x.com".to_string(),
            code_hash: String::new(),
            expires_at: if expired {
                now - Duration::minutes(1)
            } else {
                now + Duration::minutes(10)
            },
            verified,
            used,
            attempts,
            max_attempts: 5,
            created_at: now,
        }
    }

    #[test]
    fn test_committable_requires_verified_and_unused() {
        assert!(code(true, false, 0, false).is_committable());
        assert!(!code(false, false, 0, false).is_committable());
        assert!(!code(true, true, 0, false).is_committable());
        assert!(!code(true, false, 0, true).is_committable());
    }

    #[test]
    fn test_attempt_budget() {
        assert!(!code(false, false, 4, false).attempts_exhausted());
        assert!(code(false, false, 5, false).attempts_exhausted());
        assert!(code(false, false, 6, false).attempts_exhausted());
    }
}
