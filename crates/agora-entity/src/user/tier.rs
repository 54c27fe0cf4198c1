//! User access tier enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Access tiers available on the platform.
///
/// Tiers are ordered by privilege level: Admin > Moderator > Member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_tier", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserTier {
    /// Full platform administrator.
    Admin,
    /// Can moderate content and manage member accounts.
    Moderator,
    /// Regular platform member.
    Member,
}

impl UserTier {
    /// Return the privilege level (higher = more privileged).
    pub fn privilege_level(&self) -> u8 {
        match self {
            Self::Admin => 3,
            Self::Moderator => 2,
            Self::Member => 1,
        }
    }

    /// Check if this tier has at least the given tier's privileges.
    pub fn has_at_least(&self, other: &UserTier) -> bool {
        self.privilege_level() >= other.privilege_level()
    }

    /// Check if this tier is an admin.
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Return the tier as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Moderator => "moderator",
            Self::Member => "member",
        }
    }
}

impl fmt::Display for UserTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UserTier {
    type Err = agora_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "moderator" => Ok(Self::Moderator),
            "member" => Ok(Self::Member),
            _ => Err(agora_core::AppError::validation(format!(
                "Invalid user tier: '{s}'. Expected one of: admin, moderator, member"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_privilege_ordering() {
        assert!(UserTier::Admin.has_at_least(&UserTier::Member));
        assert!(UserTier::Admin.has_at_least(&UserTier::Admin));
        assert!(UserTier::Moderator.has_at_least(&UserTier::Member));
        assert!(!UserTier::Member.has_at_least(&UserTier::Moderator));
    }

    #[test]
    fn test_from_str() {
        assert_eq!("admin".parse::<UserTier>().unwrap(), UserTier::Admin);
        assert_eq!("MEMBER".parse::<UserTier>().unwrap(), UserTier::Member);
        assert!("invalid".parse::<UserTier>().is_err());
    }
}
