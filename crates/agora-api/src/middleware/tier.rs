//! Tier guards for role-gated routes.
//!
//! Tier checks are independent of authentication success: an
//! authenticated caller outside the allow-list gets `Forbidden`, not
//! another authentication error.

use agora_core::error::AppError;
use agora_entity::user::UserTier;

use crate::extractors::AuthUser;

/// Checks the caller's tier against an allow-list.
pub fn require_tier(auth: &AuthUser, allowed: &[UserTier]) -> Result<(), AppError> {
    if allowed.contains(&auth.tier) {
        Ok(())
    } else {
        Err(AppError::forbidden("Insufficient access tier"))
    }
}

/// Checks that the authenticated user is an admin.
pub fn require_admin(auth: &AuthUser) -> Result<(), AppError> {
    require_tier(auth, &[UserTier::Admin])
}

/// Checks that the authenticated user is at least a moderator.
pub fn require_moderator(auth: &AuthUser) -> Result<(), AppError> {
    require_tier(auth, &[UserTier::Admin, UserTier::Moderator])
}
