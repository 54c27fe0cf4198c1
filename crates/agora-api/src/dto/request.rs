//! Request DTOs with validation.
//!
//! Every endpoint gets an explicit struct; optional fields and their
//! defaulting rules are stated here once, not probed at call sites.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Registration request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Email address.
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    /// Password. Policy is enforced by the service layer.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    /// Display name.
    pub display_name: Option<String>,
}

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address.
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    /// Password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    /// Second-factor code, required only once the account has one enrolled.
    pub totp_code: Option<String>,
}

/// External-identity callback request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OAuthCallbackRequest {
    /// Authorization code returned by the provider.
    #[validate(length(min = 1, message = "Code is required"))]
    pub code: String,
    /// Correlation state echoed by the provider.
    #[validate(length(min = 1, message = "State is required"))]
    pub state: String,
    /// Second-factor code, when the linked account has one enrolled.
    pub totp_code: Option<String>,
}

/// Password reset request (step 1).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ResetRequestRequest {
    /// Email address. The response is identical whether or not it exists.
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
}

/// Password reset code verification (step 2).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ResetVerifyRequest {
    /// Email address.
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    /// The 6-digit code.
    #[validate(length(min = 1, message = "Code is required"))]
    pub code: String,
}

/// Password reset commit (step 3).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ResetCommitRequest {
    /// Email address.
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    /// The verified 6-digit code.
    #[validate(length(min = 1, message = "Code is required"))]
    pub code: String,
    /// The replacement password.
    #[validate(length(min = 1, message = "New password is required"))]
    pub new_password: String,
}

/// Second-factor confirmation request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TwoFactorConfirmRequest {
    /// A current code from the enrolled authenticator.
    #[validate(length(min = 1, message = "Code is required"))]
    pub code: String,
}

/// Second-factor disable request.
///
/// Password-holding accounts supply `password`; federated accounts supply
/// a current `code` instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwoFactorDisableRequest {
    /// Current password.
    pub password: Option<String>,
    /// Current TOTP code.
    pub code: Option<String>,
}

/// Admin account activation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetActiveRequest {
    /// Desired active state. Deactivation revokes every session of the
    /// account.
    pub active: bool,
}
