//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Authentication and credential configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for JWT signing (HMAC-SHA256).
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Access token TTL in minutes.
    #[serde(default = "default_access_ttl")]
    pub jwt_access_ttl_minutes: u64,
    /// Refresh token TTL in hours.
    #[serde(default = "default_refresh_ttl")]
    pub jwt_refresh_ttl_hours: u64,
    /// Minimum password length.
    #[serde(default = "default_password_min")]
    pub password_min_length: usize,
    /// Password reset code TTL in minutes.
    #[serde(default = "default_reset_code_ttl")]
    pub reset_code_ttl_minutes: u64,
    /// Maximum verification attempts per reset code.
    #[serde(default = "default_reset_code_attempts")]
    pub reset_code_max_attempts: i32,
    /// Issuer name embedded in TOTP provisioning URIs.
    #[serde(default = "default_totp_issuer")]
    pub totp_issuer: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            jwt_access_ttl_minutes: default_access_ttl(),
            jwt_refresh_ttl_hours: default_refresh_ttl(),
            password_min_length: default_password_min(),
            reset_code_ttl_minutes: default_reset_code_ttl(),
            reset_code_max_attempts: default_reset_code_attempts(),
            totp_issuer: default_totp_issuer(),
        }
    }
}

fn default_jwt_secret() -> String {
    "CHANGE_ME_IN_PRODUCTION".to_string()
}

fn default_access_ttl() -> u64 {
    15
}

fn default_refresh_ttl() -> u64 {
    168
}

fn default_password_min() -> usize {
    8
}

fn default_reset_code_ttl() -> u64 {
    10
}

fn default_reset_code_attempts() -> i32 {
    5
}

fn default_totp_issuer() -> String {
    "Agora".to_string()
}
