//! TOTP enrollment lifecycle: setup, confirm, disable, status.

use std::io::Cursor;
use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::Luma;
use qrcode::QrCode;
use tracing::info;

use agora_auth::password::PasswordHasher;
use agora_auth::totp;
use agora_core::config::auth::AuthConfig;
use agora_core::error::AppError;
use agora_database::repositories::user::UserRepository;
use agora_entity::user::User;

/// Data returned when enrollment starts. The plaintext recovery codes
/// appear here exactly once.
#[derive(Debug, Clone)]
pub struct TwoFactorSetup {
    /// Base32-encoded secret for manual entry.
    pub secret: String,
    /// otpauth:// URI for authenticator apps.
    pub otpauth_uri: String,
    /// QR code rendering of the URI, PNG, base64-encoded.
    pub qr_code_base64: String,
    /// One-time recovery codes.
    pub recovery_codes: Vec<String>,
}

/// Current second-factor state for an account.
#[derive(Debug, Clone)]
pub struct TwoFactorStatus {
    /// Whether the second factor is enforced at login.
    pub enabled: bool,
    /// Whether a secret exists but has not been confirmed yet.
    pub pending_confirmation: bool,
    /// Unused recovery codes remaining.
    pub recovery_codes_remaining: usize,
}

/// Manages TOTP enrollment for user accounts.
#[derive(Clone)]
pub struct TwoFactorService {
    /// User persistence.
    user_repo: Arc<UserRepository>,
    /// Password hasher, for the disable check.
    password_hasher: Arc<PasswordHasher>,
    /// Issuer embedded in provisioning URIs.
    issuer: String,
}

impl std::fmt::Debug for TwoFactorService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwoFactorService")
            .field("issuer", &self.issuer)
            .finish()
    }
}

impl TwoFactorService {
    /// Creates a new two-factor service.
    pub fn new(
        user_repo: Arc<UserRepository>,
        password_hasher: Arc<PasswordHasher>,
        config: &AuthConfig,
    ) -> Self {
        Self {
            user_repo,
            password_hasher,
            issuer: config.totp_issuer.clone(),
        }
    }

    /// Starts enrollment: generates and stores a secret (not yet
    /// enforced), renders the provisioning QR, and mints recovery codes.
    pub async fn setup(&self, user: &User) -> Result<TwoFactorSetup, AppError> {
        if user.totp_enabled {
            return Err(AppError::conflict("Second factor is already enabled"));
        }

        let secret = totp::generate_secret();
        let otpauth_uri = totp::provisioning_uri(&secret, &self.issuer, &user.email)?;
        let qr_code_base64 = render_qr_png_base64(&otpauth_uri)?;

        let (recovery_codes, digests) = totp::generate_recovery_codes();

        self.user_repo.set_totp_secret(user.id, &secret).await?;
        self.user_repo
            .set_backup_codes(user.id, &serde_json::Value::from(digests))
            .await?;

        info!(user_id = %user.id, "Second-factor enrollment started");

        Ok(TwoFactorSetup {
            secret,
            otpauth_uri,
            qr_code_base64,
            recovery_codes,
        })
    }

    /// Confirms enrollment by consuming one valid code against the stored
    /// secret, flipping the enforcement flag.
    pub async fn confirm(&self, user: &User, code: &str) -> Result<(), AppError> {
        if user.totp_enabled {
            return Err(AppError::conflict("Second factor is already enabled"));
        }

        let Some(secret) = user.totp_secret.as_deref() else {
            return Err(AppError::validation("Second-factor setup has not been started"));
        };

        if !totp::verify_code(secret, code, &user.email)? {
            return Err(AppError::second_factor_invalid());
        }

        if !self.user_repo.enable_totp(user.id).await? {
            return Err(AppError::validation("Second-factor setup has not been started"));
        }

        info!(user_id = %user.id, "Second factor enabled");
        Ok(())
    }

    /// Disables the second factor.
    ///
    /// Accounts with a password must present it. Federated accounts have
    /// none, so they re-confirm with a currently valid TOTP code instead —
    /// proof of the factor being removed.
    pub async fn disable(
        &self,
        user: &User,
        password: Option<&str>,
        code: Option<&str>,
    ) -> Result<(), AppError> {
        if !user.totp_enabled {
            return Err(AppError::validation("Second factor is not enabled"));
        }

        match user.password_hash.as_deref() {
            Some(stored_hash) => {
                let presented = password
                    .ok_or_else(|| AppError::validation("Current password is required"))?;
                if !self.password_hasher.verify_password(presented, stored_hash)? {
                    return Err(AppError::invalid_credential());
                }
            }
            None => {
                let secret = user
                    .totp_secret
                    .as_deref()
                    .ok_or_else(|| AppError::internal("Enabled second factor has no secret"))?;
                let presented =
                    code.ok_or_else(|| AppError::validation("A current code is required"))?;
                if !totp::verify_code(secret, presented, &user.email)? {
                    return Err(AppError::second_factor_invalid());
                }
            }
        }

        self.user_repo.disable_totp(user.id).await?;
        info!(user_id = %user.id, "Second factor disabled");
        Ok(())
    }

    /// Reports the account's second-factor state.
    pub fn status(&self, user: &User) -> TwoFactorStatus {
        let remaining = match user.backup_codes.as_ref() {
            Some(serde_json::Value::Array(codes)) => codes.len(),
            _ => 0,
        };
        TwoFactorStatus {
            enabled: user.totp_enabled,
            pending_confirmation: !user.totp_enabled && user.totp_secret.is_some(),
            recovery_codes_remaining: remaining,
        }
    }
}

/// Renders an otpauth URI as a base64-encoded PNG QR code.
fn render_qr_png_base64(uri: &str) -> Result<String, AppError> {
    let code = QrCode::new(uri.as_bytes())
        .map_err(|e| AppError::internal(format!("Failed to build QR code: {e}")))?;
    let image = code.render::<Luma<u8>>().build();

    let mut buf = Cursor::new(Vec::new());
    image::DynamicImage::ImageLuma8(image)
        .write_to(&mut buf, image::ImageFormat::Png)
        .map_err(|e| AppError::internal(format!("Failed to encode QR image: {e}")))?;

    Ok(STANDARD.encode(buf.into_inner()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qr_rendering_produces_png() {
        let encoded = render_qr_png_base64("otpauth://totp/Agora:a%40x.com?secret=ABC").unwrap();
        let bytes = STANDARD.decode(encoded).unwrap();
        // PNG magic number.
        assert_eq!(&bytes[..8], &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a]);
    }
}
