//! Password reset sub-flow: issue, verify, commit.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tracing::{debug, info, warn};

use agora_auth::password::{PasswordHasher, PasswordValidator};
use agora_auth::token::{generate_reset_code, hash_token, verify_token_hash};
use agora_core::config::auth::AuthConfig;
use agora_core::error::{AppError, ErrorKind};
use agora_database::repositories::reset_code::ResetCodeRepository;
use agora_database::repositories::user::UserRepository;
use agora_entity::reset::PasswordResetCode;

/// Delivery seam for issued reset codes.
///
/// Production wires an email sender here; tests capture the code directly.
#[async_trait]
pub trait CodeDelivery: Send + Sync {
    /// Deliver a freshly issued code to its email address.
    async fn deliver(&self, email: &str, code: &str) -> Result<(), AppError>;
}

/// Development delivery that only logs. Codes surface at debug level and
/// nowhere else.
#[derive(Debug, Clone, Default)]
pub struct TracingDelivery;

#[async_trait]
impl CodeDelivery for TracingDelivery {
    async fn deliver(&self, email: &str, code: &str) -> Result<(), AppError> {
        debug!(email = %email, code = %code, "Password reset code issued (log delivery)");
        Ok(())
    }
}

/// Orchestrates the three-step password reset exchange.
#[derive(Clone)]
pub struct PasswordResetService {
    /// Reset code persistence.
    reset_repo: Arc<ResetCodeRepository>,
    /// User persistence.
    user_repo: Arc<UserRepository>,
    /// Password hasher for the committed password.
    password_hasher: Arc<PasswordHasher>,
    /// Password policy for the committed password.
    password_validator: Arc<PasswordValidator>,
    /// Code delivery seam.
    delivery: Arc<dyn CodeDelivery>,
    /// Code TTL in minutes.
    code_ttl_minutes: i64,
    /// Attempt budget per code.
    max_attempts: i32,
}

impl std::fmt::Debug for PasswordResetService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordResetService")
            .field("code_ttl_minutes", &self.code_ttl_minutes)
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}

impl PasswordResetService {
    /// Creates a new password reset service.
    pub fn new(
        reset_repo: Arc<ResetCodeRepository>,
        user_repo: Arc<UserRepository>,
        password_hasher: Arc<PasswordHasher>,
        password_validator: Arc<PasswordValidator>,
        delivery: Arc<dyn CodeDelivery>,
        config: &AuthConfig,
    ) -> Self {
        Self {
            reset_repo,
            user_repo,
            password_hasher,
            password_validator,
            delivery,
            code_ttl_minutes: config.reset_code_ttl_minutes as i64,
            max_attempts: config.reset_code_max_attempts,
        }
    }

    /// Issues a reset code for an email.
    ///
    /// Outwardly this always succeeds, whether or not the email belongs to
    /// an account — the response must not confirm account existence. When
    /// it does, any outstanding code is superseded before the new one is
    /// stored.
    pub async fn issue(&self, email: &str) -> Result<(), AppError> {
        let email = email.to_lowercase();

        let Some(user) = self.user_repo.find_by_email(&email).await? else {
            debug!("Reset requested for unknown email; returning success");
            return Ok(());
        };

        if !user.is_active {
            debug!(user_id = %user.id, "Reset requested for inactive account; returning success");
            return Ok(());
        }

        let code = generate_reset_code();
        let expires_at = Utc::now() + Duration::minutes(self.code_ttl_minutes);

        self.reset_repo
            .issue(&email, &hash_token(&code), expires_at, self.max_attempts)
            .await?;

        self.delivery.deliver(&email, &code).await?;

        info!(user_id = %user.id, "Password reset code issued");
        Ok(())
    }

    /// Verifies a presented code.
    ///
    /// The attempt counter moves on every call, match or not, and the
    /// check fails closed once the budget is spent, the code has expired,
    /// or it was already consumed — even if the code itself is correct.
    pub async fn verify(&self, email: &str, code: &str) -> Result<(), AppError> {
        let email = email.to_lowercase();

        let Some(record) = self.reset_repo.find_live_by_email(&email).await? else {
            return Err(AppError::new(
                ErrorKind::ResetCodeInvalid,
                "Reset code is invalid",
            ));
        };

        let record = self.reset_repo.record_attempt(record.id).await?;

        self.check_code(&record, code)?;

        self.reset_repo.mark_verified(record.id).await?;
        Ok(())
    }

    /// Commits the reset: requires a *verified*, unconsumed code, replaces
    /// the password, consumes the code, and revokes every session and
    /// rotation credential of the user — all prior trust is withdrawn in
    /// one transaction.
    pub async fn commit(&self, email: &str, code: &str, new_password: &str) -> Result<(), AppError> {
        let email = email.to_lowercase();

        let Some(record) = self.reset_repo.find_live_by_email(&email).await? else {
            return Err(AppError::new(
                ErrorKind::ResetCodeInvalid,
                "Reset code is invalid",
            ));
        };

        if record.is_expired() {
            return Err(AppError::new(
                ErrorKind::ResetCodeExpired,
                "Reset code has expired",
            ));
        }

        if !verify_token_hash(code, &record.code_hash) {
            return Err(AppError::new(
                ErrorKind::ResetCodeInvalid,
                "Reset code is invalid",
            ));
        }

        if !record.is_committable() {
            return Err(AppError::new(
                ErrorKind::ResetCodeInvalid,
                "Reset code has not been verified",
            ));
        }

        self.password_validator.validate(new_password)?;

        let user = self
            .user_repo
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::new(ErrorKind::ResetCodeInvalid, "Reset code is invalid"))?;

        let new_hash = self.password_hasher.hash_password(new_password)?;
        self.reset_repo
            .commit_reset(record.id, user.id, &new_hash)
            .await?;

        warn!(
            user_id = %user.id,
            "Password reset committed; all sessions and credentials revoked"
        );
        Ok(())
    }

    /// Shared state checks for a presented code, applied after the attempt
    /// counter has moved.
    fn check_code(&self, record: &PasswordResetCode, code: &str) -> Result<(), AppError> {
        if record.attempts > record.max_attempts {
            return Err(AppError::new(
                ErrorKind::ResetCodeAttemptsExceeded,
                "Too many verification attempts",
            ));
        }

        if record.used {
            return Err(AppError::new(
                ErrorKind::ResetCodeInvalid,
                "Reset code is invalid",
            ));
        }

        if record.is_expired() {
            return Err(AppError::new(
                ErrorKind::ResetCodeExpired,
                "Reset code has expired",
            ));
        }

        if !verify_token_hash(code, &record.code_hash) {
            return Err(AppError::new(
                ErrorKind::ResetCodeInvalid,
                "Reset code is invalid",
            ));
        }

        Ok(())
    }
}
