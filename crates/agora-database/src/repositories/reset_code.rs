//! Password reset code repository implementation.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use agora_core::error::{AppError, ErrorKind};
use agora_core::result::AppResult;
use agora_entity::reset::PasswordResetCode;

/// Repository for one-time password reset codes.
#[derive(Debug, Clone)]
pub struct ResetCodeRepository {
    pool: PgPool,
}

impl ResetCodeRepository {
    /// Create a new reset code repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Store a new code for an email, superseding any outstanding ones.
    /// Both steps share a transaction so only one code is ever live.
    pub async fn issue(
        &self,
        email: &str,
        code_hash: &str,
        expires_at: DateTime<Utc>,
        max_attempts: i32,
    ) -> AppResult<PasswordResetCode> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        sqlx::query("UPDATE password_reset_codes SET used = TRUE WHERE email = $1 AND NOT used")
            .bind(email)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to supersede prior codes", e)
            })?;

        let code = sqlx::query_as::<_, PasswordResetCode>(
            "INSERT INTO password_reset_codes (email, code_hash, expires_at, max_attempts) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(email)
        .bind(code_hash)
        .bind(expires_at)
        .bind(max_attempts)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to store reset code", e))?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit reset code", e)
        })?;

        Ok(code)
    }

    /// Find the outstanding (not yet used) code for an email, if any.
    pub async fn find_live_by_email(&self, email: &str) -> AppResult<Option<PasswordResetCode>> {
        sqlx::query_as::<_, PasswordResetCode>(
            "SELECT * FROM password_reset_codes WHERE email = $1 AND NOT used \
             ORDER BY created_at DESC LIMIT 1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find reset code", e))
    }

    /// Increment the attempt counter and return the updated row. The
    /// counter moves on every verification call, match or not, so the
    /// budget cannot be probed for free.
    pub async fn record_attempt(&self, id: Uuid) -> AppResult<PasswordResetCode> {
        sqlx::query_as::<_, PasswordResetCode>(
            "UPDATE password_reset_codes SET attempts = attempts + 1 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to record attempt", e))
    }

    /// Mark a code as verified.
    pub async fn mark_verified(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE password_reset_codes SET verified = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to mark code verified", e)
            })?;
        Ok(())
    }

    /// Commit a password reset in one transaction: replace the password
    /// hash, consume the code, and revoke every session and rotation
    /// credential of the user. A reset withdraws all prior trust, and no
    /// part of that may apply without the others.
    pub async fn commit_reset(
        &self,
        code_id: Uuid,
        user_id: Uuid,
        new_password_hash: &str,
    ) -> AppResult<()> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let consumed = sqlx::query(
            "UPDATE password_reset_codes SET used = TRUE \
             WHERE id = $1 AND verified AND NOT used",
        )
        .bind(code_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to consume code", e))?;

        if consumed.rows_affected() == 0 {
            tx.rollback().await.map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to roll back reset", e)
            })?;
            return Err(AppError::new(
                agora_core::error::ErrorKind::ResetCodeInvalid,
                "Reset code is not in a committable state",
            ));
        }

        sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(new_password_hash)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to update password", e)
            })?;

        sqlx::query(
            "UPDATE sessions SET is_active = FALSE, revoked_reason = 'password reset' \
             WHERE user_id = $1 AND is_active",
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to revoke user sessions", e)
        })?;

        sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = NOW() \
             WHERE user_id = $1 AND revoked_at IS NULL",
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to revoke user tokens", e)
        })?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit password reset", e)
        })?;

        Ok(())
    }
}
