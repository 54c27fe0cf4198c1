//! User repository implementation.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use agora_core::error::{AppError, ErrorKind};
use agora_core::result::AppResult;
use agora_entity::user::{CreateUser, User};

/// Repository for user CRUD and credential-state operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user", e))
    }

    /// Find a user by email. Emails are stored lowercase.
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email.to_lowercase())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find user by email", e)
            })
    }

    /// Find a user by external identity provider subject ID.
    pub async fn find_by_oauth_id(&self, oauth_id: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE oauth_id = $1")
            .bind(oauth_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find user by oauth id", e)
            })
    }

    /// Create a new user.
    pub async fn create(&self, data: &CreateUser) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (email, password_hash, oauth_id, display_name, avatar_url, tier, email_verified) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(data.email.to_lowercase())
        .bind(&data.password_hash)
        .bind(&data.oauth_id)
        .bind(&data.display_name)
        .bind(&data.avatar_url)
        .bind(data.tier)
        .bind(data.email_verified)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::conflict("An account with this email already exists")
            } else {
                AppError::with_source(ErrorKind::Database, "Failed to create user", e)
            }
        })
    }

    /// Attach an external identity to an existing local account and mark
    /// the email verified. A no-op when the same identity is already
    /// linked, which makes repeated provider callbacks idempotent.
    pub async fn link_oauth_id(&self, user_id: Uuid, oauth_id: &str) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET oauth_id = $2, email_verified = TRUE, updated_at = NOW() \
             WHERE id = $1 AND (oauth_id IS NULL OR oauth_id = $2) RETURNING *",
        )
        .bind(user_id)
        .bind(oauth_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to link external identity", e)
        })?
        .ok_or_else(|| {
            AppError::conflict("Account is already linked to a different external identity")
        })
    }

    /// Refresh the avatar stored from the external provider's profile.
    pub async fn update_avatar(&self, user_id: Uuid, avatar_url: Option<&str>) -> AppResult<()> {
        sqlx::query("UPDATE users SET avatar_url = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(avatar_url)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update avatar", e))?;
        Ok(())
    }

    /// Record a successful login.
    pub async fn update_last_login(&self, user_id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query("UPDATE users SET last_login_at = $2 WHERE id = $1")
            .bind(user_id)
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to update last login", e)
            })?;
        Ok(())
    }

    /// Store a TOTP secret during enrollment. The second factor is not
    /// enforced until [`enable_totp`](Self::enable_totp) confirms it.
    pub async fn set_totp_secret(&self, user_id: Uuid, secret: &str) -> AppResult<()> {
        sqlx::query(
            "UPDATE users SET totp_secret = $2, totp_enabled = FALSE, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(user_id)
        .bind(secret)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to store TOTP secret", e))?;
        Ok(())
    }

    /// Flip the second-factor flag on. Requires a stored secret, so the
    /// flag can only be set after enrollment produced one.
    pub async fn enable_totp(&self, user_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE users SET totp_enabled = TRUE, updated_at = NOW() \
             WHERE id = $1 AND totp_secret IS NOT NULL",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to enable TOTP", e))?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove the second factor entirely.
    pub async fn disable_totp(&self, user_id: Uuid) -> AppResult<()> {
        sqlx::query(
            "UPDATE users SET totp_enabled = FALSE, totp_secret = NULL, backup_codes = NULL, \
             updated_at = NOW() WHERE id = $1",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to disable TOTP", e))?;
        Ok(())
    }

    /// Replace the remaining backup codes after one is consumed.
    pub async fn set_backup_codes(
        &self,
        user_id: Uuid,
        backup_codes: &serde_json::Value,
    ) -> AppResult<()> {
        sqlx::query("UPDATE users SET backup_codes = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(backup_codes)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to update backup codes", e)
            })?;
        Ok(())
    }

    /// Deactivate an account. The row is retained.
    pub async fn set_active(&self, user_id: Uuid, active: bool) -> AppResult<()> {
        sqlx::query("UPDATE users SET is_active = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(active)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to update active flag", e)
            })?;
        Ok(())
    }
}

/// Check whether a sqlx error is a PostgreSQL unique-constraint violation.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505")
    )
}
