//! Session repository implementation.
//!
//! Revocation and its credential cascade always share one transaction: a
//! reader can never observe an inactive session alongside a still-live
//! rotation credential.

use sqlx::PgPool;
use uuid::Uuid;

use agora_core::error::{AppError, ErrorKind};
use agora_core::result::AppResult;
use agora_entity::session::{CreateSession, Session};

/// Repository for session persistence and revocation cascades.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    /// Create a new session repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new session.
    pub async fn create(&self, data: &CreateSession) -> AppResult<Session> {
        sqlx::query_as::<_, Session>(
            "INSERT INTO sessions (id, user_id, token_hash, access_token_hash, ip_address, user_agent, device_fingerprint, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(data.id)
        .bind(data.user_id)
        .bind(&data.token_hash)
        .bind(&data.access_token_hash)
        .bind(&data.ip_address)
        .bind(&data.user_agent)
        .bind(&data.device_fingerprint)
        .bind(data.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create session", e))
    }

    /// Find a session by ID.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Session>> {
        sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find session", e))
    }

    /// Find a session by the hash of its opaque token.
    pub async fn find_by_token_hash(&self, token_hash: &str) -> AppResult<Option<Session>> {
        sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE token_hash = $1")
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find session by token", e)
            })
    }

    /// List all active, unexpired sessions for a user, newest first.
    pub async fn find_active_by_user(&self, user_id: Uuid) -> AppResult<Vec<Session>> {
        sqlx::query_as::<_, Session>(
            "SELECT * FROM sessions WHERE user_id = $1 AND is_active AND expires_at > NOW() \
             ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find active sessions", e)
        })
    }

    /// Update the last-activity timestamp.
    pub async fn touch_activity(&self, session_id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE sessions SET last_activity = NOW() WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to update last activity", e)
            })?;
        Ok(())
    }

    /// Rebind the session to a new short-lived credential hash. Called on
    /// every rotation so the session tracks exactly one valid credential.
    pub async fn rebind_access_hash(
        &self,
        session_id: Uuid,
        access_token_hash: &str,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE sessions SET access_token_hash = $2, last_activity = NOW() WHERE id = $1",
        )
        .bind(session_id)
        .bind(access_token_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to rebind session credential", e)
        })?;
        Ok(())
    }

    /// Revoke a session and every rotation credential issued under it,
    /// atomically.
    pub async fn revoke(&self, session_id: Uuid, reason: &str) -> AppResult<bool> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let result = sqlx::query(
            "UPDATE sessions SET is_active = FALSE, revoked_reason = $2 \
             WHERE id = $1 AND is_active",
        )
        .bind(session_id)
        .bind(reason)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to revoke session", e))?;

        sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = NOW() \
             WHERE session_id = $1 AND revoked_at IS NULL",
        )
        .bind(session_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to cascade credential revocation", e)
        })?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit revocation", e)
        })?;

        Ok(result.rows_affected() > 0)
    }

    /// Revoke every active session for a user, with the credential cascade
    /// in the same transaction. Returns the number of sessions revoked.
    pub async fn revoke_all_for_user(&self, user_id: Uuid, reason: &str) -> AppResult<u64> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let result = sqlx::query(
            "UPDATE sessions SET is_active = FALSE, revoked_reason = $2 \
             WHERE user_id = $1 AND is_active",
        )
        .bind(user_id)
        .bind(reason)
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
            AppError::with_source(ErrorKind::Database, "Failed to cascade credential revocation", e)
        })?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit revocation", e)
        })?;

        Ok(result.rows_affected())
    }

    /// Mark every expired-but-still-active session inactive and revoke any
    /// credentials left dangling under them. Storage hygiene only;
    /// idempotent and safe to run alongside live traffic.
    pub async fn sweep_expired(&self) -> AppResult<u64> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let result = sqlx::query(
            "UPDATE sessions SET is_active = FALSE, revoked_reason = 'expired' \
             WHERE is_active AND expires_at <= NOW()",
        )
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to sweep expired sessions", e)
        })?;

        sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = NOW() \
             WHERE revoked_at IS NULL \
             AND session_id IN (SELECT id FROM sessions WHERE NOT is_active)",
        )
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to sweep dangling credentials", e)
        })?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit sweep", e)
        })?;

        Ok(result.rows_affected())
    }
}
