//! Refresh token repository implementation.
//!
//! The rotation race is settled here: claiming a credential is a single
//! conditional UPDATE checked by affected-row count, so of two concurrent
//! rotations exactly one observes the row as still live.

use sqlx::PgPool;
use uuid::Uuid;

use agora_core::error::{AppError, ErrorKind};
use agora_core::result::AppResult;
use agora_entity::token::{CreateRefreshToken, RefreshToken};

/// Repository for rotation credential persistence.
#[derive(Debug, Clone)]
pub struct RefreshTokenRepository {
    pool: PgPool,
}

impl RefreshTokenRepository {
    /// Create a new refresh token repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Store a newly issued credential.
    pub async fn create(&self, data: &CreateRefreshToken) -> AppResult<RefreshToken> {
        sqlx::query_as::<_, RefreshToken>(
            "INSERT INTO refresh_tokens (user_id, session_id, token_hash, expires_at, device_fingerprint, user_agent, ip_address) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(data.user_id)
        .bind(data.session_id)
        .bind(&data.token_hash)
        .bind(data.expires_at)
        .bind(&data.device_fingerprint)
        .bind(&data.user_agent)
        .bind(&data.ip_address)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to store refresh token", e)
        })
    }

    /// Find a credential by the hash of its token value.
    pub async fn find_by_token_hash(&self, token_hash: &str) -> AppResult<Option<RefreshToken>> {
        sqlx::query_as::<_, RefreshToken>("SELECT * FROM refresh_tokens WHERE token_hash = $1")
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find refresh token", e)
            })
    }

    /// Atomically claim a credential for rotation and replace it.
    ///
    /// In one transaction: revoke the presented credential iff it is still
    /// live (the claim), revoke any other live credentials for the session,
    /// and insert the successor. Returns `None` when the claim finds the
    /// row already revoked — the concurrent-rotation loser.
    pub async fn rotate(
        &self,
        old_id: Uuid,
        successor: &CreateRefreshToken,
    ) -> AppResult<Option<RefreshToken>> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let claimed = sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = NOW() WHERE id = $1 AND revoked_at IS NULL",
        )
        .bind(old_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to claim refresh token", e)
        })?;

        if claimed.rows_affected() == 0 {
            tx.rollback().await.map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to roll back claim", e)
            })?;
            return Ok(None);
        }

        sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = NOW() \
             WHERE session_id = $1 AND revoked_at IS NULL",
        )
        .bind(successor.session_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to revoke sibling tokens", e)
        })?;

        let created = sqlx::query_as::<_, RefreshToken>(
            "INSERT INTO refresh_tokens (user_id, session_id, token_hash, expires_at, device_fingerprint, user_agent, ip_address) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(successor.user_id)
        .bind(successor.session_id)
        .bind(&successor.token_hash)
        .bind(successor.expires_at)
        .bind(&successor.device_fingerprint)
        .bind(&successor.user_agent)
        .bind(&successor.ip_address)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to insert successor token", e)
        })?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit rotation", e)
        })?;

        Ok(Some(created))
    }

    /// Revoke a single credential by ID.
    pub async fn revoke(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = NOW() WHERE id = $1 AND revoked_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to revoke refresh token", e)
        })?;
        Ok(result.rows_affected() > 0)
    }

    /// Revoke every live credential for a session.
    pub async fn revoke_for_session(&self, session_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = NOW() \
             WHERE session_id = $1 AND revoked_at IS NULL",
        )
        .bind(session_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to revoke session tokens", e)
        })?;
        Ok(result.rows_affected())
    }

    /// Revoke every live credential for a user.
    pub async fn revoke_for_user(&self, user_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = NOW() \
             WHERE user_id = $1 AND revoked_at IS NULL",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to revoke user tokens", e)
        })?;
        Ok(result.rows_affected())
    }

    /// Count distinct source addresses that produced rotation or issuance
    /// events for a session inside the rolling window. Datastore-backed on
    /// purpose: no in-process counters, so the check holds across replicas.
    pub async fn count_distinct_sources(
        &self,
        session_id: Uuid,
        window_minutes: u64,
    ) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(DISTINCT ip_address) FROM refresh_tokens \
             WHERE session_id = $1 AND ip_address IS NOT NULL \
             AND created_at > NOW() - make_interval(mins => $2)",
        )
        .bind(session_id)
        .bind(window_minutes as i32)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to count source addresses", e)
        })?;
        Ok(count)
    }
}
