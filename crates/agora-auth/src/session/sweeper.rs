//! Expired session sweep.

use std::sync::Arc;

use tracing::info;

use agora_core::error::AppError;
use agora_database::repositories::session::SessionRepository;

/// Marks expired sessions inactive and revokes credentials left dangling
/// under them. Storage hygiene only: validation already treats expired
/// sessions as invalid, so the sweep is idempotent and safe to run
/// concurrently with live traffic.
#[derive(Clone)]
pub struct SessionSweeper {
    /// Session repository.
    session_repo: Arc<SessionRepository>,
}

impl std::fmt::Debug for SessionSweeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSweeper").finish()
    }
}

impl SessionSweeper {
    /// Creates a new sweeper.
    pub fn new(session_repo: Arc<SessionRepository>) -> Self {
        Self { session_repo }
    }

    /// Runs one sweep cycle. Returns the number of sessions marked inactive.
    pub async fn run_sweep(&self) -> Result<u64, AppError> {
        let swept = self.session_repo.sweep_expired().await?;
        if swept > 0 {
            info!(swept = swept, "Expired sessions swept");
        }
        Ok(swept)
    }
}
