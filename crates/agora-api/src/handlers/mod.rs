//! Route handlers organized by domain.

pub mod admin;
pub mod auth;
pub mod health;
pub mod oauth;
pub mod password_reset;
pub mod session;
pub mod twofactor;

use agora_core::error::AppError;
use validator::Validate;

/// Run derive-based validation on a request body.
pub(crate) fn validate_body<T: Validate>(body: &T) -> Result<(), AppError> {
    body.validate()
        .map_err(|e| AppError::validation(e.to_string()))
}
