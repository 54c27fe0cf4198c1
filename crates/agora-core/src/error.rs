//! Unified application error types for Agora.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
///
/// The credential-facing kinds mirror the security taxonomy: anything the
/// caller could use to enumerate accounts or learn why trust was withdrawn
/// must collapse to a generic message at the HTTP boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// Login failed. The message is identical for unknown accounts and
    /// wrong passwords.
    InvalidCredential,
    /// The account requires a second factor and none was supplied yet.
    /// Soft and retryable.
    SecondFactorRequired,
    /// A second-factor code was supplied and did not verify.
    SecondFactorInvalid,
    /// The account exists but has been deactivated.
    AccountDisabled,
    /// The session is missing, expired, revoked, or its bound credential
    /// does not match.
    SessionInvalid,
    /// A revoked rotation credential was presented again. Treated as a
    /// security signal, not a retry case.
    CredentialReuse,
    /// A password reset code did not verify.
    ResetCodeInvalid,
    /// A password reset code has expired.
    ResetCodeExpired,
    /// The attempt budget for a password reset code is exhausted.
    ResetCodeAttemptsExceeded,
    /// The caller is authenticated but lacks the required access tier.
    Forbidden,
    /// The requested resource was not found.
    NotFound,
    /// Input validation failed.
    Validation,
    /// A conflict occurred (duplicate entry, concurrent modification, etc.).
    Conflict,
    /// A database error occurred.
    Database,
    /// A configuration error occurred.
    Configuration,
    /// An external identity provider call failed.
    ExternalService,
    /// An internal server error occurred.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCredential => write!(f, "INVALID_CREDENTIAL"),
            Self::SecondFactorRequired => write!(f, "SECOND_FACTOR_REQUIRED"),
            Self::SecondFactorInvalid => write!(f, "SECOND_FACTOR_INVALID"),
            Self::AccountDisabled => write!(f, "ACCOUNT_DISABLED"),
            Self::SessionInvalid => write!(f, "SESSION_INVALID"),
            Self::CredentialReuse => write!(f, "CREDENTIAL_REUSE"),
            Self::ResetCodeInvalid => write!(f, "RESET_CODE_INVALID"),
            Self::ResetCodeExpired => write!(f, "RESET_CODE_EXPIRED"),
            Self::ResetCodeAttemptsExceeded => write!(f, "RESET_CODE_ATTEMPTS_EXCEEDED"),
            Self::Forbidden => write!(f, "FORBIDDEN"),
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Conflict => write!(f, "CONFLICT"),
            Self::Database => write!(f, "DATABASE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::ExternalService => write!(f, "EXTERNAL_SERVICE"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified application error used throughout Agora.
///
/// All crate-specific errors are mapped into `AppError` using `From` impls
/// or explicit `.map_err()` calls. This provides a single error type for
/// the entire application boundary.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// The uniform login failure. The message never distinguishes an
    /// unknown account from a wrong password.
    pub fn invalid_credential() -> Self {
        Self::new(ErrorKind::InvalidCredential, "Invalid email or password")
    }

    /// Create a second-factor-required error.
    pub fn second_factor_required() -> Self {
        Self::new(
            ErrorKind::SecondFactorRequired,
            "A second factor is required to complete login",
        )
    }

    /// Create a second-factor-invalid error.
    pub fn second_factor_invalid() -> Self {
        Self::new(ErrorKind::SecondFactorInvalid, "Invalid second-factor code")
    }

    /// Create an account-disabled error.
    pub fn account_disabled() -> Self {
        Self::new(ErrorKind::AccountDisabled, "Account is deactivated")
    }

    /// The uniform session failure returned whenever a request cannot be
    /// authenticated, whatever the underlying reason.
    pub fn session_invalid() -> Self {
        Self::new(
            ErrorKind::SessionInvalid,
            "Session is expired or invalid; please authenticate again",
        )
    }

    /// Create a credential-reuse error.
    pub fn credential_reuse(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CredentialReuse, message)
    }

    /// Create a forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an external-service error.
    pub fn external_service(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ExternalService, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Internal,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

/// Standard API error response body.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ApiErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
}

/// HTTP mapping for `AppError`.
///
/// This is where the enumeration-resistance policy is enforced:
/// credential-reuse detections are logged with full context but reach the
/// caller as the same generic session failure as any other rejection, and
/// internal failures never leak their message.
impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        let (status, error_code, message) = match &self.kind {
            ErrorKind::Validation => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                self.message.clone(),
            ),
            ErrorKind::InvalidCredential => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIAL",
                self.message.clone(),
            ),
            ErrorKind::SecondFactorRequired => (
                StatusCode::UNAUTHORIZED,
                "SECOND_FACTOR_REQUIRED",
                self.message.clone(),
            ),
            ErrorKind::SecondFactorInvalid => (
                StatusCode::UNAUTHORIZED,
                "SECOND_FACTOR_INVALID",
                self.message.clone(),
            ),
            ErrorKind::SessionInvalid => (
                StatusCode::UNAUTHORIZED,
                "SESSION_INVALID",
                self.message.clone(),
            ),
            // A security signal, not a client hint: the caller sees the
            // same generic rejection as any expired session and never
            // learns why it was logged out.
            ErrorKind::CredentialReuse => {
                tracing::warn!(
                    detail = %self.message,
                    "Credential reuse surfaced to client as generic session error"
                );
                (
                    StatusCode::UNAUTHORIZED,
                    "SESSION_INVALID",
                    "Session is expired or invalid; please authenticate again".to_string(),
                )
            }
            ErrorKind::AccountDisabled => (
                StatusCode::FORBIDDEN,
                "ACCOUNT_DISABLED",
                self.message.clone(),
            ),
            ErrorKind::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN", self.message.clone()),
            ErrorKind::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND", self.message.clone()),
            ErrorKind::Conflict => (StatusCode::CONFLICT, "CONFLICT", self.message.clone()),
            ErrorKind::ResetCodeInvalid => (
                StatusCode::BAD_REQUEST,
                "RESET_CODE_INVALID",
                self.message.clone(),
            ),
            ErrorKind::ResetCodeExpired => (
                StatusCode::BAD_REQUEST,
                "RESET_CODE_EXPIRED",
                self.message.clone(),
            ),
            ErrorKind::ResetCodeAttemptsExceeded => (
                StatusCode::BAD_REQUEST,
                "RESET_CODE_ATTEMPTS_EXCEEDED",
                self.message.clone(),
            ),
            ErrorKind::Database
            | ErrorKind::Configuration
            | ErrorKind::ExternalService
            | ErrorKind::Internal => {
                tracing::error!(error = %self, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ApiErrorResponse {
            error: error_code.to_string(),
            message,
        };

        (status, axum::Json(body)).into_response()
    }
}
