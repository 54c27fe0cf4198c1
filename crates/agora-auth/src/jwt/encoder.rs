//! Signed credential creation with configurable TTLs.

use chrono::{DateTime, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use agora_core::config::auth::AuthConfig;
use agora_core::error::AppError;
use agora_entity::user::User;

use super::claims::{Claims, TokenType};

/// Creates signed access and rotation credentials.
#[derive(Clone)]
pub struct JwtEncoder {
    /// HMAC secret key for signing.
    encoding_key: EncodingKey,
    /// Access token TTL in minutes.
    access_ttl_minutes: i64,
    /// Refresh token TTL in hours.
    refresh_ttl_hours: i64,
}

impl std::fmt::Debug for JwtEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtEncoder")
            .field("access_ttl_minutes", &self.access_ttl_minutes)
            .field("refresh_ttl_hours", &self.refresh_ttl_hours)
            .finish()
    }
}

/// A freshly signed credential and its expiry.
#[derive(Debug, Clone)]
pub struct SignedToken {
    /// The raw signed token string.
    pub token: String,
    /// Expiration timestamp.
    pub expires_at: DateTime<Utc>,
    /// The unique nonce embedded in the token.
    pub jti: Uuid,
}

impl JwtEncoder {
    /// Creates a new encoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            access_ttl_minutes: config.jwt_access_ttl_minutes as i64,
            refresh_ttl_hours: config.jwt_refresh_ttl_hours as i64,
        }
    }

    /// Generates a short-lived access credential for the given user and session.
    pub fn generate_access(&self, user: &User, session_id: Uuid) -> Result<SignedToken, AppError> {
        let ttl = chrono::Duration::minutes(self.access_ttl_minutes);
        self.generate(user, session_id, TokenType::Access, ttl)
    }

    /// Generates a rotation credential for the given user and session.
    pub fn generate_refresh(&self, user: &User, session_id: Uuid) -> Result<SignedToken, AppError> {
        let ttl = chrono::Duration::hours(self.refresh_ttl_hours);
        self.generate(user, session_id, TokenType::Refresh, ttl)
    }

    fn generate(
        &self,
        user: &User,
        session_id: Uuid,
        token_type: TokenType,
        ttl: chrono::Duration,
    ) -> Result<SignedToken, AppError> {
        let now = Utc::now();
        let expires_at = now + ttl;
        let jti = Uuid::new_v4();

        let claims = Claims {
            sub: user.id,
            sid: session_id,
            tier: user.tier,
            email: user.email.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti,
            token_type,
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to encode token: {e}")))?;

        Ok(SignedToken {
            token,
            expires_at,
            jti,
        })
    }
}
