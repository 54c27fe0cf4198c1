//! Signed credential validation.
//!
//! The decoder is purely cryptographic: signature, expiry, and type. Whether
//! the credential is still *trusted* is the session and refresh managers'
//! concern — revocation state lives in the datastore, not in the token.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use agora_core::config::auth::AuthConfig;
use agora_core::error::AppError;

use super::claims::{Claims, TokenType};

/// Validates signed credentials.
#[derive(Clone)]
pub struct JwtDecoder {
    /// HMAC secret key for verification.
    decoding_key: DecodingKey,
    /// Validation configuration.
    validation: Validation,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtDecoder {
    /// Creates a new decoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 5; // 5 seconds leeway for clock skew
        validation.required_spec_claims.clear();

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Decodes and validates a short-lived access credential.
    pub fn decode_access(&self, token: &str) -> Result<Claims, AppError> {
        let claims = self.decode(token)?;
        if claims.token_type != TokenType::Access {
            return Err(AppError::session_invalid());
        }
        Ok(claims)
    }

    /// Decodes and validates a rotation credential.
    pub fn decode_refresh(&self, token: &str) -> Result<Claims, AppError> {
        let claims = self.decode(token)?;
        if claims.token_type != TokenType::Refresh {
            return Err(AppError::session_invalid());
        }
        Ok(claims)
    }

    /// Internal decode without type checking. Every cryptographic failure
    /// collapses to the generic session error; the caller learns nothing
    /// about which check failed.
    fn decode(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| AppError::session_invalid())
    }
}
