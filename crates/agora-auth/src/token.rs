//! Opaque token generation, hashing, and constant-time comparison.
//!
//! Credentials are never stored verbatim: the datastore holds SHA-256
//! digests and every comparison against a stored digest is constant-time.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::Rng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Size of opaque tokens in bytes (256 bits of entropy).
pub const OPAQUE_TOKEN_BYTES: usize = 32;

/// Number of digits in a password reset code.
pub const RESET_CODE_DIGITS: u32 = 6;

/// Generate an opaque token: 32 random bytes, URL-safe base64 encoded.
/// The resulting string is 43 characters long.
pub fn generate_opaque_token() -> String {
    let mut bytes = [0u8; OPAQUE_TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Generate a zero-padded numeric reset code.
pub fn generate_reset_code() -> String {
    let mut bytes = [0u8; 4];
    rand::rng().fill_bytes(&mut bytes);
    let n = u32::from_be_bytes(bytes) % 10u32.pow(RESET_CODE_DIGITS);
    format!("{n:06}")
}

/// Hash a token using SHA-256 and return the hex digest.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Verify a token against a stored digest in constant time.
pub fn verify_token_hash(presented: &str, stored_hash: &str) -> bool {
    let presented_hash = hash_token(presented);
    presented_hash
        .as_bytes()
        .ct_eq(stored_hash.as_bytes())
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opaque_tokens_are_unique_and_long() {
        let a = generate_opaque_token();
        let b = generate_opaque_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
    }

    #[test]
    fn test_reset_code_is_six_digits() {
        for _ in 0..32 {
            let code = generate_reset_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_hash_verify_roundtrip() {
        let token = generate_opaque_token();
        let hash = hash_token(&token);
        assert!(verify_token_hash(&token, &hash));
        assert!(!verify_token_hash("something-else", &hash));
    }
}
