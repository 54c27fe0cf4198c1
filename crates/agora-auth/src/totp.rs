//! Time-based one-time codes and recovery codes.
//!
//! Standard 30-second-window TOTP (SHA-1, 6 digits) with a ±2-step
//! clock-skew tolerance. Secrets are handled base32-encoded; recovery
//! codes are stored as SHA-256 digests and consumed at most once.

use rand::Rng;
use totp_rs::{Algorithm, Secret, TOTP};

use agora_core::error::AppError;

use crate::token::hash_token;

/// TOTP secret length in bytes (160 bits).
const SECRET_LENGTH: usize = 20;

/// Accepted steps on either side of the current window.
const SKEW_STEPS: u8 = 2;

/// Window step in seconds.
const STEP_SECONDS: u64 = 30;

/// Number of recovery codes generated at enrollment.
pub const RECOVERY_CODE_COUNT: usize = 10;

/// Length of a recovery code in characters.
const RECOVERY_CODE_LENGTH: usize = 12;

const RECOVERY_CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Generate a fresh base32-encoded TOTP secret.
pub fn generate_secret() -> String {
    let mut bytes = vec![0u8; SECRET_LENGTH];
    rand::rng().fill_bytes(&mut bytes);
    Secret::Raw(bytes).to_encoded().to_string()
}

/// Build the otpauth:// provisioning URI for an enrolled secret.
pub fn provisioning_uri(
    secret_base32: &str,
    issuer: &str,
    account: &str,
) -> Result<String, AppError> {
    Ok(build_totp(secret_base32, issuer, account)?.get_url())
}

/// Verify a presented code against the stored secret.
///
/// Returns `Ok(true)` when the code matches the current window or any
/// window within the skew tolerance.
pub fn verify_code(secret_base32: &str, code: &str, account: &str) -> Result<bool, AppError> {
    let totp = build_totp(secret_base32, "Agora", account)?;
    totp.check_current(code)
        .map_err(|e| AppError::internal(format!("System clock error: {e}")))
}

/// Generate a set of one-time recovery codes.
///
/// Returns `(plaintext_codes, digests)` — the plaintext is shown to the
/// user exactly once, the digests are what gets stored.
pub fn generate_recovery_codes() -> (Vec<String>, Vec<String>) {
    let mut rng = rand::rng();
    let codes: Vec<String> = (0..RECOVERY_CODE_COUNT)
        .map(|_| {
            (0..RECOVERY_CODE_LENGTH)
                .map(|_| {
                    let mut byte = [0u8; 1];
                    rng.fill_bytes(&mut byte);
                    RECOVERY_CHARSET[byte[0] as usize % RECOVERY_CHARSET.len()] as char
                })
                .collect()
        })
        .collect();
    let digests = codes.iter().map(|c| hash_token(c)).collect();
    (codes, digests)
}

fn build_totp(secret_base32: &str, issuer: &str, account: &str) -> Result<TOTP, AppError> {
    let secret = Secret::Encoded(secret_base32.to_string())
        .to_bytes()
        .map_err(|e| AppError::internal(format!("Invalid TOTP secret: {e:?}")))?;

    TOTP::new(
        Algorithm::SHA1,
        6,
        SKEW_STEPS,
        STEP_SECONDS,
        secret,
        Some(issuer.to_string()),
        account.to_string(),
    )
    .map_err(|e| AppError::internal(format!("Failed to build TOTP: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_code_verifies() {
        let secret = generate_secret();
        let totp = build_totp(&secret, "Agora", "a@x.com").unwrap();
        let code = totp.generate_current().unwrap();
        assert!(verify_code(&secret, &code, "a@x.com").unwrap());
    }

    #[test]
    fn test_wrong_code_rejected() {
        let secret = generate_secret();
        let totp = build_totp(&secret, "Agora", "a@x.com").unwrap();
        let code = totp.generate_current().unwrap();
        // Flip one digit to guarantee a mismatch.
        let wrong: String = code
            .chars()
            .enumerate()
            .map(|(i, c)| {
                if i == 0 {
                    char::from_digit((c.to_digit(10).unwrap() + 1) % 10, 10).unwrap()
                } else {
                    c
                }
            })
            .collect();
        assert!(!verify_code(&secret, &wrong, "a@x.com").unwrap());
    }

    #[test]
    fn test_provisioning_uri_contains_issuer_and_account() {
        let secret = generate_secret();
        let uri = provisioning_uri(&secret, "Agora", "a@x.com").unwrap();
        assert!(uri.starts_with("otpauth://totp/"));
        assert!(uri.contains("Agora"));
    }

    #[test]
    fn test_recovery_codes_unique_and_hashed() {
        let (codes, digests) = generate_recovery_codes();
        assert_eq!(codes.len(), RECOVERY_CODE_COUNT);
        assert_eq!(digests.len(), RECOVERY_CODE_COUNT);
        let unique: std::collections::HashSet<_> = codes.iter().collect();
        assert_eq!(unique.len(), RECOVERY_CODE_COUNT);
        assert_eq!(digests[0], crate::token::hash_token(&codes[0]));
    }
}
