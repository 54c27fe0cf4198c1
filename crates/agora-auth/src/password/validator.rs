//! Password policy enforcement for new passwords.

use agora_core::config::auth::AuthConfig;
use agora_core::error::AppError;

/// Validates password strength against configured policies.
#[derive(Debug, Clone)]
pub struct PasswordValidator {
    /// Minimum password length.
    min_length: usize,
}

impl PasswordValidator {
    /// Creates a new validator from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            min_length: config.password_min_length,
        }
    }

    /// Validates a password against all configured policies.
    ///
    /// Returns `Ok(())` if the password meets all requirements,
    /// or an error describing the first violation found.
    pub fn validate(&self, password: &str) -> Result<(), AppError> {
        if password.len() < self.min_length {
            return Err(AppError::validation(format!(
                "Password must be at least {} characters long",
                self.min_length
            )));
        }

        if !password.chars().any(|c| c.is_uppercase()) {
            return Err(AppError::validation(
                "Password must contain at least one uppercase letter",
            ));
        }

        if !password.chars().any(|c| c.is_lowercase()) {
            return Err(AppError::validation(
                "Password must contain at least one lowercase letter",
            ));
        }

        if !password.chars().any(|c| c.is_ascii_digit()) {
            return Err(AppError::validation(
                "Password must contain at least one digit",
            ));
        }

        // Entropy backstop: reject only passwords zxcvbn places among the
        // most common. The character-class rules above carry the policy.
        let estimate = zxcvbn::zxcvbn(password, &[]);
        if estimate.score() == zxcvbn::Score::Zero {
            return Err(AppError::validation(
                "Password is too common. Please choose a less guessable password.",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> PasswordValidator {
        PasswordValidator::new(&AuthConfig::default())
    }

    #[test]
    fn test_rejects_short_password() {
        assert!(validator().validate("Ab1!").is_err());
    }

    #[test]
    fn test_rejects_missing_character_classes() {
        assert!(validator().validate("alllowercase1").is_err());
        assert!(validator().validate("ALLUPPERCASE1").is_err());
        assert!(validator().validate("NoDigitsHere").is_err());
    }

    #[test]
    fn test_accepts_reasonable_password() {
        assert!(validator().validate("Tr4vel-plaza-88").is_ok());
    }
}
