//! Device fingerprint derivation from request metadata.
//!
//! The fingerprint is a weak secondary binding signal, never an
//! authentication factor on its own.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Request metadata captured at credential issuance and validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceMeta {
    /// Source IP address.
    pub ip_address: Option<String>,
    /// User-Agent header value.
    pub user_agent: Option<String>,
}

impl DeviceMeta {
    /// Creates device metadata from the raw request parts.
    pub fn new(ip_address: Option<String>, user_agent: Option<String>) -> Self {
        Self {
            ip_address,
            user_agent,
        }
    }

    /// Derive a fingerprint from user agent and address.
    ///
    /// Returns `None` when neither input is present — an absent
    /// fingerprint must not accidentally compare equal to another
    /// absent fingerprint downstream.
    pub fn fingerprint(&self) -> Option<String> {
        if self.ip_address.is_none() && self.user_agent.is_none() {
            return None;
        }
        let mut hasher = Sha256::new();
        hasher.update(self.user_agent.as_deref().unwrap_or(""));
        hasher.update(b"|");
        hasher.update(self.ip_address.as_deref().unwrap_or(""));
        Some(hex::encode(hasher.finalize()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_inputs_same_fingerprint() {
        let a = DeviceMeta::new(Some("1.2.3.4".into()), Some("Mozilla/5.0".into()));
        let b = DeviceMeta::new(Some("1.2.3.4".into()), Some("Mozilla/5.0".into()));
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_different_address_different_fingerprint() {
        let a = DeviceMeta::new(Some("1.2.3.4".into()), Some("Mozilla/5.0".into()));
        let b = DeviceMeta::new(Some("5.6.7.8".into()), Some("Mozilla/5.0".into()));
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_empty_meta_has_no_fingerprint() {
        assert_eq!(DeviceMeta::default().fingerprint(), None);
    }
}
