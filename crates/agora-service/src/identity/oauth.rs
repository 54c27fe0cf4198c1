//! External identity provider protocol.
//!
//! A deliberately plain two-step exchange per provider: build a redirect
//! URL carrying opaque correlation state, then resolve the callback code
//! into a profile. No strategy objects, no plugin registry — one struct,
//! two methods.

use std::collections::HashMap;

use serde::Deserialize;
use tracing::debug;

use agora_core::config::oauth::{OAuthConfig, OAuthProviderConfig};
use agora_core::error::AppError;

/// A profile asserted by an external identity provider.
#[derive(Debug, Clone)]
pub struct ExternalProfile {
    /// Provider name the profile came from.
    pub provider: String,
    /// Provider-scoped stable subject identifier.
    pub subject: String,
    /// Asserted email address.
    pub email: String,
    /// Display name, if the provider carries one.
    pub display_name: Option<String>,
    /// Avatar URL, if the provider carries one.
    pub avatar_url: Option<String>,
}

/// Token endpoint response. Only the access token matters here.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Userinfo endpoint response.
///
/// Providers disagree on field names; the aliases and defaulting rules
/// live here and nowhere else. `sub` falls back to `id`, `picture` to
/// `avatar_url`, and a missing display name stays absent.
#[derive(Debug, Deserialize)]
struct UserInfoResponse {
    sub: Option<String>,
    id: Option<serde_json::Value>,
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
    avatar_url: Option<String>,
}

/// One configured external identity provider.
#[derive(Debug, Clone)]
pub struct OAuthProvider {
    /// Provider name (registry key).
    name: String,
    /// Endpoint and client configuration.
    config: OAuthProviderConfig,
    /// Shared HTTP client.
    http: reqwest::Client,
}

impl OAuthProvider {
    /// Creates a provider from configuration.
    pub fn new(name: String, config: OAuthProviderConfig, http: reqwest::Client) -> Self {
        Self { name, config, http }
    }

    /// Provider name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Step 1: build the authorization redirect URL carrying the opaque
    /// correlation state.
    pub fn authorize_url(&self, state: &str) -> Result<String, AppError> {
        let url = reqwest::Url::parse_with_params(
            &self.config.auth_url,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_url.as_str()),
                ("response_type", "code"),
                ("scope", &self.config.scopes.join(" ")),
                ("state", state),
            ],
        )
        .map_err(|e| AppError::configuration(format!("Invalid provider auth URL: {e}")))?;
        Ok(url.to_string())
    }

    /// Step 2: resolve the callback code into a profile — exchange the
    /// code at the token endpoint, then fetch userinfo with the result.
    pub async fn resolve_callback(&self, code: &str) -> Result<ExternalProfile, AppError> {
        let token: TokenResponse = self
            .http
            .post(&self.config.token_url)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_url.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::external_service(format!("Token exchange failed: {e}")))?
            .error_for_status()
            .map_err(|e| AppError::external_service(format!("Token exchange rejected: {e}")))?
            .json()
            .await
            .map_err(|e| AppError::external_service(format!("Malformed token response: {e}")))?;

        let info: UserInfoResponse = self
            .http
            .get(&self.config.userinfo_url)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(|e| AppError::external_service(format!("Userinfo fetch failed: {e}")))?
            .error_for_status()
            .map_err(|e| AppError::external_service(format!("Userinfo fetch rejected: {e}")))?
            .json()
            .await
            .map_err(|e| AppError::external_service(format!("Malformed userinfo response: {e}")))?;

        let subject = info
            .sub
            .or_else(|| info.id.as_ref().map(json_id_to_string))
            .ok_or_else(|| AppError::external_service("Provider returned no subject ID"))?;

        let email = info
            .email
            .ok_or_else(|| AppError::external_service("Provider returned no email"))?
            .to_lowercase();

        debug!(provider = %self.name, subject = %subject, "External callback resolved");

        Ok(ExternalProfile {
            provider: self.name.clone(),
            // Namespace the subject by provider so IDs can never collide
            // across providers.
            subject: format!("{}:{}", self.name, subject),
            email,
            display_name: info.name,
            avatar_url: info.picture.or(info.avatar_url),
        })
    }
}

/// Providers may return numeric IDs; normalize to a string.
fn json_id_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// All configured providers, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct OAuthProviderRegistry {
    providers: HashMap<String, OAuthProvider>,
}

impl OAuthProviderRegistry {
    /// Builds the registry from configuration.
    pub fn new(config: &OAuthConfig) -> Self {
        let http = reqwest::Client::new();
        let providers = config
            .providers
            .iter()
            .map(|(name, cfg)| {
                (
                    name.clone(),
                    OAuthProvider::new(name.clone(), cfg.clone(), http.clone()),
                )
            })
            .collect();
        Self { providers }
    }

    /// Looks up a provider by name.
    pub fn get(&self, name: &str) -> Option<&OAuthProvider> {
        self.providers.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> OAuthProvider {
        OAuthProvider::new(
            "acme".to_string(),
            OAuthProviderConfig {
                client_id: "client-1".to_string(),
                client_secret: "secret".to_string(),
                auth_url: "https://acme.example/oauth/authorize".to_string(),
                token_url: "https://acme.example/oauth/token".to_string(),
                userinfo_url: "https://acme.example/oauth/userinfo".to_string(),
                redirect_url: "https://agora.example/api/auth/oauth/acme/callback".to_string(),
                scopes: vec!["openid".to_string(), "email".to_string()],
            },
            reqwest::Client::new(),
        )
    }

    #[test]
    fn test_authorize_url_carries_state_and_client() {
        let url = provider().authorize_url("opaque-state-123").unwrap();
        assert!(url.starts_with("https://acme.example/oauth/authorize?"));
        assert!(url.contains("state=opaque-state-123"));
        assert!(url.contains("client_id=client-1"));
        assert!(url.contains("response_type=code"));
    }

    #[test]
    fn test_json_id_normalization() {
        assert_eq!(json_id_to_string(&serde_json::json!("abc")), "abc");
        assert_eq!(json_id_to_string(&serde_json::json!(12345)), "12345");
    }
}
