//! External identity provider configuration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// External identity provider configuration, keyed by provider name
/// (e.g. `"google"`, `"github"`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OAuthConfig {
    /// Configured providers. An empty map disables external login.
    #[serde(default)]
    pub providers: HashMap<String, OAuthProviderConfig>,
}

/// A single external identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthProviderConfig {
    /// OAuth client ID.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// Authorization endpoint the user is redirected to.
    pub auth_url: String,
    /// Token exchange endpoint.
    pub token_url: String,
    /// Userinfo endpoint queried with the exchanged token.
    pub userinfo_url: String,
    /// Redirect URL registered with the provider.
    pub redirect_url: String,
    /// Scopes requested at authorization.
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
}

fn default_scopes() -> Vec<String> {
    vec!["openid".to_string(), "email".to_string(), "profile".to_string()]
}
