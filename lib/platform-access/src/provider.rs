//! Identity provider configuration.
//!
//! The hub talks to a hosted, GoTrue-compatible identity provider. All
//! requests carry the project's public (anon) key; authenticated requests
//! additionally carry the session's bearer token.

use serde::{Deserialize, Serialize};

/// Configuration for the identity provider.
///
/// Fields with defaults can be omitted when loading from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the hosted backend (e.g., "https://project.example.co").
    url: String,
    /// Public API key sent as the `apikey` header.
    anon_key: String,
    /// Where confirmation and magic-link emails send the user back to.
    #[serde(default)]
    redirect_url: Option<String>,
    /// Path prefix of the authentication API.
    /// Default: "/auth/v1"
    #[serde(default = "default_auth_path")]
    auth_path: String,
}

fn default_auth_path() -> String {
    "/auth/v1".to_string()
}

impl ProviderConfig {
    /// Creates a new provider configuration with defaults for optional fields.
    #[must_use]
    pub fn new(url: String, anon_key: String) -> Self {
        Self {
            url,
            anon_key,
            redirect_url: None,
            auth_path: default_auth_path(),
        }
    }

    /// Sets the email redirect URL.
    #[must_use]
    pub fn with_redirect_url(mut self, redirect_url: Option<String>) -> Self {
        self.redirect_url = redirect_url;
        self
    }

    /// Returns the backend base URL without a trailing slash.
    #[must_use]
    pub fn url(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    /// Returns the public API key.
    #[must_use]
    pub fn anon_key(&self) -> &str {
        &self.anon_key
    }

    /// Returns the email redirect URL, if configured.
    #[must_use]
    pub fn redirect_url(&self) -> Option<&str> {
        self.redirect_url.as_deref()
    }

    /// Returns the full URL of an authentication API endpoint.
    #[must_use]
    pub fn auth_endpoint(&self, endpoint: &str) -> String {
        format!(
            "{}/{}/{}",
            self.url(),
            self.auth_path.trim_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_uses_default_auth_path() {
        let config = ProviderConfig::new("https://hub.example.co".to_string(), "anon".to_string());
        assert_eq!(
            config.auth_endpoint("token?grant_type=password"),
            "https://hub.example.co/auth/v1/token?grant_type=password"
        );
        assert!(config.redirect_url().is_none());
    }

    #[test]
    fn trailing_slashes_are_normalized() {
        let config = ProviderConfig::new("https://hub.example.co/".to_string(), "anon".to_string());
        assert_eq!(config.url(), "https://hub.example.co");
        assert_eq!(config.auth_endpoint("/user"), "https://hub.example.co/auth/v1/user");
    }

    #[test]
    fn deserializes_with_defaults() {
        let json = r#"{"url": "https://hub.example.co", "anon_key": "anon"}"#;
        let config: ProviderConfig = serde_json::from_str(json).expect("deserialize");
        assert_eq!(config.anon_key(), "anon");
        assert_eq!(config.auth_endpoint("otp"), "https://hub.example.co/auth/v1/otp");
    }

    #[test]
    fn redirect_url_is_optional() {
        let config = ProviderConfig::new("https://hub.example.co".to_string(), "anon".to_string())
            .with_redirect_url(Some("https://luminarch.dev/dashboard.html".to_string()));
        assert_eq!(
            config.redirect_url(),
            Some("https://luminarch.dev/dashboard.html")
        );
    }
}
