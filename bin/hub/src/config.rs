//! Centralized hub configuration.
//!
//! Loaded via the `config` crate from environment variables, with `__`
//! separating nested keys (`AUTH__URL`, `STORAGE__BUCKET`, ...).
//!
//! See [`ProviderConfig`](luminarch_platform_access::ProviderConfig) for
//! identity provider settings.

use luminarch_platform_access::ProviderConfig;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Hub configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct HubConfig {
    /// PostgreSQL database connection URL.
    pub database_url: String,

    /// Identity provider configuration.
    pub auth: ProviderConfig,

    /// Object storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Timeout for every HTTP request, in seconds.
    #[serde(default = "default_http_timeout_seconds")]
    pub http_timeout_seconds: u64,

    /// Where the session is kept between runs.
    #[serde(default = "default_session_file")]
    pub session_file: PathBuf,

    /// Form endpoint notified of new sign-ups. Disabled when unset.
    #[serde(default)]
    pub signup_webhook_url: Option<String>,
}

/// Object storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Bucket holding ticket attachments.
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Lifetime of download links, in seconds.
    #[serde(default = "default_signed_url_ttl_seconds")]
    pub signed_url_ttl_seconds: u64,
}

fn default_bucket() -> String {
    "ticket-files".to_string()
}

fn default_signed_url_ttl_seconds() -> u64 {
    300
}

fn default_http_timeout_seconds() -> u64 {
    30
}

fn default_session_file() -> PathBuf {
    PathBuf::from(".luminarch-session.json")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
            signed_url_ttl_seconds: default_signed_url_ttl_seconds(),
        }
    }
}

impl StorageConfig {
    #[must_use]
    pub fn signed_url_ttl(&self) -> Duration {
        Duration::from_secs(self.signed_url_ttl_seconds)
    }
}

impl HubConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    #[must_use]
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_config_has_correct_defaults() {
        let config = StorageConfig::default();
        assert_eq!(config.bucket, "ticket-files");
        assert_eq!(config.signed_url_ttl(), Duration::from_secs(300));
    }

    #[test]
    fn optional_settings_fall_back_to_defaults() {
        let config: HubConfig = serde_json::from_value(serde_json::json!({
            "database_url": "postgres://localhost/hub",
            "auth": { "url": "https://hub.example.co", "anon_key": "anon" }
        }))
        .unwrap();

        assert_eq!(config.http_timeout(), Duration::from_secs(30));
        assert_eq!(config.session_file, PathBuf::from(".luminarch-session.json"));
        assert_eq!(config.storage.bucket, "ticket-files");
        assert!(config.signup_webhook_url.is_none());
        assert!(config.auth.redirect_url().is_none());
    }
}
