//! Client configuration
//!
//! Resolved once at startup (CLI → ENV → TOML → default) into an immutable
//! [`ClientConfig`].

use nh_common::config::{normalize_base_url, resolve_setting, resolve_string, ClientToml};
use nh_common::Result;

use crate::compressor::MAX_UPLOAD_BYTES;

pub const DEFAULT_API_BASE_URL: &str = "https://not.reyml.com";
pub const DEFAULT_SHARE_URL: &str = "https://not.reyml.com";
pub const DEFAULT_APP_NAME: &str = "Not Hamburger";

/// Environment variable names
pub mod env {
    pub const API_BASE_URL: &str = "NH_API_BASE_URL";
    pub const SHARE_URL: &str = "NH_SHARE_URL";
    pub const APP_NAME: &str = "NH_APP_NAME";
    pub const MAX_UPLOAD_BYTES: &str = "NH_MAX_UPLOAD_BYTES";
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct ClientOverrides {
    pub api_base_url: Option<String>,
    pub share_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Relay base URL without a trailing slash
    pub api_base_url: String,
    pub share_url: String,
    pub app_name: String,
    pub max_upload_bytes: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            share_url: DEFAULT_SHARE_URL.to_string(),
            app_name: DEFAULT_APP_NAME.to_string(),
            max_upload_bytes: MAX_UPLOAD_BYTES,
        }
    }
}

impl ClientConfig {
    pub fn resolve(overrides: ClientOverrides, toml: &ClientToml) -> Result<Self> {
        let api_base_url = resolve_string(overrides.api_base_url, env::API_BASE_URL, toml.api_base_url.clone())
            .map(|url| normalize_base_url(&url))
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        let max_upload_bytes = resolve_setting(None, env::MAX_UPLOAD_BYTES, toml.max_upload_bytes)?
            .unwrap_or(MAX_UPLOAD_BYTES);

        Ok(Self {
            api_base_url,
            share_url: resolve_string(overrides.share_url, env::SHARE_URL, toml.share_url.clone())
                .unwrap_or_else(|| DEFAULT_SHARE_URL.to_string()),
            app_name: resolve_string(None, env::APP_NAME, toml.app_name.clone())
                .unwrap_or_else(|| DEFAULT_APP_NAME.to_string()),
            max_upload_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for name in [env::API_BASE_URL, env::SHARE_URL, env::APP_NAME, env::MAX_UPLOAD_BYTES] {
            std::env::remove_var(name);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let config = ClientConfig::resolve(ClientOverrides::default(), &ClientToml::default()).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.max_upload_bytes, 6_500_000);
    }

    #[test]
    #[serial]
    fn test_trailing_slash_removed() {
        clear_env();
        std::env::set_var(env::API_BASE_URL, "http://relay.local:3000/");
        let config = ClientConfig::resolve(ClientOverrides::default(), &ClientToml::default()).unwrap();
        assert_eq!(config.api_base_url, "http://relay.local:3000");
        clear_env();
    }

    #[test]
    #[serial]
    fn test_priority() {
        clear_env();
        std::env::set_var(env::SHARE_URL, "https://env.example");
        let toml = ClientToml {
            api_base_url: Some("https://toml.example/".to_string()),
            share_url: Some("https://toml-share.example".to_string()),
            app_name: Some("Burger Check".to_string()),
            max_upload_bytes: Some(1_000_000),
        };
        let overrides = ClientOverrides {
            api_base_url: Some("http://cli.example".to_string()),
            share_url: None,
        };

        let config = ClientConfig::resolve(overrides, &toml).unwrap();

        assert_eq!(config.api_base_url, "http://cli.example");
        assert_eq!(config.share_url, "https://env.example");
        assert_eq!(config.app_name, "Burger Check");
        assert_eq!(config.max_upload_bytes, 1_000_000);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_budget_in_env() {
        clear_env();
        std::env::set_var(env::MAX_UPLOAD_BYTES, "lots");
        let result = ClientConfig::resolve(ClientOverrides::default(), &ClientToml::default());
        assert!(result.is_err());
        clear_env();
    }
}
