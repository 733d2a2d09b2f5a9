//! Relay configuration
//!
//! Resolved once at startup (CLI → ENV → TOML → default) into an immutable
//! [`RelayConfig`] that is handed to the router and the upstream client.

use nh_common::config::{normalize_base_url, resolve_setting, resolve_string, RelayToml};
use nh_common::{Error, Result};
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_UPSTREAM_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_UPSTREAM_MODEL: &str = "meta-llama/llama-3.2-11b-vision-instruct";
pub const DEFAULT_APP_NAME: &str = "Not Hamburger";
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_KEEPALIVE_MINUTES: u64 = 14;
/// Largest accepted request body (10 MB)
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Environment variable names
pub mod env {
    pub const PORT: &str = "PORT";
    pub const BIND_ADDR: &str = "NH_BIND_ADDR";
    pub const API_KEY: &str = "OPENROUTER_API_KEY";
    pub const UPSTREAM_URL: &str = "NH_UPSTREAM_URL";
    pub const UPSTREAM_MODEL: &str = "NH_UPSTREAM_MODEL";
    pub const DEPLOYMENT: &str = "NH_DEPLOYMENT";
    pub const PUBLIC_URL: &str = "NH_PUBLIC_URL";
    pub const APP_NAME: &str = "NH_APP_NAME";
    pub const UPSTREAM_TIMEOUT_SECS: &str = "NH_UPSTREAM_TIMEOUT_SECS";
    pub const KEEPALIVE_MINUTES: &str = "NH_KEEPALIVE_MINUTES";
}

/// Where the relay is running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeploymentMode {
    #[default]
    Development,
    Production,
}

impl FromStr for DeploymentMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(DeploymentMode::Development),
            "production" | "prod" => Ok(DeploymentMode::Production),
            other => Err(format!(
                "unknown deployment mode '{}' (expected development or production)",
                other
            )),
        }
    }
}

impl fmt::Display for DeploymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeploymentMode::Development => f.write_str("development"),
            DeploymentMode::Production => f.write_str("production"),
        }
    }
}

/// Values supplied on the command line; `None` defers to the lower tiers
#[derive(Debug, Clone, Default)]
pub struct RelayOverrides {
    pub port: Option<u16>,
    pub bind_addr: Option<String>,
    pub api_key: Option<String>,
    pub upstream_url: Option<String>,
    pub upstream_model: Option<String>,
    pub deployment: Option<DeploymentMode>,
    pub public_url: Option<String>,
}

/// Immutable relay configuration
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub bind_addr: String,
    pub port: u16,
    /// Upstream bearer credential; requests fail with 500 while unset
    pub api_key: Option<String>,
    pub upstream_url: String,
    pub upstream_model: String,
    pub upstream_timeout: Duration,
    pub deployment: DeploymentMode,
    /// Externally reachable base URL; keep-alive target and default referer
    pub public_url: String,
    pub app_name: String,
    pub keepalive_interval: Duration,
    pub max_body_bytes: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            port: DEFAULT_PORT,
            api_key: None,
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
            upstream_model: DEFAULT_UPSTREAM_MODEL.to_string(),
            upstream_timeout: Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
            deployment: DeploymentMode::Development,
            public_url: local_url(DEFAULT_PORT),
            app_name: DEFAULT_APP_NAME.to_string(),
            keepalive_interval: nh_common::time::minutes_to_duration(DEFAULT_KEEPALIVE_MINUTES),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl RelayConfig {
    /// Resolve every setting from overrides, environment and the `[relay]` TOML section
    pub fn resolve(overrides: RelayOverrides, toml: &RelayToml) -> Result<Self> {
        let port = resolve_setting(overrides.port, env::PORT, toml.port)?.unwrap_or(DEFAULT_PORT);

        let deployment = match overrides.deployment {
            Some(mode) => mode,
            None => resolve_string(None, env::DEPLOYMENT, toml.deployment.clone())
                .map(|raw| raw.parse::<DeploymentMode>().map_err(Error::Config))
                .transpose()?
                .unwrap_or_default(),
        };

        let timeout_secs = resolve_setting(None, env::UPSTREAM_TIMEOUT_SECS, toml.upstream_timeout_secs)?
            .unwrap_or(DEFAULT_UPSTREAM_TIMEOUT_SECS);
        let keepalive_minutes =
            resolve_setting(None, env::KEEPALIVE_MINUTES, toml.keepalive_interval_minutes)?
                .unwrap_or(DEFAULT_KEEPALIVE_MINUTES);
        if keepalive_minutes == 0 {
            return Err(Error::Config("keep-alive interval must be at least one minute".to_string()));
        }

        let public_url = resolve_string(overrides.public_url, env::PUBLIC_URL, toml.public_url.clone())
            .map(|url| normalize_base_url(&url))
            .unwrap_or_else(|| local_url(port));

        Ok(Self {
            bind_addr: resolve_string(overrides.bind_addr, env::BIND_ADDR, toml.bind_addr.clone())
                .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            port,
            api_key: resolve_string(overrides.api_key, env::API_KEY, toml.api_key.clone()),
            upstream_url: resolve_string(
                overrides.upstream_url,
                env::UPSTREAM_URL,
                toml.upstream_url.clone(),
            )
            .unwrap_or_else(|| DEFAULT_UPSTREAM_URL.to_string()),
            upstream_model: resolve_string(
                overrides.upstream_model,
                env::UPSTREAM_MODEL,
                toml.upstream_model.clone(),
            )
            .unwrap_or_else(|| DEFAULT_UPSTREAM_MODEL.to_string()),
            upstream_timeout: Duration::from_secs(timeout_secs),
            deployment,
            public_url,
            app_name: resolve_string(None, env::APP_NAME, toml.app_name.clone())
                .unwrap_or_else(|| DEFAULT_APP_NAME.to_string()),
            keepalive_interval: nh_common::time::minutes_to_duration(keepalive_minutes),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.bind_addr, self.port)
            .parse::<SocketAddr>()
            .map_err(|e| Error::Config(format!("Invalid bind address {}:{}: {}", self.bind_addr, self.port, e)))
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    /// Health endpoint the keep-alive task pings
    pub fn keepalive_url(&self) -> String {
        format!("{}/health", normalize_base_url(&self.public_url))
    }
}

fn local_url(port: u16) -> String {
    format!("http://localhost:{}", port)
}
