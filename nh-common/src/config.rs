//! Configuration file loading and setting resolution
//!
//! Every process builds one immutable configuration object at startup. Each
//! setting is resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing config file is not an error: a warning is logged and defaults
//! apply. A config file that exists but cannot be parsed is.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "NH_CONFIG";

/// Directory name under the platform config dir
const CONFIG_DIR_NAME: &str = "not-hamburger";

const CONFIG_FILE_NAME: &str = "config.toml";

/// Contents of `config.toml`
///
/// Both binaries read the same file; each only looks at its own section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub relay: RelayToml,

    #[serde(default)]
    pub client: ClientToml,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// `[relay]` section
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RelayToml {
    pub port: Option<u16>,
    pub bind_addr: Option<String>,
    pub api_key: Option<String>,
    pub upstream_url: Option<String>,
    pub upstream_model: Option<String>,
    /// `development` or `production`
    pub deployment: Option<String>,
    pub public_url: Option<String>,
    pub app_name: Option<String>,
    pub upstream_timeout_secs: Option<u64>,
    pub keepalive_interval_minutes: Option<u64>,
}

/// `[client]` section
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientToml {
    pub api_base_url: Option<String>,
    pub share_url: Option<String>,
    pub app_name: Option<String>,
    pub max_upload_bytes: Option<usize>,
}

/// Locate the config file
///
/// Order: explicit path, `NH_CONFIG`, user config dir, then
/// `/etc/not-hamburger/config.toml` on Linux. Implicit locations are only
/// returned when they exist.
pub fn config_file_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Some(path) = env_value(CONFIG_ENV_VAR) {
        return Some(PathBuf::from(path));
    }

    let user_config = dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc").join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME);
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Load the TOML config, falling back to defaults when there is none
pub fn load_toml_config(path: Option<&Path>) -> Result<TomlConfig> {
    let Some(path) = path else {
        warn!("No config file found, using defaults");
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        warn!("Config file not found: {}, using defaults", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))?;

    info!("Loaded config file: {}", path.display());
    Ok(config)
}

/// Resolve one setting: CLI → environment → TOML
///
/// Blank strings at any tier count as unset. Returns `Ok(None)` when no tier
/// provides a value; an environment value that does not parse is an error.
pub fn resolve_setting<T>(cli: Option<T>, env_var: &str, toml: Option<T>) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if cli.is_some() {
        return Ok(cli);
    }

    if let Some(raw) = env_value(env_var) {
        return raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", env_var, e)));
    }

    Ok(toml)
}

/// [`resolve_setting`] for strings, dropping blank values from CLI and TOML too
pub fn resolve_string(cli: Option<String>, env_var: &str, toml: Option<String>) -> Option<String> {
    non_blank(cli)
        .or_else(|| env_value(env_var))
        .or_else(|| non_blank(toml))
}

/// Read an environment variable, treating blank values as unset
pub fn env_value(name: &str) -> Option<String> {
    non_blank(std::env::var(name).ok())
}

/// Validate a credential-like value (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| is_valid_key(v))
}

/// Strip trailing slashes from a base URL
pub fn normalize_base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}
