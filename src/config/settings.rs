//! Configuration settings management
//!
//! This module handles loading configuration from a file and the
//! environment, validation, and conversion into transport/transfer options.

use crate::blob::models::{AccessMode, TransferOptions};
use crate::error::{BlobRelayError, Result};
use crate::utils::network::NetworkConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub debug: bool,
    /// Base URL of the mobile service or storage account
    pub endpoint: String,
    pub application_key: Option<String>,
    pub auth_token: Option<String>,
    pub access: AccessMode,
    pub broker_api: String,
    pub token_ttl_secs: u64,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            endpoint: String::new(),
            application_key: None,
            auth_token: None,
            access: AccessMode::Direct,
            broker_api: "resources".to_string(),
            token_ttl_secs: 300, // 5 minutes
            connect_timeout_secs: 30,
            request_timeout_secs: 120,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.endpoint.is_empty() {
            return Err(BlobRelayError::config(
                "Endpoint is required. Use --endpoint, BLOBRELAY_ENDPOINT or the config file",
            ));
        }

        let endpoint = url::Url::parse(&self.endpoint)
            .map_err(|e| BlobRelayError::config(format!("Invalid endpoint '{}': {e}", self.endpoint)))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(BlobRelayError::config(format!(
                "Endpoint must be an http(s) URL: '{}'",
                self.endpoint
            )));
        }

        if self.access == AccessMode::Brokered && self.broker_api.trim_matches('/').is_empty() {
            return Err(BlobRelayError::config(
                "broker_api is required in brokered access mode",
            ));
        }

        if self.token_ttl_secs == 0 {
            return Err(BlobRelayError::config("token_ttl_secs must be positive"));
        }

        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        // Use XDG Base Directory specification on Linux and macOS
        #[cfg(any(target_os = "linux", target_os = "macos"))]
        {
            use std::env;
            let config_dir = if let Ok(xdg_config_home) = env::var("XDG_CONFIG_HOME") {
                PathBuf::from(xdg_config_home)
            } else {
                let home_dir = env::var("HOME")
                    .map_err(|_| BlobRelayError::config("HOME environment variable not set"))?;
                PathBuf::from(home_dir).join(".config")
            };
            Ok(config_dir.join("blobrelay").join("blobrelay.toml"))
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos")))]
        {
            let config_dir = dirs::config_dir()
                .ok_or_else(|| BlobRelayError::config("Unable to determine config directory"))?;
            Ok(config_dir.join("blobrelay").join("blobrelay.toml"))
        }
    }

    pub fn network_config(&self) -> NetworkConfig {
        NetworkConfig {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            ..NetworkConfig::default()
        }
    }

    /// Default tracing filter, raised to debug by the `debug` setting
    pub fn log_filter(&self) -> &'static str {
        if self.debug {
            "blobrelay=debug"
        } else {
            "blobrelay=info"
        }
    }

    pub fn transfer_options(&self) -> TransferOptions {
        TransferOptions {
            access: self.access,
            broker_api: self.broker_api.clone(),
            token_ttl: Duration::from_secs(self.token_ttl_secs),
        }
    }
}

/// Load configuration from multiple sources with priority order:
/// 1. Command-line flags (applied by the caller)
/// 2. Environment variables
/// 3. Configuration file
/// 4. Default values
///
/// Validation is left to the caller so flags can fill gaps first.
pub async fn load_config() -> Result<Config> {
    let mut config = Config::default();

    let config_path = Config::get_config_path()?;
    if config_path.exists() {
        config = load_from_file(&config_path).await?;
    }

    load_from_env(&mut config, |key| std::env::var(key).ok())?;

    Ok(config)
}

pub async fn load_from_file(path: &Path) -> Result<Config> {
    let contents = tokio::fs::read_to_string(path).await?;

    // Try to parse as TOML first, then JSON as fallback
    let toml_error = match toml::from_str::<Config>(&contents) {
        Ok(config) => return Ok(config),
        Err(e) => e,
    };

    serde_json::from_str::<Config>(&contents).map_err(|_| {
        BlobRelayError::config(format!(
            "Failed to parse {}: {toml_error}",
            path.display()
        ))
    })
}

/// Apply environment overrides, reading variables through `var`
pub fn load_from_env<F>(config: &mut Config, var: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = var("DEBUG") {
        config.debug = value.to_lowercase() == "true" || value == "1";
    }

    if let Some(value) = var("BLOBRELAY_ENDPOINT") {
        config.endpoint = value;
    }

    if let Some(value) = var("BLOBRELAY_APPLICATION_KEY") {
        config.application_key = Some(value);
    }

    if let Some(value) = var("BLOBRELAY_AUTH_TOKEN") {
        config.auth_token = Some(value);
    }

    if let Some(value) = var("BLOBRELAY_ACCESS") {
        config.access = value.parse()?;
    }

    if let Some(value) = var("BLOBRELAY_BROKER_API") {
        config.broker_api = value;
    }

    if let Some(value) = var("BLOBRELAY_TOKEN_TTL") {
        config.token_ttl_secs = value.parse::<u64>().map_err(|_| {
            BlobRelayError::config(format!(
                "Invalid BLOBRELAY_TOKEN_TTL '{value}', expected a number of seconds"
            ))
        })?;
    }

    Ok(())
}
