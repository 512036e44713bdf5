//! Configuration management for kgauth
//!
//! This module handles loading, parsing and validating the authentication
//! configuration from a YAML file and `OS_*` environment variables.

use crate::error::{AuthError, Result};
use crate::loading::{get_plugin_loader, LOADER_NAMES};
use crate::options::RawOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure for kgauth
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Loader to use (`password` or `token`)
    #[serde(default = "default_auth_type")]
    pub auth_type: String,

    /// Raw option mapping handed to the loader, deprecated names allowed
    #[serde(default)]
    pub auth: RawOptions,

    /// Version discovery settings
    #[serde(default)]
    pub discovery: DiscoveryConfig,
}

fn default_auth_type() -> String {
    "password".to_string()
}

/// Version discovery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Timeout for a single discovery request (seconds)
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Look up `_openstack_keystone` TXT records when no auth-url is set
    #[serde(default = "default_dns_fallback")]
    pub dns_fallback: bool,
}

fn default_timeout() -> u64 {
    10
}

fn default_dns_fallback() -> bool {
    true
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            dns_fallback: default_dns_fallback(),
        }
    }
}

impl DiscoveryConfig {
    /// Request timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Config {
    /// Load configuration from file and environment
    ///
    /// A missing file is not an error: defaults are used and the environment
    /// still applies.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the YAML configuration file
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed.
    pub fn load(path: &str) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| AuthError::Configuration(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| AuthError::Configuration(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(auth_type) = std::env::var("OS_AUTH_TYPE") {
            if !auth_type.is_empty() {
                self.auth_type = auth_type;
            }
        }

        let registry = match get_plugin_loader(&self.auth_type).and_then(|l| l.registry()) {
            Ok(registry) => registry,
            Err(e) => {
                tracing::warn!("Skipping OS_* environment overrides: {}", e);
                return;
            }
        };

        for spec in registry.specs() {
            let in_file = self.auth.iter().any(|(key, value)| {
                !value.is_empty() && registry.find(key).is_some_and(|s| s.name == spec.name)
            });
            if in_file {
                continue;
            }

            for var in spec.env_vars() {
                match std::env::var(&var) {
                    Ok(value) if !value.is_empty() => {
                        tracing::debug!(option = %spec.name, env = %var, "Option set from environment");
                        self.auth.insert(spec.name.clone(), value);
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns error if the auth type is empty or unknown, or the discovery
    /// timeout is zero.
    pub fn validate(&self) -> Result<()> {
        if self.auth_type.is_empty() {
            return Err(AuthError::Configuration("auth_type cannot be empty".to_string()).into());
        }

        if !LOADER_NAMES.contains(&self.auth_type.as_str()) {
            return Err(AuthError::Configuration(format!(
                "Invalid auth_type: {}. Must be one of: {}",
                self.auth_type,
                LOADER_NAMES.join(", ")
            ))
            .into());
        }

        if self.discovery.timeout_seconds == 0 {
            return Err(AuthError::Configuration(
                "discovery.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            auth_type: default_auth_type(),
            auth: RawOptions::new(),
            discovery: DiscoveryConfig::default(),
        }
    }
}
