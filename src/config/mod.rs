//! Configuration for dockerutils
//!
//! Supports configuration via:
//! - YAML/TOML config files
//! - Environment variables (with DOCKERUTILS_ prefix)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::registry::RegistryCredentials;

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Engine address (`unix:///var/run/docker.sock`, `tcp://host:2375`).
    /// Local defaults when unset.
    #[serde(default)]
    pub docker_host: Option<String>,

    /// Engine and registry request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Registry to log in to on connect
    #[serde(default)]
    pub registry: Option<RegistryCredentials>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout() -> u64 {
    120
}

/// Engine address schemes this platform can connect to
#[cfg(unix)]
const DOCKER_HOST_SCHEMES: &[&str] = &["unix", "tcp", "http"];
#[cfg(windows)]
const DOCKER_HOST_SCHEMES: &[&str] = &["npipe", "tcp", "http"];
#[cfg(not(any(unix, windows)))]
const DOCKER_HOST_SCHEMES: &[&str] = &["tcp", "http"];

fn check_docker_host(host: &str) -> Result<()> {
    let host = host.trim();
    if host.is_empty() {
        anyhow::bail!("docker_host cannot be empty when set");
    }

    let scheme = host.split_once("://").map(|(scheme, _)| scheme).unwrap_or_default();
    if !DOCKER_HOST_SCHEMES.contains(&scheme) {
        anyhow::bail!(
            "Unsupported docker_host {:?}: expected one of {}",
            host,
            DOCKER_HOST_SCHEMES
                .iter()
                .map(|s| format!("{}://", s))
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    Ok(())
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            docker_host: None,
            timeout_seconds: default_timeout(),
            registry: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        // Try to load .env file if present
        let _ = dotenvy::dotenv();

        let config = config::Config::builder()
            .add_source(config::Config::try_from(&ClientConfig::default())?)
            .add_source(config::File::with_name("config/dockerutils").required(false))
            .add_source(config::File::with_name("/etc/dockerutils/config").required(false))
            // DOCKERUTILS_REGISTRY__USERNAME=... style overrides
            .add_source(
                config::Environment::with_prefix("DOCKERUTILS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let client_config: ClientConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        client_config.validate()?;

        Ok(client_config)
    }

    fn validate(&self) -> Result<()> {
        if self.timeout_seconds == 0 {
            anyhow::bail!("Timeout cannot be 0");
        }

        if let Some(host) = &self.docker_host {
            check_docker_host(host)?;
        }

        if let Some(registry) = &self.registry {
            if registry.username.is_empty() {
                anyhow::bail!("Registry username is required when a registry is configured");
            }
        }

        Ok(())
    }
}
