//! Registry credentials and login
//!
//! The engine API has no login call of its own in `bollard`, so credentials
//! are checked the way the engine daemon does it: probe the registry's `/v2/`
//! endpoint and answer its authentication challenge.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use bollard::auth::DockerCredentials;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::WWW_AUTHENTICATE;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::engine::EngineError;

/// Registry endpoint used for Docker Hub logins
const DOCKER_HUB_REGISTRY: &str = "https://registry-1.docker.io";

static CHALLENGE_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([A-Za-z][A-Za-z0-9_-]*)\s*=\s*"([^"]*)""#).expect("valid regex"));

/// Username/password pair for a registry
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryCredentials {
    /// Registry server address, e.g. `registry.example.com` (empty = Docker Hub)
    #[serde(default)]
    pub server: String,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,
}

impl RegistryCredentials {
    pub fn new(
        server: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            server: server.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// True when no credentials have been set
    pub fn is_empty(&self) -> bool {
        self.server.is_empty() && self.username.is_empty() && self.password.is_empty()
    }

    /// Credentials in the shape `bollard` encodes into `X-Registry-Auth`
    pub fn to_docker_credentials(&self) -> DockerCredentials {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());

        DockerCredentials {
            username: non_empty(&self.username),
            password: non_empty(&self.password),
            serveraddress: non_empty(&self.server),
            ..Default::default()
        }
    }
}

impl fmt::Debug for RegistryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryCredentials")
            .field("server", &self.server)
            .field("username", &self.username)
            .field("password", &if self.password.is_empty() { "" } else { "<redacted>" })
            .finish()
    }
}

/// Authentication challenge from a `WWW-Authenticate` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    /// Lowercased scheme (`basic`, `bearer`)
    pub scheme: String,
    pub params: HashMap<String, String>,
}

impl Challenge {
    pub fn parse(header: &str) -> Option<Self> {
        let header = header.trim();
        let (scheme, rest) = match header.split_once(char::is_whitespace) {
            Some((scheme, rest)) => (scheme, rest),
            None => (header, ""),
        };

        if scheme.is_empty() {
            return None;
        }

        let params = CHALLENGE_PARAM
            .captures_iter(rest)
            .map(|c| (c[1].to_lowercase(), c[2].to_string()))
            .collect();

        Some(Self {
            scheme: scheme.to_lowercase(),
            params,
        })
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

/// Turn a server address as users type it into the registry base URL
pub fn registry_base_url(server: &str) -> String {
    let server = server.trim().trim_end_matches('/');

    match server {
        "" | "docker.io" | "index.docker.io" | "registry-1.docker.io"
        | "https://index.docker.io/v1" | "https://index.docker.io" => {
            return DOCKER_HUB_REGISTRY.to_string();
        }
        _ => {}
    }

    let server = server
        .strip_suffix("/v1")
        .or_else(|| server.strip_suffix("/v2"))
        .unwrap_or(server);

    if server.starts_with("http://") || server.starts_with("https://") {
        server.to_string()
    } else {
        format!("https://{}", server)
    }
}

/// Pull a human readable reason out of a registry error body
fn rejection_message(status: StatusCode, body: &str) -> String {
    #[derive(Deserialize)]
    struct RegistryErrors {
        #[serde(default)]
        errors: Vec<RegistryErrorEntry>,
        #[serde(default)]
        details: Option<String>,
    }

    #[derive(Deserialize)]
    struct RegistryErrorEntry {
        #[serde(default)]
        message: String,
    }

    if let Ok(parsed) = serde_json::from_str::<RegistryErrors>(body) {
        let messages: Vec<_> = parsed
            .errors
            .into_iter()
            .map(|e| e.message)
            .filter(|m| !m.is_empty())
            .collect();
        if !messages.is_empty() {
            return messages.join("; ");
        }
        if let Some(details) = parsed.details.filter(|d| !d.is_empty()) {
            return details;
        }
    }

    let body = body.trim();
    if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request rejected")
            .to_string()
    } else {
        body.to_string()
    }
}

/// HTTP client that validates credentials against a registry
#[derive(Debug, Clone)]
pub struct RegistryClient {
    client: Client,
}

impl Default for RegistryClient {
    fn default() -> Self {
        Self::new(120)
    }
}

impl RegistryClient {
    pub fn new(timeout_seconds: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client }
    }

    /// Check the credentials against their registry
    pub async fn login(&self, credentials: &RegistryCredentials) -> Result<(), EngineError> {
        let base = registry_base_url(&credentials.server);
        let ping_url = format!("{}/v2/", base);

        debug!(registry = %base, username = %credentials.username, "Probing registry");

        let response = self.client.get(&ping_url).send().await?;
        let status = response.status();

        if status.is_success() {
            info!(registry = %base, "Registry does not require authentication");
            return Ok(());
        }

        if status != StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            return Err(reject(status, &body));
        }

        let challenge = response
            .headers()
            .get(WWW_AUTHENTICATE)
            .and_then(|v| v.to_str().ok())
            .and_then(Challenge::parse);

        let response = match challenge {
            Some(c) if c.scheme == "bearer" => {
                let realm = c.param("realm").ok_or_else(|| EngineError::Registry {
                    status: status.as_u16(),
                    message: "bearer challenge without realm".to_string(),
                })?;

                let mut query = vec![("account", credentials.username.as_str())];
                if let Some(service) = c.param("service") {
                    query.push(("service", service));
                }

                self.client
                    .get(realm)
                    .query(&query)
                    .basic_auth(&credentials.username, Some(&credentials.password))
                    .send()
                    .await?
            }
            _ => {
                self.client
                    .get(&ping_url)
                    .basic_auth(&credentials.username, Some(&credentials.password))
                    .send()
                    .await?
            }
        };

        let status = response.status();
        if status.is_success() {
            info!(registry = %base, username = %credentials.username, "Registry login succeeded");
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(reject(status, &body))
        }
    }
}

fn reject(status: StatusCode, body: &str) -> EngineError {
    let message = rejection_message(status, body);
    warn!(status = %status, reason = %message, "Registry rejected login");
    EngineError::Registry {
        status: status.as_u16(),
        message,
    }
}
