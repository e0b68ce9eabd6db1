//! `bollard`-backed container engine

use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, LogOutput, LogsOptions, RemoveContainerOptions,
    StartContainerOptions,
};
use bollard::image::CreateImageOptions;
use bollard::{Docker, API_DEFAULT_VERSION};
use futures::stream::{BoxStream, StreamExt};
use tracing::{debug, info};

use super::{ContainerEngine, EngineError, PullProgress};
use crate::config::ClientConfig;
use crate::registry::{RegistryClient, RegistryCredentials};

/// Docker Engine API client
#[derive(Clone)]
pub struct DockerEngine {
    docker: Docker,
    registry: RegistryClient,
}

impl DockerEngine {
    /// Wrap an already connected `bollard` client
    pub fn new(docker: Docker) -> Self {
        Self {
            docker,
            registry: RegistryClient::default(),
        }
    }

    /// Connect using the platform defaults (`DOCKER_HOST` or the local socket)
    pub fn connect_with_local_defaults() -> Result<Self, EngineError> {
        let docker = Docker::connect_with_local_defaults()?;
        Ok(Self::new(docker))
    }

    /// Connect as described by the client configuration
    pub fn connect(config: &ClientConfig) -> Result<Self, EngineError> {
        let timeout = config.timeout_seconds;

        let docker = match config.docker_host.as_deref() {
            None => Docker::connect_with_local_defaults()?,
            #[cfg(unix)]
            Some(host) if host.starts_with("unix://") => {
                Docker::connect_with_unix(host, timeout, API_DEFAULT_VERSION)?
            }
            #[cfg(windows)]
            Some(host) if host.starts_with("npipe://") => {
                Docker::connect_with_named_pipe(host, timeout, API_DEFAULT_VERSION)?
            }
            Some(host) => Docker::connect_with_http(host, timeout, API_DEFAULT_VERSION)?,
        };

        info!(
            docker_host = config.docker_host.as_deref().unwrap_or("local defaults"),
            "Connected to container engine"
        );

        Ok(Self {
            docker,
            registry: RegistryClient::new(timeout),
        })
    }

    /// The underlying `bollard` client
    pub fn docker(&self) -> &Docker {
        &self.docker
    }
}

#[async_trait]
impl ContainerEngine for DockerEngine {
    async fn registry_login(&self, credentials: &RegistryCredentials) -> Result<(), EngineError> {
        self.registry.login(credentials).await
    }

    fn pull_image(
        &self,
        reference: &str,
        credentials: &RegistryCredentials,
    ) -> BoxStream<'static, Result<PullProgress, EngineError>> {
        debug!(image = %reference, "Requesting image");

        let options = CreateImageOptions {
            from_image: reference.to_string(),
            ..Default::default()
        };

        self.docker
            .create_image(Some(options), None, Some(credentials.to_docker_credentials()))
            .map(|item| {
                item.map(|info| PullProgress {
                    id: info.id,
                    status: info.status,
                    error: info.error,
                })
                .map_err(EngineError::from)
            })
            .boxed()
    }

    async fn create_container(
        &self,
        name: Option<&str>,
        config: Config<String>,
    ) -> Result<String, EngineError> {
        let options = name.map(|name| CreateContainerOptions {
            name: name.to_string(),
            ..Default::default()
        });

        let response = self.docker.create_container(options, config).await?;
        for warning in &response.warnings {
            debug!(container_id = %response.id, warning = %warning, "Engine warning on create");
        }

        Ok(response.id)
    }

    async fn start_container(
        &self,
        container_id: &str,
        options: Option<StartContainerOptions<String>>,
    ) -> Result<(), EngineError> {
        self.docker.start_container(container_id, options).await?;
        Ok(())
    }

    fn container_logs(
        &self,
        container_id: &str,
        options: LogsOptions<String>,
    ) -> BoxStream<'static, Result<LogOutput, EngineError>> {
        self.docker
            .logs(container_id, Some(options))
            .map(|item| item.map_err(EngineError::from))
            .boxed()
    }

    async fn remove_container(
        &self,
        container_id: &str,
        options: Option<RemoveContainerOptions>,
    ) -> Result<(), EngineError> {
        self.docker.remove_container(container_id, options).await?;
        Ok(())
    }
}
