//! Client wrapper over the container engine

use bollard::container::{LogsOptions, RemoveContainerOptions};
use futures::StreamExt;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::logs::LogsOutput;
use super::run::RunConfig;
use crate::config::ClientConfig;
use crate::engine::{ContainerEngine, DockerEngine, EngineError};
use crate::error::{DockerUtilsError, Result};
use crate::registry::RegistryCredentials;

/// Container engine client holding the registry credentials of the session
pub struct Client<E = DockerEngine> {
    engine: E,
    credentials: RwLock<RegistryCredentials>,
}

impl Client<DockerEngine> {
    /// Connect to the engine described by `config` and, when it carries
    /// registry credentials, log in with them.
    pub async fn connect(config: &ClientConfig) -> Result<Self> {
        let engine = DockerEngine::connect(config).map_err(DockerUtilsError::Connection)?;
        let client = Self::new(engine);

        if let Some(registry) = &config.registry {
            client
                .login(&registry.server, &registry.username, &registry.password)
                .await?;
        }

        Ok(client)
    }
}

impl<E: ContainerEngine> Client<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            credentials: RwLock::new(RegistryCredentials::default()),
        }
    }

    /// The wrapped engine, for calls this client does not cover
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Credentials currently used by [`Client::pull`]
    pub async fn credentials(&self) -> RegistryCredentials {
        self.credentials.read().await.clone()
    }

    /// Authenticate against a registry and keep the credentials for later pulls
    pub async fn login(&self, server: &str, username: &str, password: &str) -> Result<()> {
        let credentials = RegistryCredentials::new(server, username, password);

        if let Err(e) = self.engine.registry_login(&credentials).await {
            warn!(server = %server, username = %username, error = %e, "Registry login failed");
            return Err(DockerUtilsError::AuthenticationFailed(e));
        }

        *self.credentials.write().await = credentials;
        info!(server = %server, username = %username, "Logged in to registry");

        Ok(())
    }

    /// Pull an image using the stored credentials (empty if never logged in)
    pub async fn pull(&self, reference: &str) -> Result<()> {
        let credentials = self.credentials().await;
        self.pull_with_credentials(reference, &credentials).await
    }

    /// Pull an image with explicit credentials, ignoring the stored ones
    pub async fn pull_with_credentials(
        &self,
        reference: &str,
        credentials: &RegistryCredentials,
    ) -> Result<()> {
        info!(image = %reference, "Pulling image");

        let mut progress = self.engine.pull_image(reference, credentials);
        while let Some(record) = progress.next().await {
            let record = record.map_err(|e| {
                error!(image = %reference, error = %e, "Image pull failed");
                DockerUtilsError::PullFailed(e)
            })?;

            // bollard already reports these as `Err`; other engines may not
            if let Some(message) = record.error {
                error!(image = %reference, error = %message, "Image pull failed");
                return Err(DockerUtilsError::PullFailed(EngineError::Stream(message)));
            }
        }

        info!(image = %reference, "Image pulled");
        Ok(())
    }

    /// Create a container and start it; returns the container id.
    ///
    /// If the start fails the created container is left in place and its id
    /// is reported in [`DockerUtilsError::StartFailed`].
    pub async fn run(&self, cfg: &RunConfig, name: &str) -> Result<String> {
        let container_id = self.create(cfg, name).await?;
        self.run_existing(cfg, &container_id).await?;
        Ok(container_id)
    }

    /// Start a container created earlier
    pub async fn run_existing(&self, cfg: &RunConfig, container_id: &str) -> Result<()> {
        debug!(container_id = %container_id, "Starting container");

        self.engine
            .start_container(container_id, cfg.start_options.clone())
            .await
            .map_err(|e| {
                error!(container_id = %container_id, error = %e, "Container start failed");
                DockerUtilsError::StartFailed {
                    container_id: container_id.to_string(),
                    source: e,
                }
            })?;

        info!(container_id = %container_id, "Container started");
        Ok(())
    }

    /// Create a container without starting it; an empty name lets the
    /// engine pick one.
    pub async fn create(&self, cfg: &RunConfig, name: &str) -> Result<String> {
        let name = (!name.is_empty()).then_some(name);
        debug!(
            image = cfg.container_config.image.as_deref().unwrap_or_default(),
            name = name.unwrap_or_default(),
            "Creating container"
        );

        let container_id = self
            .engine
            .create_container(name, cfg.create_body())
            .await
            .map_err(|e| {
                error!(error = %e, "Container create failed");
                DockerUtilsError::CreateFailed(e)
            })?;

        info!(container_id = %container_id, "Container created");
        Ok(container_id)
    }

    /// Collect a container's stdout and stderr.
    ///
    /// With `follow` the call waits until the engine closes the stream,
    /// normally when the container exits. Drop the future to give up early.
    pub async fn logs(&self, container_id: &str, follow: bool) -> Result<LogsOutput> {
        let options = LogsOptions::<String> {
            follow,
            stdout: true,
            stderr: true,
            tail: "all".to_string(),
            ..Default::default()
        };

        let frames = self.engine.container_logs(container_id, options);
        let output = LogsOutput::collect(frames).await.map_err(|e| {
            error!(container_id = %container_id, error = %e, "Container logs failed");
            DockerUtilsError::LogsFailed(e)
        })?;

        debug!(
            container_id = %container_id,
            stdout_bytes = output.stdout.len(),
            stderr_bytes = output.stderr.len(),
            "Container logs collected"
        );

        Ok(output)
    }

    /// [`Client::logs`] that gives up with [`DockerUtilsError::Cancelled`]
    /// once `cancel` fires
    pub async fn logs_until_cancelled(
        &self,
        container_id: &str,
        follow: bool,
        cancel: &CancellationToken,
    ) -> Result<LogsOutput> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!(container_id = %container_id, "Log collection cancelled");
                Err(DockerUtilsError::Cancelled)
            }
            result = self.logs(container_id, follow) => result,
        }
    }

    /// Remove a container
    pub async fn remove(
        &self,
        container_id: &str,
        options: Option<RemoveContainerOptions>,
    ) -> Result<()> {
        self.engine
            .remove_container(container_id, options)
            .await
            .map_err(|e| {
                warn!(container_id = %container_id, error = %e, "Container remove failed");
                DockerUtilsError::RemoveFailed(e)
            })?;

        info!(container_id = %container_id, "Container removed");
        Ok(())
    }
}
