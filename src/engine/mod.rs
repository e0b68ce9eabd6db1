//! Container engine abstraction
//!
//! [`ContainerEngine`] is the seam between the [`Client`](crate::container::Client)
//! wrapper and the engine client library. [`DockerEngine`] is the production
//! implementation backed by `bollard`.

mod docker;

use async_trait::async_trait;
use bollard::container::{
    Config, LogOutput, LogsOptions, RemoveContainerOptions, StartContainerOptions,
};
use futures::stream::BoxStream;
use thiserror::Error;

use crate::registry::RegistryCredentials;

pub use docker::DockerEngine;

/// Errors surfaced by the engine or the registry
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Docker(#[from] bollard::errors::Error),

    #[error("registry returned {status}: {message}")]
    Registry { status: u16, message: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Error record reported inside a streaming response
    #[error("{0}")]
    Stream(String),
}

/// One record of an image pull progress stream
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PullProgress {
    pub id: Option<String>,
    pub status: Option<String>,
    pub error: Option<String>,
}

/// The engine calls the client wrapper is built on
#[async_trait]
pub trait ContainerEngine: Send + Sync {
    /// Validate credentials against their registry
    async fn registry_login(&self, credentials: &RegistryCredentials) -> Result<(), EngineError>;

    /// Request an image; the returned stream reports transfer progress
    fn pull_image(
        &self,
        reference: &str,
        credentials: &RegistryCredentials,
    ) -> BoxStream<'static, Result<PullProgress, EngineError>>;

    /// Create a container and return its id
    async fn create_container(
        &self,
        name: Option<&str>,
        config: Config<String>,
    ) -> Result<String, EngineError>;

    async fn start_container(
        &self,
        container_id: &str,
        options: Option<StartContainerOptions<String>>,
    ) -> Result<(), EngineError>;

    /// Open the container's log stream, already split into frames
    fn container_logs(
        &self,
        container_id: &str,
        options: LogsOptions<String>,
    ) -> BoxStream<'static, Result<LogOutput, EngineError>>;

    async fn remove_container(
        &self,
        container_id: &str,
        options: Option<RemoveContainerOptions>,
    ) -> Result<(), EngineError>;
}
