//! Run configuration

use bollard::container::{Config, NetworkingConfig, StartContainerOptions};
use bollard::models::HostConfig;

/// Everything needed to create and start a container
///
/// Groups the engine's own configuration types. Every part is optional and
/// validated by the engine, not here.
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    /// Image, command, environment, ...
    pub container_config: Config<String>,

    /// Resources, mounts, restart policy, ...
    pub host_config: Option<HostConfig>,

    /// Network attachments
    pub networking_config: Option<NetworkingConfig<String>>,

    /// Options for the start call
    pub start_options: Option<StartContainerOptions<String>>,
}

impl RunConfig {
    /// Run `cmd` in `image` with default host and network settings
    pub fn new<I, C>(image: impl Into<String>, cmd: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        Self {
            container_config: Config {
                image: Some(image.into()),
                cmd: Some(cmd.into_iter().map(Into::into).collect()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn with_host_config(mut self, host_config: HostConfig) -> Self {
        self.host_config = Some(host_config);
        self
    }

    pub fn with_networking_config(mut self, networking_config: NetworkingConfig<String>) -> Self {
        self.networking_config = Some(networking_config);
        self
    }

    pub fn with_start_options(mut self, start_options: StartContainerOptions<String>) -> Self {
        self.start_options = Some(start_options);
        self
    }

    /// The create request body: the container config with the host and
    /// network specs folded in. Specs set here take precedence over ones
    /// already present on `container_config`.
    pub fn create_body(&self) -> Config<String> {
        let mut body = self.container_config.clone();

        if let Some(host_config) = &self.host_config {
            body.host_config = Some(host_config.clone());
        }
        if let Some(networking_config) = &self.networking_config {
            body.networking_config = Some(networking_config.clone());
        }

        body
    }
}
