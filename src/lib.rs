//! dockerutils library
//!
//! A thin convenience layer over the Docker Engine API: log in to a registry,
//! pull an image, create and start a container, and collect its stdout and
//! stderr separately.
//!
//! ```no_run
//! use dockerutils::{Client, RunConfig};
//!
//! # async fn example() -> dockerutils::Result<()> {
//! let client = Client::new(dockerutils::DockerEngine::connect_with_local_defaults()
//!     .map_err(dockerutils::DockerUtilsError::Connection)?);
//!
//! client.pull("alpine:3.19").await?;
//!
//! let cfg = RunConfig::new("alpine:3.19", ["sh", "-c", "echo stdout works"]);
//! let id = client.run(&cfg, "").await?;
//! let logs = client.logs(&id, true).await?;
//! assert_eq!(logs.stdout, b"stdout works\n");
//!
//! client.remove(&id, None).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod container;
pub mod engine;
pub mod error;
pub mod logging;
pub mod registry;

#[cfg(test)]
pub(crate) mod testing;

pub use config::ClientConfig;
pub use container::{Client, LogsOutput, RunConfig};
pub use engine::{ContainerEngine, DockerEngine, EngineError};
pub use error::{DockerUtilsError, Result};
pub use registry::RegistryCredentials;
