//! Error types for dockerutils operations

use thiserror::Error;

use crate::engine::EngineError;

/// Errors returned by [`Client`](crate::container::Client) operations.
///
/// Every failure variant carries the engine error that caused it, unchanged,
/// as its source.
#[derive(Debug, Error)]
pub enum DockerUtilsError {
    #[error("Registry authentication failed: {0}")]
    AuthenticationFailed(#[source] EngineError),

    #[error("Image pull failed: {0}")]
    PullFailed(#[source] EngineError),

    #[error("Container create failed: {0}")]
    CreateFailed(#[source] EngineError),

    /// The container exists but could not be started. When it was created by
    /// the same call, `container_id` is still present on the engine.
    #[error("Container start failed for {container_id}: {source}")]
    StartFailed {
        container_id: String,
        #[source]
        source: EngineError,
    },

    #[error("Container logs failed: {0}")]
    LogsFailed(#[source] EngineError),

    #[error("Container remove failed: {0}")]
    RemoveFailed(#[source] EngineError),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Failed to connect to container engine: {0}")]
    Connection(#[source] EngineError),
}

impl DockerUtilsError {
    /// The engine error behind this failure, if any
    pub fn engine_error(&self) -> Option<&EngineError> {
        match self {
            DockerUtilsError::AuthenticationFailed(e)
            | DockerUtilsError::PullFailed(e)
            | DockerUtilsError::CreateFailed(e)
            | DockerUtilsError::LogsFailed(e)
            | DockerUtilsError::RemoveFailed(e)
            | DockerUtilsError::Connection(e) => Some(e),
            DockerUtilsError::StartFailed { source, .. } => Some(source),
            DockerUtilsError::Cancelled => None,
        }
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, DockerUtilsError>;
