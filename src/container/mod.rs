//! Container operations
//!
//! Wraps the container engine with a small set of named operations:
//! - Registry login and image pulls
//! - Creating and starting containers
//! - Collecting demultiplexed container logs
//! - Removing containers

mod client;
mod logs;
mod run;

pub use client::Client;
pub use logs::LogsOutput;
pub use run::RunConfig;
