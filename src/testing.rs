//! In-memory engine for unit tests

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bollard::container::{
    Config, LogOutput, LogsOptions, RemoveContainerOptions, StartContainerOptions,
};
use futures::stream::{self, BoxStream, StreamExt};

use crate::engine::{ContainerEngine, EngineError, PullProgress};
use crate::registry::RegistryCredentials;

/// Engine call as observed by [`FakeEngine`]
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Login { server: String, username: String },
    Pull { reference: String, credentials: RegistryCredentials },
    Create { name: Option<String> },
    Start { container_id: String },
    Logs { container_id: String, follow: bool, stdout: bool, stderr: bool },
    Remove { container_id: String },
}

#[derive(Default)]
struct FakeContainer {
    starts: u32,
    logs: Vec<LogOutput>,
    follow_forever: bool,
}

#[derive(Default)]
struct State {
    calls: Vec<Call>,
    containers: HashMap<String, FakeContainer>,
    next_id: u64,
    login_error: Option<String>,
    pull_request_error: Option<String>,
    pull_stream_error: Option<String>,
    pull_progress: Vec<PullProgress>,
    create_error: Option<String>,
    start_error: Option<String>,
}

fn server_error(status_code: u16, message: &str) -> EngineError {
    EngineError::Docker(bollard::errors::Error::DockerResponseServerError {
        status_code,
        message: message.to_string(),
    })
}

#[derive(Clone, Default)]
pub struct FakeEngine {
    state: Arc<Mutex<State>>,
}

impl FakeEngine {
    fn with_state<T>(&self, f: impl FnOnce(&mut State) -> T) -> T {
        f(&mut self.state.lock().unwrap())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.with_state(|s| s.calls.clone())
    }

    pub fn reject_login(&self, message: &str) {
        self.with_state(|s| s.login_error = Some(message.to_string()));
    }

    pub fn fail_pull_request(&self, message: &str) {
        self.with_state(|s| s.pull_request_error = Some(message.to_string()));
    }

    /// Fail after the first progress record, the way bollard reports error records
    pub fn fail_pull_stream(&self, message: &str) {
        self.with_state(|s| s.pull_stream_error = Some(message.to_string()));
    }

    pub fn set_pull_progress(&self, progress: Vec<PullProgress>) {
        self.with_state(|s| s.pull_progress = progress);
    }

    pub fn fail_create(&self, message: &str) {
        self.with_state(|s| s.create_error = Some(message.to_string()));
    }

    pub fn fail_start(&self, message: &str) {
        self.with_state(|s| s.start_error = Some(message.to_string()));
    }

    pub fn set_logs(&self, container_id: &str, logs: Vec<LogOutput>) {
        self.with_state(|s| {
            if let Some(c) = s.containers.get_mut(container_id) {
                c.logs = logs;
            }
        });
    }

    /// Keep the log stream open after the recorded frames
    pub fn follow_forever(&self, container_id: &str) {
        self.with_state(|s| {
            if let Some(c) = s.containers.get_mut(container_id) {
                c.follow_forever = true;
            }
        });
    }

    pub fn start_count(&self, container_id: &str) -> u32 {
        self.with_state(|s| s.containers.get(container_id).map_or(0, |c| c.starts))
    }

    pub fn has_container(&self, container_id: &str) -> bool {
        self.with_state(|s| s.containers.contains_key(container_id))
    }
}

#[async_trait]
impl ContainerEngine for FakeEngine {
    async fn registry_login(&self, credentials: &RegistryCredentials) -> Result<(), EngineError> {
        self.with_state(|s| {
            s.calls.push(Call::Login {
                server: credentials.server.clone(),
                username: credentials.username.clone(),
            });
            match &s.login_error {
                Some(message) => Err(EngineError::Registry {
                    status: 401,
                    message: message.clone(),
                }),
                None => Ok(()),
            }
        })
    }

    fn pull_image(
        &self,
        reference: &str,
        credentials: &RegistryCredentials,
    ) -> BoxStream<'static, Result<PullProgress, EngineError>> {
        self.with_state(|s| {
            s.calls.push(Call::Pull {
                reference: reference.to_string(),
                credentials: credentials.clone(),
            });

            if let Some(message) = &s.pull_request_error {
                return stream::iter(vec![Err(server_error(404, message))]).boxed();
            }

            let mut records: Vec<_> = s.pull_progress.iter().cloned().map(Ok).collect();
            if let Some(message) = &s.pull_stream_error {
                records.push(Ok(PullProgress {
                    status: Some("Pulling fs layer".to_string()),
                    ..Default::default()
                }));
                records.push(Err(EngineError::Docker(
                    bollard::errors::Error::DockerStreamError {
                        error: message.clone(),
                    },
                )));
            }
            stream::iter(records).boxed()
        })
    }

    async fn create_container(
        &self,
        name: Option<&str>,
        _config: Config<String>,
    ) -> Result<String, EngineError> {
        self.with_state(|s| {
            s.calls.push(Call::Create {
                name: name.map(str::to_string),
            });

            if let Some(message) = &s.create_error {
                return Err(server_error(404, message));
            }

            s.next_id += 1;
            let id = format!("{:012x}", s.next_id);
            s.containers.insert(id.clone(), FakeContainer::default());
            Ok(id)
        })
    }

    async fn start_container(
        &self,
        container_id: &str,
        _options: Option<StartContainerOptions<String>>,
    ) -> Result<(), EngineError> {
        self.with_state(|s| {
            s.calls.push(Call::Start {
                container_id: container_id.to_string(),
            });

            if let Some(message) = &s.start_error {
                return Err(server_error(500, message));
            }

            match s.containers.get_mut(container_id) {
                None => Err(server_error(404, "No such container")),
                Some(c) if c.starts > 0 => Err(server_error(304, "container already started")),
                Some(c) => {
                    c.starts += 1;
                    Ok(())
                }
            }
        })
    }

    fn container_logs(
        &self,
        container_id: &str,
        options: LogsOptions<String>,
    ) -> BoxStream<'static, Result<LogOutput, EngineError>> {
        self.with_state(|s| {
            s.calls.push(Call::Logs {
                container_id: container_id.to_string(),
                follow: options.follow,
                stdout: options.stdout,
                stderr: options.stderr,
            });

            let Some(c) = s.containers.get(container_id) else {
                return stream::iter(vec![Err(server_error(404, "No such container"))]).boxed();
            };

            let frames = stream::iter(c.logs.clone().into_iter().map(Ok));
            if c.follow_forever && options.follow {
                frames.chain(stream::pending()).boxed()
            } else {
                frames.boxed()
            }
        })
    }

    async fn remove_container(
        &self,
        container_id: &str,
        _options: Option<RemoveContainerOptions>,
    ) -> Result<(), EngineError> {
        self.with_state(|s| {
            s.calls.push(Call::Remove {
                container_id: container_id.to_string(),
            });

            match s.containers.remove(container_id) {
                Some(_) => Ok(()),
                None => Err(server_error(404, "No such container")),
            }
        })
    }
}
