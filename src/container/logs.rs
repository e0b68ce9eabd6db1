//! Log stream demultiplexing

use bollard::container::LogOutput;
use futures::{Stream, StreamExt};

use crate::engine::EngineError;

/// Container output split by stream
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogsOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl LogsOutput {
    /// Append one frame to the stream it belongs to.
    ///
    /// Containers running with a TTY have a single `Console` stream, which is
    /// their standard output. Stdin echo is not output and is dropped.
    pub fn push(&mut self, frame: LogOutput) {
        match frame {
            LogOutput::StdOut { message } | LogOutput::Console { message } => {
                self.stdout.extend_from_slice(&message)
            }
            LogOutput::StdErr { message } => self.stderr.extend_from_slice(&message),
            LogOutput::StdIn { .. } => {}
        }
    }

    /// Drain a frame stream until it ends. The first error stops the drain.
    pub async fn collect<S>(mut frames: S) -> Result<Self, EngineError>
    where
        S: Stream<Item = Result<LogOutput, EngineError>> + Unpin,
    {
        let mut output = Self::default();
        while let Some(frame) = frames.next().await {
            output.push(frame?);
        }
        Ok(output)
    }

    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}
