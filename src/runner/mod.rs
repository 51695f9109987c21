pub mod demo;
pub mod ssh;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

pub use demo::DemoRunner;
pub use ssh::SshRunner;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportFailure {
    #[error("command timed out after {0:?}")]
    Timeout(Duration),
    #[error("ssh client not found")]
    ClientNotFound,
    #[error("command exited with status {code:?}")]
    NonZeroExit { code: Option<i32> },
    #[error("{0}")]
    Io(String),
}

impl TransportFailure {
    /// Text worth surfacing in an outcome. A bare non-zero exit carries none.
    pub fn error_message(&self) -> Option<String> {
        match self {
            TransportFailure::NonZeroExit { .. } => None,
            other => Some(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub failure: Option<TransportFailure>,
    pub elapsed: Duration,
}

impl ExecOutput {
    pub fn succeeded(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            exit_code: Some(0),
            ..Self::default()
        }
    }

    pub fn failed(failure: TransportFailure) -> Self {
        Self {
            failure: Some(failure),
            ..Self::default()
        }
    }

    pub fn success(&self) -> bool {
        self.failure.is_none()
    }

    pub fn error_message(&self) -> Option<String> {
        self.failure.as_ref().and_then(TransportFailure::error_message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpProbe {
    pub ok: bool,
    pub status_code: u16,
}

/// Executes diagnostic commands and reachability probes against remote targets.
#[async_trait]
pub trait RemoteRunner: Send + Sync {
    fn name(&self) -> &'static str;

    /// `timeout` overrides the configured command timeout.
    async fn execute(
        &self,
        host: &str,
        address: &str,
        command: &str,
        port: u16,
        timeout: Option<Duration>,
    ) -> ExecOutput;

    async fn probe_tcp(&self, address: &str, port: u16, timeout: Option<Duration>) -> bool;

    async fn probe_http(
        &self,
        url: &str,
        expected_status: u16,
        timeout: Option<Duration>,
    ) -> HttpProbe;
}
