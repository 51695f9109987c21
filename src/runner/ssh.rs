use super::{ExecOutput, HttpProbe, RemoteRunner, TransportFailure};
use crate::config::{mask_address, ProbeConfig, SshConfig};
use async_trait::async_trait;
use reqwest::Client;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::process::Command;
use tokio::time;
use tracing::{debug, warn};

/// Runs commands through the system `ssh` client in batch mode.
pub struct SshRunner {
    program: PathBuf,
    user: String,
    private_key_path: String,
    connect_timeout: Duration,
    command_timeout: Duration,
    tcp_timeout: Duration,
    http_timeout: Duration,
    client: Client,
}

impl SshRunner {
    pub fn new(ssh: &SshConfig, probes: &ProbeConfig) -> Self {
        let client = Client::builder()
            .user_agent(concat!("infracheck/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            program: PathBuf::from("ssh"),
            user: ssh.default_user.clone(),
            private_key_path: shellexpand::tilde(&ssh.private_key_path).into_owned(),
            connect_timeout: Duration::from_secs(ssh.connect_timeout_secs),
            command_timeout: Duration::from_secs(ssh.command_timeout_secs),
            tcp_timeout: Duration::from_millis(probes.tcp_timeout_ms),
            http_timeout: Duration::from_millis(probes.http_timeout_ms),
            client,
        }
    }

    fn ssh_args(&self, address: &str, command: &str, port: u16) -> Vec<String> {
        vec![
            "-o".to_string(),
            "StrictHostKeyChecking=no".to_string(),
            "-o".to_string(),
            "UserKnownHostsFile=/dev/null".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.connect_timeout.as_secs()),
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            "LogLevel=ERROR".to_string(),
            "-p".to_string(),
            port.to_string(),
            "-i".to_string(),
            self.private_key_path.clone(),
            format!("{}@{}", self.user, address),
            command.to_string(),
        ]
    }
}

#[async_trait]
impl RemoteRunner for SshRunner {
    fn name(&self) -> &'static str {
        "ssh"
    }

    async fn execute(
        &self,
        host: &str,
        address: &str,
        command: &str,
        port: u16,
        timeout: Option<Duration>,
    ) -> ExecOutput {
        let start = Instant::now();
        let limit = timeout.unwrap_or(self.command_timeout);
        let mut cmd = Command::new(&self.program);
        cmd.args(self.ssh_args(address, command, port))
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let mut out = match time::timeout(limit, cmd.output()).await {
            Ok(Ok(output)) => {
                let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                let code = output.status.code();
                let failure = if output.status.success() {
                    None
                } else {
                    warn!(
                        host,
                        address = %mask_address(address),
                        exit_code = ?code,
                        stderr = %stderr,
                        "remote command failed"
                    );
                    Some(TransportFailure::NonZeroExit { code })
                };
                ExecOutput {
                    stdout,
                    stderr,
                    exit_code: code,
                    failure,
                    elapsed: Duration::ZERO,
                }
            }
            Ok(Err(err)) if err.kind() == ErrorKind::NotFound => {
                warn!(error = %err, "ssh client not found");
                ExecOutput::failed(TransportFailure::ClientNotFound)
            }
            Ok(Err(err)) => {
                warn!(host, address = %mask_address(address), error = %err, "ssh spawn failed");
                ExecOutput::failed(TransportFailure::Io(err.to_string()))
            }
            Err(_elapsed) => {
                warn!(host, address = %mask_address(address), timeout = ?limit, "remote command timeout");
                ExecOutput::failed(TransportFailure::Timeout(limit))
            }
        };

        out.elapsed = start.elapsed();
        debug!(host, elapsed_ms = out.elapsed.as_millis() as u64, "remote command finished");
        out
    }

    async fn probe_tcp(&self, address: &str, port: u16, timeout: Option<Duration>) -> bool {
        let addr = format!("{address}:{port}");
        let limit = timeout.unwrap_or(self.tcp_timeout);

        match time::timeout(limit, TcpStream::connect(&addr)).await {
            Ok(Ok(_stream)) => true,
            Ok(Err(err)) => {
                warn!(address = %mask_address(address), port, error = %err, "tcp probe failed");
                false
            }
            Err(_elapsed) => {
                warn!(address = %mask_address(address), port, "tcp probe timeout");
                false
            }
        }
    }

    async fn probe_http(
        &self,
        url: &str,
        expected_status: u16,
        timeout: Option<Duration>,
    ) -> HttpProbe {
        let req = self
            .client
            .head(url)
            .timeout(timeout.unwrap_or(self.http_timeout));

        match req.send().await {
            Ok(resp) => {
                let code = resp.status().as_u16();
                HttpProbe {
                    ok: code == expected_status,
                    status_code: code,
                }
            }
            Err(err) => {
                debug!(error = %err, "http probe failed");
                HttpProbe {
                    ok: false,
                    status_code: 0,
                }
            }
        }
    }
}
