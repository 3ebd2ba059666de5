//! File transfer between the local machine and a remote host.

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{SyncError, SyncResult};
use crate::host::RemoteHost;

/// Copies files (or directories) to and from a remote host.
///
/// Both directions block until the copy is complete or has failed.
#[async_trait]
pub trait TransferChannel: Send + Sync {
    async fn upload(&self, host: &RemoteHost, local: &str, remote: &str) -> SyncResult<()>;

    async fn download(&self, host: &RemoteHost, remote: &str, local: &str) -> SyncResult<()>;
}

/// Transfers with `rsync` over `ssh`.
#[derive(Debug, Clone)]
pub struct RsyncTransfer {
    flags: Vec<String>,
}

impl RsyncTransfer {
    pub fn new() -> Self {
        Self {
            flags: vec!["-az".to_string()],
        }
    }

    /// Append extra rsync flags (e.g. `--delete` for directory syncs).
    pub fn with_flags<I, S>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.flags.extend(flags.into_iter().map(Into::into));
        self
    }

    fn remote_spec(host: &RemoteHost, path: &str) -> String {
        format!("{}:{}", host.ssh_target(), path)
    }

    fn args(&self, host: &RemoteHost, source: String, destination: String) -> Vec<String> {
        let mut args = self.flags.clone();
        if let Some(port) = host.port {
            args.push("-e".to_string());
            args.push(format!("ssh -p {}", port));
        }
        args.push(source);
        args.push(destination);
        args
    }

    async fn run(&self, host: &RemoteHost, path: &str, args: Vec<String>) -> SyncResult<()> {
        tracing::debug!(host = %host.hostname, ?args, "rsync");

        let output = Command::new("rsync")
            .args(&args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| SyncError::Spawn {
                host: host.hostname.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(SyncError::TransferFailed {
                host: host.hostname.clone(),
                path: path.to_string(),
                reason: format!(
                    "rsync exited with {}: {}",
                    output.status.code().unwrap_or(-1),
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        Ok(())
    }
}

impl Default for RsyncTransfer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransferChannel for RsyncTransfer {
    async fn upload(&self, host: &RemoteHost, local: &str, remote: &str) -> SyncResult<()> {
        let args = self.args(host, local.to_string(), Self::remote_spec(host, remote));
        self.run(host, remote, args).await
    }

    async fn download(&self, host: &RemoteHost, remote: &str, local: &str) -> SyncResult<()> {
        let args = self.args(host, Self::remote_spec(host, remote), local.to_string());
        self.run(host, local, args).await
    }
}
