//! Command execution on the local machine or a remote host.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::error::{SyncError, SyncResult};
use crate::host::ExecutionContext;
use crate::shell;

/// How long a command may run before it is killed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Timeout {
    /// The executor's configured default
    #[default]
    Default,
    /// No limit; used for exports and imports, whose size is unbounded
    Unbounded,
    /// An explicit limit
    After(Duration),
}

/// Per-call options for [`CommandExecutor::execute`].
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub timeout: Timeout,
    /// Working directory on the target context
    pub cwd: Option<String>,
    /// Capture stdout/stderr instead of streaming them to the terminal
    pub capture_output: bool,
    /// Report a non-zero exit as a status instead of an error
    pub no_throw: bool,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_dir(mut self, dir: impl Into<String>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn unbounded(mut self) -> Self {
        self.timeout = Timeout::Unbounded;
        self
    }

    pub fn timeout(mut self, limit: Duration) -> Self {
        self.timeout = Timeout::After(limit);
        self
    }

    pub fn capture(mut self) -> Self {
        self.capture_output = true;
        self
    }

    pub fn no_throw(mut self) -> Self {
        self.no_throw = true;
        self
    }
}

/// Result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub status: i32,
    /// Captured stdout (empty unless `capture_output` was set)
    pub stdout: String,
    /// Captured stderr (empty unless `capture_output` was set)
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Runs shell commands in an execution context.
///
/// Implementations must return `Ok` with the exit status for non-zero exits
/// when `no_throw` is set, and must not apply any timeout when
/// [`Timeout::Unbounded`] is requested.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute(
        &self,
        context: &ExecutionContext,
        command: &str,
        options: &RunOptions,
    ) -> SyncResult<CommandOutput>;

    /// Run a check and report whether it exited 0.
    async fn test(&self, context: &ExecutionContext, command: &str) -> SyncResult<bool> {
        let output = self
            .execute(context, command, &RunOptions::new().capture().no_throw())
            .await?;
        Ok(output.success())
    }
}

/// Executes through `bash -o pipefail -c` locally and over `ssh` remotely.
///
/// Dump and import commands are pipelines; with `pipefail` a failing export
/// tool or `gunzip` is reported instead of the status of the last stage.
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    default_timeout: Duration,
}

impl ShellExecutor {
    pub fn new(default_timeout: Duration) -> Self {
        Self { default_timeout }
    }

    fn limit(&self, timeout: Timeout) -> Option<Duration> {
        match timeout {
            Timeout::Default => Some(self.default_timeout),
            Timeout::Unbounded => None,
            Timeout::After(limit) => Some(limit),
        }
    }

    fn build(context: &ExecutionContext, command: &str, options: &RunOptions) -> Command {
        match context {
            ExecutionContext::Local => {
                let mut cmd = Command::new("bash");
                cmd.args(["-o", "pipefail", "-c"]).arg(command);
                if let Some(dir) = &options.cwd {
                    cmd.current_dir(dir);
                }
                cmd
            },
            ExecutionContext::Remote(host) => {
                let mut cmd = Command::new("ssh");
                if let Some(port) = host.port {
                    cmd.arg("-p").arg(port.to_string());
                }
                let remote_command = match &options.cwd {
                    Some(dir) => format!("cd {} && {}", shell::arg(dir), command),
                    None => command.to_string(),
                };
                cmd.arg(host.ssh_target()).arg(shell::strict(&remote_command));
                cmd
            },
        }
    }
}

impl Default for ShellExecutor {
    fn default() -> Self {
        Self::new(Duration::from_secs(300))
    }
}

#[async_trait]
impl CommandExecutor for ShellExecutor {
    async fn execute(
        &self,
        context: &ExecutionContext,
        command: &str,
        options: &RunOptions,
    ) -> SyncResult<CommandOutput> {
        tracing::debug!(host = %context, cwd = ?options.cwd, command, "running command");

        let mut cmd = Self::build(context, command, options);
        if options.capture_output {
            cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        } else {
            cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        }
        cmd.kill_on_drop(true);

        let spawn_error = |source| SyncError::Spawn {
            host: context.to_string(),
            source,
        };

        let child = cmd.spawn().map_err(spawn_error)?;
        let waiting = child.wait_with_output();

        let output = match self.limit(options.timeout) {
            Some(limit) => match tokio::time::timeout(limit, waiting).await {
                Ok(result) => result.map_err(spawn_error)?,
                Err(_) => {
                    tracing::warn!(host = %context, command, "command timed out");
                    return Err(SyncError::Timeout {
                        host: context.to_string(),
                        command: command.to_string(),
                        secs: limit.as_secs(),
                    });
                },
            },
            None => waiting.await.map_err(spawn_error)?,
        };

        let result = CommandOutput {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !result.success() && !options.no_throw {
            return Err(SyncError::CommandFailed {
                host: context.to_string(),
                command: command.to_string(),
                status: result.status,
                stderr: result.stderr,
            });
        }

        Ok(result)
    }
}
