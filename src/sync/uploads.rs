//! Copy the configured upload directories between the project and a host.

use colored::Colorize;

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::shell;
use crate::transfer::TransferChannel;

use super::guard::{Confirm, EnvironmentGuard};
use super::pipeline::TaskOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadDirection {
    Push,
    Pull,
}

impl UploadDirection {
    pub fn abort_notice(self) -> &'static str {
        match self {
            UploadDirection::Push => "Upload push aborted!",
            UploadDirection::Pull => "Upload pull aborted!",
        }
    }
}

/// Push or pull every `sync_dirs` entry to or from `{{deploy_path}}/shared`.
///
/// Returns [`TaskOutcome::Aborted`] when the operator declines, otherwise
/// [`TaskOutcome::Copied`] with the number of directories copied.
pub async fn sync_uploads(
    config: &SyncConfig,
    transfer: &dyn TransferChannel,
    confirm: &dyn Confirm,
    host: &str,
    direction: UploadDirection,
) -> SyncResult<TaskOutcome> {
    let context = config.context(host)?;
    let remote = context.remote().cloned().ok_or_else(|| {
        SyncError::Config(format!(
            "Cannot sync uploads with `{}`: a remote host is required",
            host
        ))
    })?;

    let environment = config.environment(host)?;
    let question = match direction {
        UploadDirection::Push => format!(
            "Are you sure to push uploads to the {} environment?",
            environment
        ),
        UploadDirection::Pull => format!(
            "Are you sure to pull uploads from the {} environment?",
            environment
        ),
    };
    if !EnvironmentGuard::new(confirm).guard(&environment, &question)? {
        return Ok(TaskOutcome::Aborted);
    }

    if config.sync_dirs.is_empty() {
        tracing::warn!("no sync_dirs configured, nothing to copy");
    }

    let shared = shell::join_path(&config.store_for(host)?.get("deploy_path")?, "shared");
    for dir in &config.sync_dirs {
        let remote_path = shell::join_path(&shared, dir);
        match direction {
            UploadDirection::Push => {
                println!("✈︎ Uploading {} to {}", dir, remote.hostname.cyan());
                transfer.upload(&remote, dir, &remote_path).await?;
            },
            UploadDirection::Pull => {
                println!("✈︎ Downloading {} from {}", dir, remote.hostname.cyan());
                transfer.download(&remote, &remote_path, dir).await?;
            },
        }
    }

    Ok(TaskOutcome::Copied {
        host: remote.hostname,
        entries: config.sync_dirs.len(),
    })
}
