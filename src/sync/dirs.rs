//! Idempotent backup directory creation.

use crate::error::{SyncError, SyncResult};
use crate::executor::{CommandExecutor, RunOptions};
use crate::host::ExecutionContext;
use crate::shell;

/// Create `path` on `context` unless it already is a directory.
pub async fn ensure(
    executor: &dyn CommandExecutor,
    context: &ExecutionContext,
    path: &str,
) -> SyncResult<()> {
    let options = RunOptions::new().capture().no_throw();
    let output = executor
        .execute(context, &shell::ensure_dir(path), &options)
        .await
        .map_err(|err| SyncError::DirectoryCreateFailed {
            host: context.to_string(),
            path: path.to_string(),
            reason: err.to_string(),
        })?;

    if !output.success() {
        return Err(SyncError::DirectoryCreateFailed {
            host: context.to_string(),
            path: path.to_string(),
            reason: if output.stderr.trim().is_empty() {
                format!("mkdir exited with status {}", output.status)
            } else {
                output.stderr.trim().to_string()
            },
        });
    }

    tracing::debug!(host = %context, path, "directory ensured");
    Ok(())
}
