//! Post-condition check for produced and moved artifacts.

use crate::error::SyncResult;
use crate::executor::CommandExecutor;
use crate::host::ExecutionContext;
use crate::shell;

/// Whether `path` exists on `context` and is non-empty.
///
/// An empty dump is treated exactly like a missing one: a truncated export is
/// never a valid outcome.
pub async fn verify(
    executor: &dyn CommandExecutor,
    context: &ExecutionContext,
    path: &str,
) -> SyncResult<bool> {
    let ok = executor
        .test(context, &shell::file_is_non_empty(path))
        .await?;
    tracing::debug!(host = %context, path, ok, "verified artifact");
    Ok(ok)
}
