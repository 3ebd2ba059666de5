//! Error types for database sync operations.

use thiserror::Error;

/// Errors that halt a sync task.
///
/// Every stage failure names the host and path involved so the operator can
/// inspect what was left behind. Nothing is retried or rolled back.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The dump could not be produced, or the produced file is missing or empty
    #[error("Database export failed on {host}: {path} ({reason})")]
    ExportFailed {
        host: String,
        path: String,
        reason: String,
    },

    /// The dump could not be copied, or the copy is missing or empty
    #[error("Database transfer failed to {host}: {path} ({reason})")]
    TransferFailed {
        host: String,
        path: String,
        reason: String,
    },

    /// The dump could not be loaded into the destination database
    #[error("Database import failed on {host}: {path} ({reason})")]
    ImportFailed {
        host: String,
        path: String,
        reason: String,
    },

    /// A scoped backup matched no tables
    #[error(
        "Unable to find any database tables for URL {url}, are you sure it exists in this environment?"
    )]
    TenantLookupFailed { url: String },

    /// A backup or staging directory could not be created
    #[error("Unable to create directory {path} on {host}: {reason}")]
    DirectoryCreateFailed {
        host: String,
        path: String,
        reason: String,
    },

    /// A command exited with a non-zero status
    #[error("Command failed on {host} with status {status}: {command}{}", stderr_suffix(.stderr))]
    CommandFailed {
        host: String,
        command: String,
        status: i32,
        stderr: String,
    },

    /// A command exceeded its timeout and was killed
    #[error("Command timed out on {host} after {secs}s: {command}")]
    Timeout {
        host: String,
        command: String,
        secs: u64,
    },

    /// A process could not be started
    #[error("Failed to spawn process for {host}: {source}")]
    Spawn {
        host: String,
        #[source]
        source: std::io::Error,
    },

    /// A required CLI tool could not be located
    #[error("Cannot find {tool} on {host}. Please specify path to {tool} manually (setting `bin/{tool}`)")]
    ToolNotFound { tool: String, host: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("\n{}", trimmed)
    }
}

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;
