//! # dbsync
//!
//! Move a CMS database between a developer machine and its deployed hosts.
//!
//! A task exports the database on one host into a gzip-compressed dump,
//! copies it to the other side, verifies it at every step, imports it and
//! rewrites the site URLs stored in the data. Protected environments are
//! gated behind an interactive confirmation.
//!
//! Hosts, paths and command templates come from `.dbsync/config.toml`:
//!
//! ```toml
//! application = "library"
//! recipe = "bedrock"
//!
//! [hosts.production]
//! hostname = "web1.library.ca"
//! env = "production"
//! ```
//!
//! Commands run through a [`CommandExecutor`] and files move through a
//! [`TransferChannel`], both of which can be swapped out in tests.

pub mod config;
pub mod error;
pub mod executor;
pub mod host;
pub mod logging;
pub mod recipe;
pub mod shell;
pub mod sync;
pub mod transfer;

pub use config::{ConfigStore, SyncConfig};
pub use error::{SyncError, SyncResult};
pub use executor::{CommandExecutor, CommandOutput, RunOptions, ShellExecutor, Timeout};
pub use host::{Environment, ExecutionContext, RemoteHost};
pub use recipe::RecipeVariant;
pub use sync::{Operation, Pipeline, SyncOptions, TaskOutcome};
pub use transfer::{RsyncTransfer, TransferChannel};
