//! The database sync pipeline and its stages.

pub mod artifact;
pub mod dirs;
pub mod guard;
pub mod naming;
pub mod pipeline;
pub mod rewrite;
pub mod settings;
pub mod uploads;
pub mod verify;

pub use artifact::Artifact;
pub use guard::{Confirm, EnvironmentGuard, StdinConfirm};
pub use pipeline::{Operation, Pipeline, SyncOptions, TaskOutcome};
pub use rewrite::{Direction, RewritePlan, RewriteRule, SiteUrls};
pub use settings::HostSettings;
pub use uploads::{sync_uploads, UploadDirection};
