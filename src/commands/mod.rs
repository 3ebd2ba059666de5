pub mod db;
pub mod hosts;
pub mod uploads;

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};

use dbsync::config::SyncConfig;
use dbsync::TaskOutcome;

/// Load the project config, either from an explicit file or by searching
/// upwards from the working directory.
///
/// Local paths in the config are relative to the project root, so the
/// process moves there before anything runs.
pub fn load_config(explicit: Option<&Path>) -> Result<SyncConfig> {
    let cwd = std::env::current_dir().context("Failed to read working directory")?;

    let config = match explicit {
        Some(path) => {
            let root = project_root_of(path).unwrap_or_else(|| cwd.clone());
            SyncConfig::load_file(path, &root)
                .with_context(|| format!("Failed to load {}", path.display()))?
        },
        None => {
            let root = SyncConfig::find_project_root(&cwd)?;
            SyncConfig::load(&root)?
        },
    };

    std::env::set_current_dir(&config.project_root).with_context(|| {
        format!(
            "Failed to enter project root {}",
            config.project_root.display()
        )
    })?;
    tracing::debug!(root = %config.project_root.display(), "loaded project config");
    Ok(config)
}

/// `<root>/.dbsync/config.toml` -> `<root>`; any other file -> its directory.
fn project_root_of(config_path: &Path) -> Option<PathBuf> {
    let dir = config_path.parent()?;
    if dir.file_name().is_some_and(|name| name == dbsync::config::CONFIG_DIR) {
        dir.parent().map(Path::to_path_buf)
    } else if dir.as_os_str().is_empty() {
        None
    } else {
        Some(dir.to_path_buf())
    }
}

/// Final operator-facing line for a finished task.
pub fn report(outcome: &TaskOutcome, abort_notice: &str) {
    match outcome {
        TaskOutcome::Aborted => println!("{}", abort_notice.yellow()),
        TaskOutcome::Completed { host, rules } => {
            println!("✅ Database synced to {} ({} rewrite rules)", host.cyan(), rules)
        },
        TaskOutcome::ImportSkipped { host, path } => {
            println!("✅ Dump available on {} at {}", host.cyan(), path.green())
        },
        TaskOutcome::BackedUp { host, path } => {
            println!("✅ Backup written on {} to {}", host.cyan(), path.green())
        },
        TaskOutcome::Copied { host, entries } => {
            println!("✅ {} upload directories synced with {}", entries, host.cyan())
        },
    }
}
