//! `dbsync db push|pull|backup`

use anyhow::Result;
use clap::Subcommand;

use dbsync::config::SyncConfig;
use dbsync::sync::StdinConfirm;
use dbsync::{Operation, Pipeline, RsyncTransfer, ShellExecutor, SyncOptions};

#[derive(Debug, Subcommand)]
pub enum DbCommand {
    /// Replace the database on a remote host with the local one
    Push {
        /// Host name from the config
        host: String,

        /// Upload the dump but do not import it
        #[arg(long)]
        skip_import: bool,

        /// Also rewrite the main site URL in every table (multisite)
        #[arg(long)]
        full_replace: bool,
    },

    /// Replace the local database with the one on a remote host
    Pull {
        /// Host name from the config
        host: String,

        /// Download the dump but do not import it
        #[arg(long)]
        skip_import: bool,

        /// Also rewrite the main site URL in every table (multisite)
        #[arg(long)]
        full_replace: bool,
    },

    /// Dump a database into the host's backup directory
    Backup {
        /// Host name from the config, or `local`
        host: String,

        /// Back up only the tables of this site of a network
        #[arg(long)]
        url: Option<String>,
    },
}

impl DbCommand {
    pub async fn execute(&self, config: &SyncConfig) -> Result<()> {
        let (operation, host, options) = match self {
            DbCommand::Push {
                host,
                skip_import,
                full_replace,
            } => (
                Operation::Push,
                host,
                SyncOptions {
                    skip_import: *skip_import,
                    full_replace: *full_replace,
                    scope_url: None,
                },
            ),
            DbCommand::Pull {
                host,
                skip_import,
                full_replace,
            } => (
                Operation::Pull,
                host,
                SyncOptions {
                    skip_import: *skip_import,
                    full_replace: *full_replace,
                    scope_url: None,
                },
            ),
            DbCommand::Backup { host, url } => (
                Operation::Backup,
                host,
                SyncOptions {
                    scope_url: url.clone(),
                    ..SyncOptions::default()
                },
            ),
        };

        let executor = ShellExecutor::new(config.command_timeout());
        let transfer = RsyncTransfer::default();
        let pipeline = Pipeline::new(config, &executor, &transfer, &StdinConfirm);

        let outcome = pipeline.run(operation, host, &options).await?;
        super::report(&outcome, operation.abort_notice());
        Ok(())
    }
}
