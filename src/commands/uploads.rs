//! `dbsync uploads push|pull`

use anyhow::Result;
use clap::Subcommand;

use dbsync::config::SyncConfig;
use dbsync::sync::{sync_uploads, StdinConfirm, UploadDirection};
use dbsync::RsyncTransfer;

#[derive(Debug, Subcommand)]
pub enum UploadsCommand {
    /// Copy local upload directories to a remote host
    Push {
        /// Host name from the config
        host: String,
    },

    /// Copy upload directories from a remote host
    Pull {
        /// Host name from the config
        host: String,
    },
}

impl UploadsCommand {
    pub async fn execute(&self, config: &SyncConfig) -> Result<()> {
        let (direction, host) = match self {
            UploadsCommand::Push { host } => (UploadDirection::Push, host),
            UploadsCommand::Pull { host } => (UploadDirection::Pull, host),
        };

        let transfer = RsyncTransfer::default();
        let outcome = sync_uploads(config, &transfer, &StdinConfirm, host, direction).await?;
        super::report(&outcome, direction.abort_notice());
        Ok(())
    }
}
