//! dbsync: move CMS databases between a developer machine and its hosts.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

/// Push, pull and back up CMS databases
#[derive(Parser)]
#[command(name = "dbsync")]
#[command(about = "Sync CMS databases between local and deployed environments", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to .dbsync/config.toml in the project)
    #[arg(long, global = true, env = "DBSYNC_CONFIG")]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Database push, pull and backup
    Db {
        #[command(subcommand)]
        command: commands::db::DbCommand,
    },

    /// Upload directory push and pull
    Uploads {
        #[command(subcommand)]
        command: commands::uploads::UploadsCommand,
    },

    /// List configured hosts and their environments
    Hosts {
        /// Output format
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },
}

fn main() {
    let cli = Cli::parse();
    dbsync::logging::init(cli.verbose);

    if let Err(e) = execute_command(cli) {
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }
}

fn execute_command(cli: Cli) -> Result<()> {
    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Db { command } => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(command.execute(&config))?;
        },
        Commands::Uploads { command } => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(command.execute(&config))?;
        },
        Commands::Hosts { format } => {
            commands::hosts::execute(&config, &format)?;
        },
    }
    Ok(())
}
