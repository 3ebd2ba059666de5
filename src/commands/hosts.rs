//! `dbsync hosts`

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use dbsync::config::SyncConfig;
use dbsync::ExecutionContext;

#[derive(Debug, Serialize)]
struct HostSummary {
    name: String,
    environment: String,
    protected: bool,
    context: ExecutionContext,
}

fn summarize(config: &SyncConfig) -> Result<Vec<HostSummary>> {
    std::iter::once("local")
        .chain(config.hosts.keys().map(String::as_str))
        .map(|name| {
            let environment = config.environment(name)?;
            Ok(HostSummary {
                name: name.to_string(),
                environment: environment.label,
                protected: environment.is_protected,
                context: config.context(name)?,
            })
        })
        .collect()
}

pub fn execute(config: &SyncConfig, format: &str) -> Result<()> {
    let hosts = summarize(config)?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&hosts)?);
        return Ok(());
    }

    println!("📋 {} ({})", config.application.bold(), config.recipe);
    println!();
    println!("{:<16} {:<14} {:<10} {}", "NAME", "ENV", "PROTECTED", "ADDRESS");
    for host in &hosts {
        let address = match &host.context {
            ExecutionContext::Local => "-".to_string(),
            ExecutionContext::Remote(remote) => match remote.port {
                Some(port) => format!("{}:{}", remote.ssh_target(), port),
                None => remote.ssh_target(),
            },
        };
        let protected = if host.protected {
            "yes".red().to_string()
        } else {
            "no".to_string()
        };
        println!(
            "{:<16} {:<14} {:<10} {}",
            host.name, host.environment, protected, address
        );
    }
    Ok(())
}
