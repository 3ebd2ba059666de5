//! Push, pull and backup.
//!
//! Each task is one sequential run through the stages below. The guard is
//! consulted before anything touches a host; after that any failing stage
//! halts the task and leaves whatever artifact it produced in place.

use colored::Colorize;
use std::fmt;

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::executor::{CommandExecutor, RunOptions};
use crate::host::{Environment, ExecutionContext, RemoteHost};
use crate::shell;
use crate::transfer::TransferChannel;

use super::artifact::Artifact;
use super::guard::{Confirm, EnvironmentGuard};
use super::naming;
use super::rewrite::{self, Direction};
use super::settings::HostSettings;
use super::{dirs, verify};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Push,
    Pull,
    Backup,
}

impl Operation {
    fn question(self, environment: &Environment) -> String {
        match self {
            Operation::Push => format!(
                "Are you sure to push the database to the {} environment?",
                environment
            ),
            Operation::Pull => format!(
                "Are you sure to pull the database from the {} environment?",
                environment
            ),
            Operation::Backup => format!(
                "Are you sure you want to backup the {} database?",
                environment
            ),
        }
    }

    /// Printed when the operator declines.
    pub fn abort_notice(self) -> &'static str {
        match self {
            Operation::Push => "DB push aborted!",
            Operation::Pull => "DB pull aborted!",
            Operation::Backup => "DB backup aborted!",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Push => write!(f, "push"),
            Operation::Pull => write!(f, "pull"),
            Operation::Backup => write!(f, "backup"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Stop after the dump has arrived; do not import it
    pub skip_import: bool,
    /// Also rewrite the primary tenant URL in every table (multisite)
    pub full_replace: bool,
    /// Back up only this tenant's tables
    pub scope_url: Option<String>,
}

/// How a task ended, when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The operator declined; nothing ran
    Aborted,
    /// Imported and rewritten on `host`
    Completed { host: String, rules: usize },
    /// Transferred but not imported; the dump stays at `path` on `host`
    ImportSkipped { host: String, path: String },
    /// Dump written to `path` on `host`
    BackedUp { host: String, path: String },
    /// Upload directories copied to or from `host`
    Copied { host: String, entries: usize },
}

/// Pipeline stages, logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Init,
    Guarded,
    Directoried,
    Exported,
    ExportVerified,
    Transferred,
    TransferVerified,
    SourceCleaned,
    Imported,
    Rewritten,
    Cleaned,
    Done,
    Aborted,
}

struct Progress {
    operation: Operation,
    stage: Stage,
}

impl Progress {
    fn new(operation: Operation) -> Self {
        tracing::debug!(%operation, stage = ?Stage::Init, "task started");
        Self {
            operation,
            stage: Stage::Init,
        }
    }

    fn advance(&mut self, next: Stage) {
        tracing::debug!(operation = %self.operation, from = ?self.stage, to = ?next, "stage");
        self.stage = next;
    }
}

/// Runs database tasks against one project configuration.
pub struct Pipeline<'a> {
    config: &'a SyncConfig,
    executor: &'a dyn CommandExecutor,
    transfer: &'a dyn TransferChannel,
    confirm: &'a dyn Confirm,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: &'a SyncConfig,
        executor: &'a dyn CommandExecutor,
        transfer: &'a dyn TransferChannel,
        confirm: &'a dyn Confirm,
    ) -> Self {
        Self {
            config,
            executor,
            transfer,
            confirm,
        }
    }

    pub async fn run(
        &self,
        operation: Operation,
        host: &str,
        options: &SyncOptions,
    ) -> SyncResult<TaskOutcome> {
        match operation {
            Operation::Push => self.push(host, options).await,
            Operation::Pull => self.pull(host, options).await,
            Operation::Backup => self.backup(host, options).await,
        }
    }

    /// Replace the database on `host` with the local one.
    pub async fn push(&self, host: &str, options: &SyncOptions) -> SyncResult<TaskOutcome> {
        let mut progress = Progress::new(Operation::Push);
        let remote_host = self.remote_host(host, Operation::Push)?;
        let environment = self.config.environment(host)?;
        if !self.guard(Operation::Push, &environment)? {
            progress.advance(Stage::Aborted);
            return Ok(TaskOutcome::Aborted);
        }
        progress.advance(Stage::Guarded);

        let local = HostSettings::resolve(self.config, "local", self.executor).await?;
        let remote = HostSettings::resolve(self.config, host, self.executor).await?;
        println!(
            "✈︎ Pushing local database to {}",
            remote.context.to_string().cyan()
        );

        let filename = naming::new_artifact_filename(
            &self.config.application,
            &environment.label,
            None,
        );
        let mut source = Artifact::new(filename, ExecutionContext::Local, &local.deploy_path);
        self.export(&local, &source, &[]).await?;
        progress.advance(Stage::Exported);
        self.verify_export(&mut source).await?;
        progress.advance(Stage::ExportVerified);

        dirs::ensure(self.executor, &remote.context, &remote.backup_path).await?;
        progress.advance(Stage::Directoried);

        let mut dest = source.relocated(remote.context.clone(), &remote.backup_path);
        self.transfer
            .upload(&remote_host, source.path(), dest.path())
            .await?;
        progress.advance(Stage::Transferred);
        self.verify_transfer(&mut dest).await?;
        progress.advance(Stage::TransferVerified);

        self.remove(&source).await?;
        progress.advance(Stage::SourceCleaned);

        if options.skip_import {
            println!("⏭️  Import skipped, dump left at {}", dest.to_string().green());
            progress.advance(Stage::Done);
            return Ok(TaskOutcome::ImportSkipped {
                host: dest.context().to_string(),
                path: dest.path().to_string(),
            });
        }

        self.import(&remote, &dest).await?;
        progress.advance(Stage::Imported);
        let rules = self
            .rewrite(Direction::LocalToRemote, &local, &remote, options)
            .await?;
        progress.advance(Stage::Rewritten);
        self.remove(&dest).await?;
        progress.advance(Stage::Cleaned);

        progress.advance(Stage::Done);
        Ok(TaskOutcome::Completed {
            host: remote.context.to_string(),
            rules,
        })
    }

    /// Replace the local database with the one on `host`.
    pub async fn pull(&self, host: &str, options: &SyncOptions) -> SyncResult<TaskOutcome> {
        let mut progress = Progress::new(Operation::Pull);
        let remote_host = self.remote_host(host, Operation::Pull)?;
        let environment = self.config.environment(host)?;
        if !self.guard(Operation::Pull, &environment)? {
            progress.advance(Stage::Aborted);
            return Ok(TaskOutcome::Aborted);
        }
        progress.advance(Stage::Guarded);

        let remote = HostSettings::resolve(self.config, host, self.executor).await?;
        let local = HostSettings::resolve(self.config, "local", self.executor).await?;
        println!(
            "✈︎ Pulling database from {}",
            remote.context.to_string().cyan()
        );

        dirs::ensure(self.executor, &remote.context, &remote.backup_path).await?;
        progress.advance(Stage::Directoried);

        let filename = naming::new_artifact_filename(
            &self.config.application,
            &environment.label,
            None,
        );
        let mut source = Artifact::new(filename, remote.context.clone(), &remote.backup_path);
        self.export(&remote, &source, &[]).await?;
        progress.advance(Stage::Exported);
        self.verify_export(&mut source).await?;
        progress.advance(Stage::ExportVerified);

        let mut dest = source.relocated(ExecutionContext::Local, &local.deploy_path);
        self.transfer
            .download(&remote_host, source.path(), dest.path())
            .await?;
        progress.advance(Stage::Transferred);
        self.verify_transfer(&mut dest).await?;
        progress.advance(Stage::TransferVerified);

        self.remove(&source).await?;
        progress.advance(Stage::SourceCleaned);

        if options.skip_import {
            println!("⏭️  Import skipped, dump left at {}", dest.path().green());
            progress.advance(Stage::Done);
            return Ok(TaskOutcome::ImportSkipped {
                host: dest.context().to_string(),
                path: dest.path().to_string(),
            });
        }

        self.import(&local, &dest).await?;
        progress.advance(Stage::Imported);
        let rules = self
            .rewrite(Direction::RemoteToLocal, &local, &remote, options)
            .await?;
        progress.advance(Stage::Rewritten);
        self.remove(&dest).await?;
        progress.advance(Stage::Cleaned);

        progress.advance(Stage::Done);
        Ok(TaskOutcome::Completed {
            host: local.context.to_string(),
            rules,
        })
    }

    /// Dump the database on `host` (or `local`) into its backup directory.
    pub async fn backup(&self, host: &str, options: &SyncOptions) -> SyncResult<TaskOutcome> {
        let mut progress = Progress::new(Operation::Backup);
        let environment = self.config.environment(host)?;
        if !self.guard(Operation::Backup, &environment)? {
            progress.advance(Stage::Aborted);
            return Ok(TaskOutcome::Aborted);
        }
        progress.advance(Stage::Guarded);

        let target = HostSettings::resolve(self.config, host, self.executor).await?;

        let tables = match options.scope_url.as_deref() {
            Some(url) => self.tenant_tables(&target, url).await?,
            None => Vec::new(),
        };

        dirs::ensure(self.executor, &target.context, &target.backup_path).await?;
        progress.advance(Stage::Directoried);

        let filename = naming::new_artifact_filename(
            &self.config.application,
            &environment.label,
            options.scope_url.as_deref(),
        );
        let mut artifact = Artifact::new(filename, target.context.clone(), &target.backup_path);
        println!(
            "✈︎ Backing up database on {} to: {}",
            target.context.to_string().cyan().bold(),
            artifact.path().green().bold()
        );

        self.export(&target, &artifact, &tables).await?;
        progress.advance(Stage::Exported);
        self.verify_export(&mut artifact).await?;
        progress.advance(Stage::ExportVerified);

        progress.advance(Stage::Done);
        Ok(TaskOutcome::BackedUp {
            host: artifact.context().to_string(),
            path: artifact.path().to_string(),
        })
    }

    fn remote_host(&self, host: &str, operation: Operation) -> SyncResult<RemoteHost> {
        self.config
            .context(host)?
            .remote()
            .cloned()
            .ok_or_else(|| {
                SyncError::Config(format!(
                    "Cannot {} the database with `{}`: a remote host is required",
                    operation, host
                ))
            })
    }

    fn guard(&self, operation: Operation, environment: &Environment) -> SyncResult<bool> {
        EnvironmentGuard::new(self.confirm).guard(environment, &operation.question(environment))
    }

    async fn export(
        &self,
        settings: &HostSettings,
        artifact: &Artifact,
        tables: &[String],
    ) -> SyncResult<()> {
        let command = shell::export_to(&settings.export_command(tables)?, artifact.path());
        tracing::info!(host = %settings.context, path = artifact.path(), "exporting database");
        self.executor
            .execute(&settings.context, &command, &settings.in_project().unbounded())
            .await
            .map_err(|err| SyncError::ExportFailed {
                host: settings.context.to_string(),
                path: artifact.path().to_string(),
                reason: err.to_string(),
            })?;
        Ok(())
    }

    async fn verify_export(&self, artifact: &mut Artifact) -> SyncResult<()> {
        if !verify::verify(self.executor, artifact.context(), artifact.path()).await? {
            return Err(SyncError::ExportFailed {
                host: artifact.context().to_string(),
                path: artifact.path().to_string(),
                reason: "dump is missing or empty".to_string(),
            });
        }
        artifact.mark_verified();
        Ok(())
    }

    async fn verify_transfer(&self, artifact: &mut Artifact) -> SyncResult<()> {
        if !verify::verify(self.executor, artifact.context(), artifact.path()).await? {
            return Err(SyncError::TransferFailed {
                host: artifact.context().to_string(),
                path: artifact.path().to_string(),
                reason: "copied dump is missing or empty".to_string(),
            });
        }
        artifact.mark_verified();
        Ok(())
    }

    async fn import(&self, settings: &HostSettings, artifact: &Artifact) -> SyncResult<()> {
        println!("📥 Importing database");
        let command = shell::import_from(artifact.path(), &settings.import_command()?);
        tracing::info!(host = %settings.context, path = artifact.path(), "importing database");
        self.executor
            .execute(&settings.context, &command, &settings.in_project().unbounded())
            .await
            .map_err(|err| SyncError::ImportFailed {
                host: settings.context.to_string(),
                path: artifact.path().to_string(),
                reason: err.to_string(),
            })?;
        Ok(())
    }

    /// Run the rewrite plan on the destination; returns the number of rules run.
    async fn rewrite(
        &self,
        direction: Direction,
        local: &HostSettings,
        remote: &HostSettings,
        options: &SyncOptions,
    ) -> SyncResult<usize> {
        let dest = match direction {
            Direction::LocalToRemote => remote,
            Direction::RemoteToLocal => local,
        };
        if !dest.variant.rewrites_urls() {
            tracing::debug!(variant = %dest.variant, "no URL rewrite for recipe");
            return Ok(0);
        }

        let plan = rewrite::plan(
            dest.variant,
            direction,
            &local.site,
            &remote.site,
            options.full_replace,
        )?;
        println!("🔁 Replacing URLs in database");
        for notice in &plan.notices {
            tracing::warn!("{}", notice);
            println!("{} {}", "ℹ️ ".yellow(), notice);
        }

        let tooling = dest.rewrite_tooling()?;
        for rule in &plan.rules {
            let command = rule.to_command(&tooling, &plan.network_url)?;
            tracing::debug!(
                host = %dest.context,
                network = rule.scope.is_network(),
                %command,
                "rewriting URLs"
            );
            self.executor
                .execute(&dest.context, &command, &dest.in_project())
                .await?;
        }
        Ok(plan.rules.len())
    }

    async fn remove(&self, artifact: &Artifact) -> SyncResult<()> {
        tracing::debug!(artifact = %artifact, "removing transferred dump");
        self.executor
            .execute(
                artifact.context(),
                &shell::remove_file(artifact.path()),
                &RunOptions::new(),
            )
            .await?;
        Ok(())
    }

    /// Tables belonging to one tenant of the network, never empty.
    async fn tenant_tables(&self, target: &HostSettings, url: &str) -> SyncResult<Vec<String>> {
        let command = target.tables_command(url)?;
        let output = self
            .executor
            .execute(
                &target.context,
                &command,
                &target.in_project().capture().no_throw(),
            )
            .await?;

        let tables: Vec<String> = output
            .stdout
            .split([',', '\n'])
            .map(str::trim)
            .filter(|table| !table.is_empty())
            .map(str::to_string)
            .collect();
        if !output.success() || tables.is_empty() {
            return Err(SyncError::TenantLookupFailed {
                url: url.to_string(),
            });
        }

        tracing::info!(url, count = tables.len(), "resolved tenant tables");
        Ok(tables)
    }
}
