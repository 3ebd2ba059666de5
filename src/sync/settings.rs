//! Immutable per-host settings resolved once a task is allowed to run.

use crate::config::{ConfigStore, SyncConfig};
use crate::error::{SyncError, SyncResult};
use crate::executor::{CommandExecutor, RunOptions};
use crate::host::{Environment, ExecutionContext};
use crate::recipe::RecipeVariant;
use crate::shell;

use super::rewrite::{RewriteTooling, SiteUrls};

/// Everything the pipeline needs to know about one side of a task.
///
/// Built after the guard has passed, since locating CLI tools runs commands
/// on the host. Never modified afterwards.
#[derive(Debug, Clone)]
pub struct HostSettings {
    pub context: ExecutionContext,
    pub environment: Environment,
    pub variant: RecipeVariant,
    /// Project directory commands run in
    pub release_path: String,
    pub deploy_path: String,
    pub backup_path: String,
    /// Canonical URLs of the site on this host
    pub site: SiteUrls,
    store: ConfigStore,
}

impl HostSettings {
    /// Resolve the settings of host `name`, locating the recipe's CLI tool
    /// on that host when the config does not name it.
    pub async fn resolve(
        config: &SyncConfig,
        name: &str,
        executor: &dyn CommandExecutor,
    ) -> SyncResult<Self> {
        let context = config.context(name)?;
        let environment = config.environment(name)?;
        let variant = config.recipe;
        let mut store = config.store_for(name)?;

        let release_path = store.get("release_or_current_path")?;
        let tool = variant.cli_tool();
        let tool_key = format!("bin/{}", tool);
        if !store.contains(&tool_key) {
            let php = store.get("bin/php")?;
            let located = locate_tool(executor, &context, tool, &release_path, &php).await?;
            tracing::info!(host = %context, tool, path = %located, "located CLI tool");
            store = store.with(&tool_key, located);
        }

        let (url_key, base_key) = if context.is_local() {
            ("local_url", "local_base_url")
        } else {
            ("url", "base_url")
        };
        let site = SiteUrls {
            url: store.get(url_key)?,
            base_url: if store.contains(base_key) {
                Some(store.get(base_key)?)
            } else {
                None
            },
        };

        Ok(Self {
            deploy_path: store.get("deploy_path")?,
            backup_path: store.get("backup_path")?,
            release_path,
            context,
            environment,
            variant,
            site,
            store,
        })
    }

    /// The dump command, optionally narrowed to `tables`.
    pub fn export_command(&self, tables: &[String]) -> SyncResult<String> {
        let scope = if tables.is_empty() {
            String::new()
        } else {
            format!("--tables={}", shell::arg(&tables.join(",")))
        };
        self.store
            .with("db_export_tables", scope)
            .get("db_export_command")
    }

    pub fn import_command(&self) -> SyncResult<String> {
        self.store.get("db_import_command")
    }

    /// Read-only command listing one tenant's tables as CSV.
    pub fn tables_command(&self, url: &str) -> SyncResult<String> {
        if !self.variant.supports_scoped_backup() || !self.store.contains("db_tables_command") {
            return Err(SyncError::Config(format!(
                "Scoped backups are not supported by the {} recipe",
                self.variant
            )));
        }
        Ok(format!(
            "{} --url={}",
            self.store.get("db_tables_command")?,
            shell::arg(url)
        ))
    }

    pub fn rewrite_tooling(&self) -> SyncResult<RewriteTooling> {
        Ok(RewriteTooling {
            wp: self.store.get("bin/wp")?,
            table_prefix: self.store.get("table_prefix")?,
            replace_options: self.store.get("wp_replace_options")?,
        })
    }

    /// Options for commands that run inside the project directory.
    pub fn in_project(&self) -> RunOptions {
        RunOptions::new().in_dir(self.release_path.clone())
    }
}

/// Find a CLI tool on a host: the project's `vendor/bin`, then `PATH`, then
/// the global Composer bin directory.
pub async fn locate_tool(
    executor: &dyn CommandExecutor,
    context: &ExecutionContext,
    tool: &str,
    release_path: &str,
    php: &str,
) -> SyncResult<String> {
    let vendored = shell::join_path(release_path, &format!("vendor/bin/{}", tool));
    if executor.test(context, &shell::file_exists(&vendored)).await? {
        return Ok(format!("{} {}", php, vendored));
    }

    let which = executor
        .execute(
            context,
            &shell::which(tool),
            &RunOptions::new().capture().no_throw(),
        )
        .await?;
    let on_path = which.stdout.trim();
    if which.success() && !on_path.is_empty() {
        return Ok(format!("{} {}", php, on_path));
    }

    let composer_check = format!("test -f \"$HOME/.composer/vendor/bin/{}\"", tool);
    if executor.test(context, &composer_check).await? {
        return Ok(format!("{} ~/.composer/vendor/bin/{}", php, tool));
    }

    Err(SyncError::ToolNotFound {
        tool: tool.to_string(),
        host: context.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::CommandOutput;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Answers commands from a fixed table; unknown commands fail.
    struct Table {
        answers: Vec<(&'static str, i32, &'static str)>,
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CommandExecutor for Table {
        async fn execute(
            &self,
            _context: &ExecutionContext,
            command: &str,
            _options: &RunOptions,
        ) -> SyncResult<CommandOutput> {
            self.seen.lock().unwrap().push(command.to_string());
            let (status, stdout) = self
                .answers
                .iter()
                .find(|(prefix, _, _)| command.starts_with(prefix))
                .map(|(_, status, stdout)| (*status, stdout.to_string()))
                .unwrap_or((1, String::new()));
            Ok(CommandOutput {
                status,
                stdout,
                stderr: String::new(),
            })
        }
    }

    #[tokio::test]
    async fn test_prefers_vendored_tool() {
        let executor = Table {
            answers: vec![("test -f /srv/current/vendor/bin/wp", 0, "")],
            seen: Mutex::new(Vec::new()),
        };
        let found = locate_tool(
            &executor,
            &ExecutionContext::Local,
            "wp",
            "/srv/current",
            "php8.2",
        )
        .await
        .unwrap();
        assert_eq!(found, "php8.2 /srv/current/vendor/bin/wp");
        assert_eq!(executor.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_falls_back_to_path_then_composer() {
        let on_path = Table {
            answers: vec![("command -v drush", 0, "/usr/local/bin/drush\n")],
            seen: Mutex::new(Vec::new()),
        };
        let found = locate_tool(&on_path, &ExecutionContext::Local, "drush", ".", "php")
            .await
            .unwrap();
        assert_eq!(found, "php /usr/local/bin/drush");

        let composer = Table {
            answers: vec![("test -f \"$HOME/.composer", 0, "")],
            seen: Mutex::new(Vec::new()),
        };
        let found = locate_tool(&composer, &ExecutionContext::Local, "wp", ".", "php")
            .await
            .unwrap();
        assert_eq!(found, "php ~/.composer/vendor/bin/wp");
    }

    #[tokio::test]
    async fn test_missing_tool_is_reported() {
        let nothing = Table {
            answers: Vec::new(),
            seen: Mutex::new(Vec::new()),
        };
        let err = locate_tool(&nothing, &ExecutionContext::Local, "wp", ".", "php")
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::ToolNotFound { .. }));
        assert_eq!(nothing.seen.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_resolve_uses_configured_tool_without_lookup() {
        let config = SyncConfig::from_toml(
            r#"
application = "library"
recipe = "bedrock"

[local.settings]
"bin/wp" = "wp"

[hosts.staging]
env = "staging"
[hosts.staging.settings]
"bin/wp" = "php /srv/wp"
url = "staging.library.ca"
"#,
        )
        .unwrap();
        let executor = Table {
            answers: Vec::new(),
            seen: Mutex::new(Vec::new()),
        };

        let staging = HostSettings::resolve(&config, "staging", &executor)
            .await
            .unwrap();
        assert!(executor.seen.lock().unwrap().is_empty());
        assert_eq!(staging.site.url, "staging.library.ca");
        assert_eq!(staging.site.base_url, None);
        assert_eq!(staging.backup_path, "/var/www/staging.library.ca/backup");
        assert_eq!(
            staging.export_command(&[]).unwrap(),
            "php /srv/wp db export  --single-transaction --skip-lock-tables -"
        );
        assert_eq!(
            staging
                .export_command(&["wp_2_posts".to_string(), "wp_2_options".to_string()])
                .unwrap(),
            "php /srv/wp db export --tables=wp_2_posts,wp_2_options --single-transaction --skip-lock-tables -"
        );

        let local = HostSettings::resolve(&config, "local", &executor)
            .await
            .unwrap();
        assert_eq!(local.site.url, "library.test");
        assert_eq!(local.release_path, ".");
    }

    #[tokio::test]
    async fn test_generic_rejects_scoped_backup() {
        let config = SyncConfig::from_toml(
            r#"
application = "intranet"
recipe = "drupal"
[local.settings]
"bin/drush" = "drush"
"#,
        )
        .unwrap();
        let executor = Table {
            answers: Vec::new(),
            seen: Mutex::new(Vec::new()),
        };
        let local = HostSettings::resolve(&config, "local", &executor)
            .await
            .unwrap();
        assert!(local.tables_command("a.example.com").is_err());
        assert_eq!(
            local.export_command(&[]).unwrap(),
            "drush sql-dump --extra=\"--skip-lock-tables\""
        );
    }
}
