//! Recipe variants and their built-in command templates.
//!
//! A project declares which CMS recipe it uses once, in its config file. The
//! variant decides which CLI tool drives the database, which default settings
//! apply, and which URL rewrite ruleset runs after an import.

use serde::{Deserialize, Serialize};

use crate::error::SyncError;

/// The CMS recipe a project deploys with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RecipeVariant {
    /// Any database driven by drush (Drupal); no URL rewriting
    #[default]
    Generic,
    /// A single WordPress site (Bedrock)
    SingleSiteCms,
    /// A WordPress network with subdomain tenants (Bedrock multisite)
    MultiSiteCms,
}

impl RecipeVariant {
    /// CLI tool that exports and imports the database.
    pub fn cli_tool(self) -> &'static str {
        match self {
            RecipeVariant::Generic => "drush",
            RecipeVariant::SingleSiteCms | RecipeVariant::MultiSiteCms => "wp",
        }
    }

    /// Whether imports are followed by URL rewriting.
    pub fn rewrites_urls(self) -> bool {
        !matches!(self, RecipeVariant::Generic)
    }

    /// Whether a backup can be narrowed to one tenant's tables.
    pub fn supports_scoped_backup(self) -> bool {
        !matches!(self, RecipeVariant::Generic)
    }

    /// Built-in settings for this variant, lowest precedence in the config store.
    pub fn default_settings(self) -> Vec<(&'static str, &'static str)> {
        let mut settings = vec![
            ("url", "{{application}}.com"),
            ("local_url", "{{application}}.test"),
            ("deploy_path", "/var/www/{{url}}"),
            ("release_or_current_path", "{{deploy_path}}/current"),
            ("backup_path", "{{deploy_path}}/backup"),
            ("bin/php", "php"),
            ("db_export_tables", ""),
        ];

        match self {
            RecipeVariant::Generic => {
                settings.extend([
                    ("db_export_options", "--skip-lock-tables"),
                    (
                        "db_export_command",
                        "{{bin/drush}} sql-dump --extra=\"{{db_export_options}}\"",
                    ),
                    ("db_import_command", "{{bin/drush}} sql-cli"),
                ]);
            },
            RecipeVariant::SingleSiteCms | RecipeVariant::MultiSiteCms => {
                settings.extend([
                    ("db_export_options", "--single-transaction --skip-lock-tables"),
                    (
                        "db_export_command",
                        "{{bin/wp}} db export {{db_export_tables}} {{db_export_options}} -",
                    ),
                    ("db_import_command", "{{bin/wp}} db import -"),
                    (
                        "db_tables_command",
                        "{{bin/wp}} db tables {{wp_tables_options}}",
                    ),
                    ("table_prefix", "wp_"),
                    (
                        "wp_replace_options",
                        "--skip-plugins --skip-themes --skip-columns=guid --all-tables-with-prefix --report-changed-only",
                    ),
                    (
                        "wp_tables_options",
                        "--skip-plugins --skip-themes --all-tables-with-prefix --scope=blog --format=csv",
                    ),
                ]);
            },
        }

        if self == RecipeVariant::MultiSiteCms {
            // Subdomain network: every tenant hangs off a base domain
            settings.extend([
                ("base_url", "{{application}}.com"),
                ("local_base_url", "{{application}}.test"),
                ("url", "{{application}}.{{base_url}}"),
                ("local_url", "{{application}}.{{local_base_url}}"),
            ]);
        }

        settings
    }
}

impl std::str::FromStr for RecipeVariant {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "generic" | "drupal" => Ok(RecipeVariant::Generic),
            "single-site" | "singlesite" | "bedrock" | "wordpress" => {
                Ok(RecipeVariant::SingleSiteCms)
            },
            "multisite" | "multi-site" | "bedrock-multisite" => Ok(RecipeVariant::MultiSiteCms),
            _ => Err(SyncError::Config(format!(
                "Unknown recipe: {}. Valid recipes: generic, drupal, single-site, bedrock, multisite, bedrock-multisite",
                s
            ))),
        }
    }
}

impl std::fmt::Display for RecipeVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecipeVariant::Generic => write!(f, "generic"),
            RecipeVariant::SingleSiteCms => write!(f, "single-site"),
            RecipeVariant::MultiSiteCms => write!(f, "multisite"),
        }
    }
}

impl TryFrom<String> for RecipeVariant {
    type Error = SyncError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RecipeVariant> for String {
    fn from(variant: RecipeVariant) -> Self {
        variant.to_string()
    }
}
