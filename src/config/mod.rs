//! Project configuration for database sync.
//!
//! Loaded from `.dbsync/config.toml` at the project root. The file names the
//! recipe, the protected environments and every remote host; all path and URL
//! settings are templated and resolved through [`ConfigStore`].

pub mod store;

pub use store::ConfigStore;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{SyncError, SyncResult};
use crate::host::{Environment, ExecutionContext, RemoteHost};
use crate::recipe::RecipeVariant;

/// Directory holding the config file, relative to the project root.
pub const CONFIG_DIR: &str = ".dbsync";
/// Config file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "config.toml";

/// Host names that refer to the operator's own machine.
const LOCAL_ALIASES: &[&str] = &["local", "localhost"];

/// Environment label of the local machine unless `[local] env` says otherwise.
const LOCAL_ENV: &str = "development";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Application name, used in URLs and dump filenames
    #[serde(default)]
    pub application: String,
    #[serde(default)]
    pub recipe: RecipeVariant,
    /// Environment labels that require confirmation
    #[serde(default = "default_protected_environments")]
    pub protected_environments: Vec<String>,
    /// Timeout for ordinary commands; exports and imports never time out
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,
    /// Directories copied by `uploads push|pull` (rsync format)
    #[serde(default)]
    pub sync_dirs: Vec<String>,
    /// Global templated settings
    #[serde(default)]
    pub settings: BTreeMap<String, String>,
    /// The operator's machine
    #[serde(default)]
    pub local: HostConfig,
    /// Remote hosts by name
    #[serde(default)]
    pub hosts: BTreeMap<String, HostConfig>,

    /// Project root directory (not serialized)
    #[serde(skip)]
    pub project_root: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostConfig {
    /// SSH hostname; defaults to the host's name in the config
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Environment label (production, staging, development, ...)
    #[serde(default)]
    pub env: String,
    /// Host-level templated settings
    #[serde(default)]
    pub settings: BTreeMap<String, String>,
}

fn default_protected_environments() -> Vec<String> {
    vec!["production".to_string()]
}

fn default_command_timeout() -> u64 {
    300
}

impl SyncConfig {
    /// Find the project root by walking up from `start` to the first
    /// directory containing `.dbsync/config.toml`.
    pub fn find_project_root(start: &Path) -> SyncResult<PathBuf> {
        let mut dir = start;
        loop {
            if dir.join(CONFIG_DIR).join(CONFIG_FILE).exists() {
                return Ok(dir.to_path_buf());
            }
            dir = dir.parent().ok_or_else(|| {
                SyncError::Config(format!(
                    "Could not find {}/{} in any parent directory",
                    CONFIG_DIR, CONFIG_FILE
                ))
            })?;
        }
    }

    /// Load and validate `.dbsync/config.toml` from a project root.
    pub fn load(project_root: &Path) -> SyncResult<Self> {
        let config_path = project_root.join(CONFIG_DIR).join(CONFIG_FILE);
        Self::load_file(&config_path, project_root)
    }

    /// Load and validate a config file at an explicit path.
    pub fn load_file(config_path: &Path, project_root: &Path) -> SyncResult<Self> {
        if !config_path.exists() {
            return Err(SyncError::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )));
        }

        let content = std::fs::read_to_string(config_path).map_err(|e| {
            SyncError::Config(format!(
                "Failed to read {}: {}",
                config_path.display(),
                e
            ))
        })?;

        let mut config = Self::from_toml(&content)?;
        config.project_root = project_root.to_path_buf();
        if config.application.is_empty() {
            config.application = project_root
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
        }
        config.validate()?;

        Ok(config)
    }

    /// Parse TOML content without validation or project context.
    pub fn from_toml(content: &str) -> SyncResult<Self> {
        toml::from_str(content)
            .map_err(|e| SyncError::Config(format!("Failed to parse config file: {}", e)))
    }

    /// Check the semantic rules the TOML schema cannot express.
    pub fn validate(&self) -> SyncResult<()> {
        if self.application.trim().is_empty() {
            return Err(SyncError::Config(
                "`application` must not be empty".to_string(),
            ));
        }
        if self.command_timeout_secs == 0 {
            return Err(SyncError::Config(
                "`command_timeout_secs` must be greater than zero".to_string(),
            ));
        }
        for name in self.hosts.keys() {
            if LOCAL_ALIASES.contains(&name.as_str()) {
                return Err(SyncError::Config(format!(
                    "Host name `{}` is reserved for the local machine; use [local] instead",
                    name
                )));
            }
        }
        for (name, host) in &self.hosts {
            if host.env.trim().is_empty() {
                return Err(SyncError::Config(format!(
                    "Host `{}` has no `env` label",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Default timeout for commands that are not exports or imports.
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    /// Whether a name refers to the local machine.
    pub fn is_local_name(name: &str) -> bool {
        LOCAL_ALIASES.contains(&name)
    }

    /// Look up a remote host by name.
    pub fn host(&self, name: &str) -> SyncResult<&HostConfig> {
        self.hosts.get(name).ok_or_else(|| {
            let known: Vec<&str> = self.hosts.keys().map(String::as_str).collect();
            SyncError::Config(format!(
                "Unknown host `{}`. Configured hosts: {}",
                name,
                if known.is_empty() {
                    "(none)".to_string()
                } else {
                    known.join(", ")
                }
            ))
        })
    }

    /// Execution context for a host name (`local` means this machine).
    pub fn context(&self, name: &str) -> SyncResult<ExecutionContext> {
        if Self::is_local_name(name) {
            return Ok(ExecutionContext::Local);
        }
        let host = self.host(name)?;
        Ok(ExecutionContext::Remote(RemoteHost {
            alias: name.to_string(),
            hostname: host.hostname.clone().unwrap_or_else(|| name.to_string()),
            user: host.remote_user.clone(),
            port: host.port,
        }))
    }

    /// Environment of a host name, with its protection resolved.
    pub fn environment(&self, name: &str) -> SyncResult<Environment> {
        let label = if Self::is_local_name(name) {
            if self.local.env.trim().is_empty() {
                LOCAL_ENV.to_string()
            } else {
                self.local.env.clone()
            }
        } else {
            self.host(name)?.env.clone()
        };
        Ok(Environment::new(label, &self.protected_environments))
    }

    /// Settings store seen from one host.
    ///
    /// Layers, lowest first: recipe defaults, local-machine defaults (for the
    /// local host), global `[settings]`, the host's own settings.
    pub fn store_for(&self, name: &str) -> SyncResult<ConfigStore> {
        let (host, context) = if Self::is_local_name(name) {
            (&self.local, ExecutionContext::Local)
        } else {
            (self.host(name)?, self.context(name)?)
        };

        let hostname = context.to_string();
        let base = [
            ("application", self.application.as_str()),
            ("hostname", hostname.as_str()),
        ];
        let local_defaults: &[(&str, &str)] = if context.is_local() {
            &[
                ("deploy_path", "."),
                ("release_or_current_path", "."),
                ("backup_path", "{{deploy_path}}/backup"),
            ]
        } else {
            &[]
        };

        let layers: Vec<Vec<(&str, &str)>> = vec![
            self.recipe.default_settings(),
            local_defaults.to_vec(),
            pairs(&self.settings),
            pairs(&host.settings),
            base.to_vec(),
        ];

        Ok(ConfigStore::layered(layers))
    }
}

fn pairs(map: &BTreeMap<String, String>) -> Vec<(&str, &str)> {
    map.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
application = "library"
recipe = "bedrock-multisite"

[settings]
base_url = "library.ca"

[local.settings]
local_base_url = "library.test"
"bin/wp" = "wp"

[hosts.production]
hostname = "web1.library.ca"
remote_user = "deploy"
env = "production"

[hosts.staging]
env = "staging"
port = 2222
[hosts.staging.settings]
base_url = "staging.library.ca"
"#;

    fn sample() -> SyncConfig {
        let config = SyncConfig::from_toml(SAMPLE).unwrap();
        config.validate().unwrap();
        config
    }

    #[test]
    fn test_defaults_apply() {
        let config = sample();
        assert_eq!(config.protected_environments, vec!["production"]);
        assert_eq!(config.command_timeout_secs, 300);
        assert_eq!(config.environment("local").unwrap().label, "development");
        assert_eq!(config.recipe, RecipeVariant::MultiSiteCms);
    }

    #[test]
    fn test_host_store_layers_settings() {
        let config = sample();
        let staging = config.store_for("staging").unwrap();
        assert_eq!(staging.get("url").unwrap(), "library.staging.library.ca");
        assert_eq!(
            staging.get("backup_path").unwrap(),
            "/var/www/library.staging.library.ca/backup"
        );

        let production = config.store_for("production").unwrap();
        assert_eq!(production.get("url").unwrap(), "library.library.ca");
        assert_eq!(production.get("hostname").unwrap(), "web1.library.ca");
    }

    #[test]
    fn test_local_store_uses_project_paths() {
        let config = sample();
        let local = config.store_for("local").unwrap();
        assert_eq!(local.get("deploy_path").unwrap(), ".");
        assert_eq!(local.get("backup_path").unwrap(), "./backup");
        assert_eq!(local.get("bin/wp").unwrap(), "wp");
        assert_eq!(local.get("local_url").unwrap(), "library.library.test");
    }

    #[test]
    fn test_environment_protection() {
        let config = sample();
        assert!(config.environment("production").unwrap().is_protected);
        assert!(!config.environment("staging").unwrap().is_protected);
        assert_eq!(config.environment("local").unwrap().label, "development");
    }

    #[test]
    fn test_unknown_host_lists_known_hosts() {
        let config = sample();
        let err = config.host("qa").unwrap_err().to_string();
        assert!(err.contains("production, staging"));
    }

    #[test]
    fn test_validation_rejects_reserved_and_unlabelled_hosts() {
        let mut config = sample();
        config.hosts.insert("local".to_string(), HostConfig {
            env: "staging".to_string(),
            ..HostConfig::default()
        });
        assert!(config.validate().is_err());

        let mut config = sample();
        config
            .hosts
            .insert("qa".to_string(), HostConfig::default());
        assert!(config.validate().unwrap_err().to_string().contains("qa"));
    }

    #[test]
    fn test_load_from_project_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("my-site");
        std::fs::create_dir_all(root.join(CONFIG_DIR)).unwrap();
        std::fs::write(
            root.join(CONFIG_DIR).join(CONFIG_FILE),
            "recipe = \"drupal\"\n",
        )
        .unwrap();

        let nested = root.join("web").join("sites");
        std::fs::create_dir_all(&nested).unwrap();
        let found = SyncConfig::find_project_root(&nested).unwrap();
        assert_eq!(found, root);

        let config = SyncConfig::load(&found).unwrap();
        assert_eq!(config.application, "my-site");
        assert_eq!(config.recipe, RecipeVariant::Generic);
    }

    #[test]
    fn test_missing_config_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = SyncConfig::load(dir.path()).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }
}
