//! URL rewriting after an import.
//!
//! Rules are generated from the source and destination site URLs and run as
//! `wp search-replace` commands on the destination. Each rule can also be
//! applied in-process with the same semantics.
//!
//! Multisite networks keep their tenant subdomains: a regex rule rewrites
//! `scheme://(sub.)*{source-base}` to `http://\1{dest-base}` in the option
//! tables, and an exact rule swaps the base domain in the tenant registry.
//! `--full-replace` additionally rewrites the primary tenant URL everywhere;
//! sub-tenant URLs outside the option tables are left to the operator.

use regex::Regex;

use crate::error::{SyncError, SyncResult};
use crate::recipe::RecipeVariant;
use crate::shell;

/// Delimiter passed to `wp search-replace --regex-delimiter`.
pub const REGEX_DELIMITER: char = '%';

/// Shown whenever `--full-replace` runs against a network.
pub const FULL_REPLACE_NOTICE: &str =
    "--full-replace not fully implemented. Main URL will be changed, but not sub-sites.";

/// Which way the database is moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Local data lands on a remote host (push)
    LocalToRemote,
    /// Remote data lands on the local machine (pull)
    RemoteToLocal,
}

impl Direction {
    /// Remote hosts are served over TLS; local development sites are not.
    pub fn destination_scheme(self) -> &'static str {
        match self {
            Direction::LocalToRemote => "https",
            Direction::RemoteToLocal => "http",
        }
    }
}

/// The canonical URLs of one side of a sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteUrls {
    /// Primary site URL, without scheme
    pub url: String,
    /// Network base domain (multisite only)
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewritePattern {
    /// Exact text
    Literal(String),
    /// `https?://([A-Za-z0-9_.]*\.){base}`, capturing the subdomain prefix
    Subdomains { base: String },
}

impl RewritePattern {
    /// The pattern as handed to `wp search-replace`.
    pub fn as_search(&self) -> String {
        match self {
            RewritePattern::Literal(text) => text.clone(),
            RewritePattern::Subdomains { base } => {
                // ASCII only: PCRE's `\w` is, Rust's is Unicode
                format!(r"https?://([A-Za-z0-9_.]*\.){}", regex::escape(base))
            },
        }
    }

    pub fn is_regex(&self) -> bool {
        matches!(self, RewritePattern::Subdomains { .. })
    }
}

/// Tables a rule touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteScope {
    /// Every table with the site prefix, `guid` column skipped
    PrefixedTables,
    /// `{prefix}*options` on every tenant
    NetworkOptions,
    /// `{prefix}blogs` and `{prefix}site`
    TenantRegistry,
    /// Every table on every tenant
    NetworkAllTables,
}

impl RewriteScope {
    pub fn is_network(self) -> bool {
        !matches!(self, RewriteScope::PrefixedTables)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteRule {
    pub pattern: RewritePattern,
    /// Replacement text; `$1` refers to the captured subdomains of a regex rule
    pub replacement: String,
    pub scope: RewriteScope,
}

/// Resolved tool settings needed to render rules as commands.
#[derive(Debug, Clone)]
pub struct RewriteTooling {
    pub wp: String,
    pub table_prefix: String,
    pub replace_options: String,
}

impl RewriteRule {
    /// Apply the rule to one value, exactly as the command would.
    pub fn apply(&self, value: &str) -> SyncResult<String> {
        match &self.pattern {
            RewritePattern::Literal(text) => Ok(value.replace(text.as_str(), &self.replacement)),
            RewritePattern::Subdomains { .. } => {
                let regex = Regex::new(&self.pattern.as_search())
                    .map_err(|e| SyncError::Config(format!("Invalid rewrite pattern: {}", e)))?;
                // PCRE `$1` followed by a letter would read as a named group here
                let replacement = self.replacement.replace("$1", "${1}");
                Ok(regex.replace_all(value, replacement.as_str()).into_owned())
            },
        }
    }

    /// Render the rule as a `wp search-replace` command.
    ///
    /// `network_url` selects the tenant the command boots as; it is the
    /// primary URL as it appears in the freshly imported data.
    pub fn to_command(&self, tooling: &RewriteTooling, network_url: &str) -> SyncResult<String> {
        let search = self.pattern.as_search();
        if self.pattern.is_regex() && search.contains(REGEX_DELIMITER) {
            return Err(SyncError::Config(format!(
                "Rewrite pattern `{}` contains the regex delimiter `{}`",
                search, REGEX_DELIMITER
            )));
        }

        let mut parts = vec![
            tooling.wp.clone(),
            "search-replace".to_string(),
            shell::arg(&search),
            shell::arg(&self.replacement),
        ];
        let url_arg = format!("--url={}", shell::arg(network_url));

        match self.scope {
            RewriteScope::PrefixedTables => {
                parts.push(tooling.replace_options.clone());
            },
            RewriteScope::NetworkOptions => {
                parts.push(shell::arg(&format!("{}*options", tooling.table_prefix)));
                parts.push(url_arg);
                parts.push("--network --skip-plugins --skip-themes --regex".to_string());
                parts.push(format!("--regex-delimiter='{}'", REGEX_DELIMITER));
            },
            RewriteScope::TenantRegistry => {
                parts.push(shell::arg(&format!("{}blogs", tooling.table_prefix)));
                parts.push(shell::arg(&format!("{}site", tooling.table_prefix)));
                parts.push(url_arg);
                parts.push("--network --skip-plugins --skip-themes".to_string());
            },
            RewriteScope::NetworkAllTables => {
                parts.push(url_arg);
                parts.push("--network".to_string());
                parts.push(tooling.replace_options.clone());
            },
        }

        Ok(parts
            .into_iter()
            .filter(|part| !part.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" "))
    }
}

/// Rules to run after an import, plus notices for the operator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewritePlan {
    pub rules: Vec<RewriteRule>,
    /// Tenant URL the network-wide commands boot as
    pub network_url: String,
    pub notices: Vec<String>,
}

impl RewritePlan {
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Apply every rule in order to one value.
    pub fn apply(&self, value: &str) -> SyncResult<String> {
        self.rules
            .iter()
            .try_fold(value.to_string(), |current, rule| rule.apply(&current))
    }
}

/// Build the rewrite plan for an import.
pub fn plan(
    variant: RecipeVariant,
    direction: Direction,
    local: &SiteUrls,
    remote: &SiteUrls,
    full_replace: bool,
) -> SyncResult<RewritePlan> {
    let (source, dest) = match direction {
        Direction::LocalToRemote => (local, remote),
        Direction::RemoteToLocal => (remote, local),
    };

    match variant {
        RecipeVariant::Generic => Ok(RewritePlan::default()),
        RecipeVariant::SingleSiteCms => {
            let target = format!("{}://{}", direction.destination_scheme(), dest.url);
            let rules = ["http", "https"]
                .iter()
                .map(|scheme| RewriteRule {
                    pattern: RewritePattern::Literal(format!("{}://{}", scheme, source.url)),
                    replacement: target.clone(),
                    scope: RewriteScope::PrefixedTables,
                })
                .collect();
            Ok(RewritePlan {
                rules,
                network_url: source.url.clone(),
                notices: Vec::new(),
            })
        },
        RecipeVariant::MultiSiteCms => {
            let source_base = require_base(source)?;
            let dest_base = require_base(dest)?;

            let mut rules = vec![
                RewriteRule {
                    pattern: RewritePattern::Subdomains {
                        base: source_base.to_string(),
                    },
                    replacement: format!("http://$1{}", dest_base),
                    scope: RewriteScope::NetworkOptions,
                },
                RewriteRule {
                    pattern: RewritePattern::Literal(source_base.to_string()),
                    replacement: dest_base.to_string(),
                    scope: RewriteScope::TenantRegistry,
                },
            ];
            let mut notices = Vec::new();

            if full_replace {
                notices.push(FULL_REPLACE_NOTICE.to_string());
                let from_scheme = match direction {
                    Direction::LocalToRemote => "http",
                    Direction::RemoteToLocal => "https",
                };
                rules.push(RewriteRule {
                    pattern: RewritePattern::Literal(format!(
                        "{}://{}",
                        from_scheme, source.url
                    )),
                    replacement: format!("http://{}", dest.url),
                    scope: RewriteScope::NetworkAllTables,
                });
            }

            Ok(RewritePlan {
                rules,
                network_url: source.url.clone(),
                notices,
            })
        },
    }
}

fn require_base(site: &SiteUrls) -> SyncResult<&str> {
    let base = site.base_url.as_deref().ok_or_else(|| {
        SyncError::Config(format!(
            "Multisite rewrite needs a base URL for {}",
            site.url
        ))
    })?;
    if base.contains(REGEX_DELIMITER) {
        return Err(SyncError::Config(format!(
            "Base URL `{}` contains the regex delimiter `{}`",
            base, REGEX_DELIMITER
        )));
    }
    Ok(base)
}
