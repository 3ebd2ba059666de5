//! Execution contexts and environments.

use serde::Serialize;
use std::fmt;

/// A remote machine reachable over SSH.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteHost {
    /// Name of the host in the config file
    pub alias: String,
    pub hostname: String,
    pub user: Option<String>,
    pub port: Option<u16>,
}

impl RemoteHost {
    /// `user@hostname`, or just the hostname without a user.
    pub fn ssh_target(&self) -> String {
        match &self.user {
            Some(user) => format!("{}@{}", user, self.hostname),
            None => self.hostname.clone(),
        }
    }
}

/// Where a command runs.
///
/// Every executor and transfer call takes the context explicitly; nothing
/// in the pipeline relies on an ambient "current host".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExecutionContext {
    /// The operator's machine
    Local,
    /// A deployed host
    Remote(RemoteHost),
}

impl ExecutionContext {
    pub fn is_local(&self) -> bool {
        matches!(self, ExecutionContext::Local)
    }

    /// The remote host, if any.
    pub fn remote(&self) -> Option<&RemoteHost> {
        match self {
            ExecutionContext::Local => None,
            ExecutionContext::Remote(host) => Some(host),
        }
    }
}

impl fmt::Display for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionContext::Local => write!(f, "localhost"),
            ExecutionContext::Remote(host) => write!(f, "{}", host.hostname),
        }
    }
}

/// Attributes of a target host that matter for gating and naming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Environment {
    pub label: String,
    pub is_protected: bool,
}

impl Environment {
    /// An environment is protected when its label is in the protected set.
    pub fn new(label: impl Into<String>, protected: &[String]) -> Self {
        let label = label.into();
        let is_protected = protected.iter().any(|p| p == &label);
        Self {
            label,
            is_protected,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ssh_target() {
        let mut host = RemoteHost {
            alias: "production".to_string(),
            hostname: "web1.example.org".to_string(),
            user: Some("deploy".to_string()),
            port: None,
        };
        assert_eq!(host.ssh_target(), "deploy@web1.example.org");
        host.user = None;
        assert_eq!(host.ssh_target(), "web1.example.org");
    }

    #[test]
    fn test_environment_protection_is_exact_match() {
        let protected = vec!["production".to_string()];
        assert!(Environment::new("production", &protected).is_protected);
        assert!(!Environment::new("production-copy", &protected).is_protected);
        assert!(!Environment::new("", &protected).is_protected);
    }
}
