//! Templated settings resolution.
//!
//! Settings are plain strings that may reference other settings with
//! `{{name}}`. References expand recursively at lookup time against the
//! merged layers, so a host override of `url` changes every setting built on it.

use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::error::{SyncError, SyncResult};

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z0-9_./-]+)\s*\}\}").expect("placeholder pattern is valid")
});

/// Maximum nesting of `{{name}}` references.
const MAX_DEPTH: usize = 32;

/// An immutable, layered view over named settings.
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    values: BTreeMap<String, String>,
}

impl ConfigStore {
    /// Build a store from layers, lowest precedence first.
    pub fn layered<'a, I, L>(layers: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut values = BTreeMap::new();
        for layer in layers {
            for (key, value) in layer {
                values.insert(key.to_string(), value.to_string());
            }
        }
        Self { values }
    }

    /// Return a copy of this store with one more setting on top.
    pub fn with(&self, key: &str, value: impl Into<String>) -> Self {
        let mut values = self.values.clone();
        values.insert(key.to_string(), value.into());
        Self { values }
    }

    /// Whether a setting is defined, without resolving it.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Resolve a setting, expanding every `{{name}}` reference.
    pub fn get(&self, key: &str) -> SyncResult<String> {
        let mut stack = Vec::new();
        self.resolve(key, &mut stack)
    }

    /// Expand `{{name}}` references in an arbitrary template.
    pub fn render(&self, template: &str) -> SyncResult<String> {
        let mut stack = Vec::new();
        self.expand(template, &mut stack)
    }

    fn resolve(&self, key: &str, stack: &mut Vec<String>) -> SyncResult<String> {
        if stack.iter().any(|k| k == key) {
            stack.push(key.to_string());
            return Err(SyncError::Config(format!(
                "Circular setting reference: {}",
                stack.join(" -> ")
            )));
        }
        if stack.len() >= MAX_DEPTH {
            return Err(SyncError::Config(format!(
                "Setting `{}` nests more than {} references",
                key, MAX_DEPTH
            )));
        }

        let raw = self.values.get(key).ok_or_else(|| {
            SyncError::Config(format!("Configuration parameter `{}` does not exist", key))
        })?;

        stack.push(key.to_string());
        let expanded = self.expand(raw, stack);
        stack.pop();
        expanded
    }

    fn expand(&self, template: &str, stack: &mut Vec<String>) -> SyncResult<String> {
        let mut failure = None;
        let rendered = PLACEHOLDER.replace_all(template, |caps: &Captures<'_>| {
            if failure.is_some() {
                return String::new();
            }
            match self.resolve(&caps[1], stack) {
                Ok(value) => value,
                Err(err) => {
                    failure = Some(err);
                    String::new()
                },
            }
        });

        match failure {
            Some(err) => Err(err),
            None => Ok(rendered.into_owned()),
        }
    }
}
