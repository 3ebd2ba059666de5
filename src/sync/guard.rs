//! Confirmation gate for protected environments.

use std::io::{self, BufRead, Write};

use crate::error::SyncResult;
use crate::host::Environment;

/// Asks the operator a yes/no question.
pub trait Confirm: Send + Sync {
    fn confirm(&self, question: &str) -> SyncResult<bool>;
}

/// Prompts on the terminal; anything but `y`/`yes` declines.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, question: &str) -> SyncResult<bool> {
        print!("{} [y/N] ", question);
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().lock().read_line(&mut input)?;

        Ok(matches!(
            input.trim().to_lowercase().as_str(),
            "y" | "yes"
        ))
    }
}

/// Decides whether a task may touch an environment.
pub struct EnvironmentGuard<'a> {
    confirm: &'a dyn Confirm,
}

impl<'a> EnvironmentGuard<'a> {
    pub fn new(confirm: &'a dyn Confirm) -> Self {
        Self { confirm }
    }

    /// Unprotected environments pass without asking. Protected ones pass
    /// only when the operator confirms `question`.
    pub fn guard(&self, environment: &Environment, question: &str) -> SyncResult<bool> {
        if !environment.is_protected {
            return Ok(true);
        }

        let proceed = self.confirm.confirm(question)?;
        tracing::info!(
            environment = %environment.label,
            proceed,
            "protected environment confirmation"
        );
        Ok(proceed)
    }
}
