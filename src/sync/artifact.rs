//! The dump file in flight.

use std::fmt;

use crate::host::ExecutionContext;
use crate::shell;

/// A compressed dump at one location.
///
/// The verified flag only ever goes from false to true. Moving the dump
/// produces a new, unverified `Artifact` for the destination copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    filename: String,
    context: ExecutionContext,
    path: String,
    verified: bool,
}

impl Artifact {
    /// An artifact named `filename` inside `dir` on `context`.
    pub fn new(filename: impl Into<String>, context: ExecutionContext, dir: &str) -> Self {
        let filename = filename.into();
        let path = shell::join_path(dir, &filename);
        Self {
            filename,
            context,
            path,
            verified: false,
        }
    }

    /// The copy of this artifact at another location, not yet verified.
    pub fn relocated(&self, context: ExecutionContext, dir: &str) -> Self {
        Self::new(self.filename.clone(), context, dir)
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_verified(&self) -> bool {
        self.verified
    }

    pub fn mark_verified(&mut self) {
        self.verified = true;
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.context, self.path)
    }
}
