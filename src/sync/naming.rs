//! Dump file naming.
//!
//! Names look like `library-production-blog-library-ca-2024-05-01T13-45-10-3fa91c2.sql.gz`:
//! application, environment, optional tenant scope, a filename-safe ISO 8601
//! timestamp and a 7-character hex salt. The salt keeps two dumps taken in
//! the same second apart; it is not a security property.

use chrono::NaiveDateTime;
use rand::RngExt;
use regex::Regex;
use std::sync::LazyLock;

/// Extension of every dump artifact.
pub const ARTIFACT_EXTENSION: &str = ".sql.gz";

/// Number of hex characters in the salt.
pub const SALT_LEN: usize = 7;

/// Timestamp format (hyphens, not colons, for filename compatibility).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H-%M-%S";

static UNSAFE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9-]+").expect("slug pattern is valid"));

/// Reduce a free-form tenant URL to `[A-Za-z0-9-]`.
///
/// Each run of other characters becomes a single `-`, so
/// `https://blog.library.ca/` becomes `https-blog-library-ca-`.
pub fn scope_slug(url: &str) -> String {
    UNSAFE_RUN.replace_all(url, "-").into_owned()
}

/// A fresh 7-character lowercase hex salt.
pub fn generate_salt() -> String {
    let mut rng = rand::rng();
    let value: u32 = rng.random_range(0..(1u32 << (4 * SALT_LEN as u32)));
    format!("{:0width$x}", value, width = SALT_LEN)
}

/// Build an artifact filename from its parts.
pub fn artifact_filename(
    application: &str,
    environment: &str,
    scope_url: Option<&str>,
    timestamp: &NaiveDateTime,
    salt: &str,
) -> String {
    let scope = scope_url
        .map(|url| format!("-{}", scope_slug(url)))
        .unwrap_or_default();

    format!(
        "{}-{}{}-{}-{}{}",
        application,
        environment,
        scope,
        timestamp.format(TIMESTAMP_FORMAT),
        salt,
        ARTIFACT_EXTENSION
    )
}

/// Name a new artifact now, with a fresh salt.
pub fn new_artifact_filename(
    application: &str,
    environment: &str,
    scope_url: Option<&str>,
) -> String {
    let now = chrono::Local::now().naive_local();
    artifact_filename(application, environment, scope_url, &now, &generate_salt())
}
