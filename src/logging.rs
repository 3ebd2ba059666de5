//! Tracing setup for the `dbsync` binary.

use tracing_subscriber::EnvFilter;

/// Filter directive used when `RUST_LOG` is not set.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "dbsync=warn",
        1 => "dbsync=info",
        2 => "dbsync=debug",
        _ => "dbsync=trace",
    }
}

/// Install the global subscriber. Logs go to stderr so operator output on
/// stdout stays clean; calling this twice is harmless.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
