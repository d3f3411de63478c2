//! Logging setup
//!
//! Installs a `tracing` subscriber writing compact lines to stderr, so that
//! stdout carries only the CSV report. `RUST_LOG` takes precedence over the
//! level passed on the command line.

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber
///
/// Returns an error if a global subscriber is already set or `default_level`
/// is not a valid filter directive.
pub fn init_logging(default_level: &str) -> Result<(), String> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| format!("Invalid log level '{}': {}", default_level, e))?;

    fmt()
        .compact()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| format!("Failed to initialize logging: {}", e))
}
