//! Logging configuration for the collector.
//!
//! Logs always go to stderr so that stdout carries nothing but metrics.

use tracing_subscriber::EnvFilter;

/// Initializes logging to stderr.
///
/// `RUST_LOG` takes precedence; otherwise `default_directive` (such as
/// `"info"` or `"debug"`) applies.
pub fn init_stderr_logging(default_directive: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(build_filter(default_directive))
        .with_writer(std::io::stderr)
        .init();
}

fn build_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}
