//! Logging configuration using tracing

use tracing_subscriber::EnvFilter;

/// Initialize the logging subsystem.
///
/// Logs go to stderr so the workout display on stdout stays clean.
/// Log level is controlled by the `PACER_LOG` environment variable.
///
/// # Examples
/// ```bash
/// PACER_LOG=debug pacer run
/// PACER_LOG=pacer_core=trace pacer run 27
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_env("PACER_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

    let result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();

    if result.is_ok() {
        tracing::debug!(version = env!("CARGO_PKG_VERSION"), "pacer starting");
    }
}
