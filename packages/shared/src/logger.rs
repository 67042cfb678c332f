//! Logging setup utilities for the Kobo binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber for a workspace binary.
///
/// Without `RUST_LOG`, dependencies are capped at `warn` and every workspace
/// crate (plus the running binary target) follows `default_log_level`.
/// Setting `RUST_LOG` replaces the filter entirely.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "kobo-server", "kobo-client")
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn", "error")
///
/// # Examples
///
/// ```no_run
/// use kobo_shared::logger::setup_logger;
///
/// setup_logger("kobo-server", "debug");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    let default_filter = format!(
        "warn,kobo_shared={level},kobo_server={level},kobo_client={level},{bin}={level}",
        level = default_log_level,
        bin = binary_name.replace('-', "_"),
    );

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
