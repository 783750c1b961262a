//! Logging setup shared by the Courtlobby binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber for a binary.
///
/// Events from the Courtlobby library crates and from the binary itself are
/// emitted at `default_log_level`. `RUST_LOG` overrides the whole filter.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "courtlobby_server")
/// * `default_log_level` - The default log level (e.g., "debug", "info")
///
/// # Examples
///
/// ```no_run
/// use courtlobby_shared::logger::setup_logger;
///
/// setup_logger("courtlobby_server", "debug");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(binary_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build the default `EnvFilter` directive string.
fn default_filter(binary_name: &str, default_log_level: &str) -> String {
    [
        "courtlobby_shared",
        "courtlobby_server",
        "courtlobby_client",
        &binary_name.replace('-', "_"),
    ]
    .iter()
    .map(|target| format!("{}={}", target, default_log_level))
    .collect::<Vec<_>>()
    .join(",")
}
