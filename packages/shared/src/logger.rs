//! Logging setup utilities for the study-room binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber with the specified default log level.
///
/// Both the session library and the binary log at `default_log_level` unless
/// `RUST_LOG` is set, in which case the environment wins.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "studyroom")
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn", "error")
///
/// # Examples
///
/// ```no_run
/// use studyroom_shared::logger::setup_logger;
///
/// setup_logger("studyroom", "info");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                default_directives(binary_name, default_log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Build the filter directives used when `RUST_LOG` is not set.
fn default_directives(binary_name: &str, default_log_level: &str) -> String {
    format!(
        "studyroom_session={level},studyroom_cli={level},{bin}={level}",
        level = default_log_level,
        bin = binary_name.replace('-', "_"),
    )
}
