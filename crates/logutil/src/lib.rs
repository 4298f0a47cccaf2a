//! Utilities for logging.

use std::sync::Once;

use tracing::Level;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    HumanReadable,
    Json,
}

fn env_filter(level: Level) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy()
}

/// Configure the global logger.
///
/// `RUST_LOG` takes precedence over `level` for any directives it sets.
/// Errors if a global subscriber has already been installed.
pub fn configure_global_logger(
    level: Level,
    format: LogFormat,
) -> Result<(), SetGlobalDefaultError> {
    let builder = FmtSubscriber::builder()
        .with_env_filter(env_filter(level))
        .with_file(true)
        .with_line_number(true);

    match format {
        LogFormat::HumanReadable => tracing::subscriber::set_global_default(builder.finish()),
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish()),
    }
}

static TEST_INIT: Once = Once::new();

/// Install a subscriber that writes through the test harness.
///
/// Safe to call from every test, only the first call does anything.
pub fn init_test() {
    TEST_INIT.call_once(|| {
        let subscriber = FmtSubscriber::builder()
            .with_test_writer()
            .with_env_filter(env_filter(Level::DEBUG))
            .with_file(true)
            .with_line_number(true)
            .finish();
        // Another harness may have beaten us to it, that's fine.
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_test_idempotent() {
        init_test();
        init_test();
        tracing::debug!("logger initialized");
    }
}
