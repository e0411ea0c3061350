//! Subscriber setup for the `winminer` binary.

use tracing_subscriber::EnvFilter;
use winminer_settings::LoggingSettings;

/// Install the global subscriber, writing to stderr.
///
/// `RUST_LOG` wins over the configured level; `debug` forces `debug`.
/// Subsequent calls are no-ops.
pub fn init_subscriber(settings: &LoggingSettings, debug: bool) {
    let level = if debug { "debug" } else { settings.level.as_str() };
    let filter = if debug {
        EnvFilter::new(level)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    if settings.json {
        let _ = builder.json().try_init();
    } else {
        let _ = builder.compact().try_init();
    }
}
