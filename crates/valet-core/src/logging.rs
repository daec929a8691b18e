//! Logging bootstrap.

use tracing::Level;

use crate::config::GeneralConfig;

/// Install the global tracing subscriber at the configured level.
///
/// Safe to call more than once; only the first installation wins.
pub fn init(config: &GeneralConfig) {
    let level = parse_level(&config.log_level);
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init();
}

fn parse_level(s: &str) -> Level {
    match s {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}
