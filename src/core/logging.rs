//! Logging configuration and initialization
//!
//! This module sets up the tracing subscriber for structured logging
//! throughout the application.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the logging system with the specified level
///
/// `RUST_LOG` wins when set; otherwise the configured level is used.
///
/// # Arguments
///
/// * `log_level` - The log level string (trace, debug, info, warning, error, critical)
pub fn init_logging(log_level: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(resolve_level(log_level)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

/// Normalize a user-supplied level into one `EnvFilter` understands
///
/// Only the first word counts, so `.env` lines with trailing comments work.
/// Unknown levels fall back to "info".
fn resolve_level(log_level: &str) -> &'static str {
    let level = log_level
        .split_whitespace()
        .next()
        .unwrap_or("info")
        .to_lowercase();

    match level.as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "warn" | "warning" => "warn",
        "error" | "critical" => "error",
        _ => "info",
    }
}

#[cfg(test)]
mod tests {
    use super::resolve_level;

    #[test]
    fn test_resolve_level_aliases() {
        assert_eq!(resolve_level("WARNING"), "warn");
        assert_eq!(resolve_level("critical"), "error");
        assert_eq!(resolve_level("debug  # verbose"), "debug");
    }

    #[test]
    fn test_resolve_level_fallback() {
        assert_eq!(resolve_level(""), "info");
        assert_eq!(resolve_level("loud"), "info");
    }
}
