//! Logging infrastructure.
//!
//! The library itself only emits `tracing` events:
//! - `debug!` for committed cues and regions, section switches and layout passes
//! - `warn!` for lenient-mode parse diagnostics
//! - `trace!` for individual input lines and placement moves
//!
//! Binaries and tests install a subscriber with [`init_tracing`] or
//! [`init_test_tracing`].
//!
//! # Example
//!
//! ```no_run
//! use captions_core::logging::{init_tracing, LogLevel};
//!
//! init_tracing(LogLevel::Debug);
//! ```

mod types;

pub use types::LogLevel;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize global tracing subscriber for application-wide logging.
///
/// This sets up a subscriber that:
/// - Respects RUST_LOG environment variable
/// - Falls back to the provided default level
/// - Outputs to stderr with timestamps
///
/// Should be called once at application startup.
pub fn init_tracing(default_level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_to_filter_str(default_level)));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(filter)
        .init();
}

/// Initialize tracing for tests (only logs warnings and above).
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}

/// Convert LogLevel to filter string.
fn level_to_filter_str(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Trace => "trace",
        LogLevel::Debug => "debug",
        LogLevel::Info => "info",
        LogLevel::Warn => "warn",
        LogLevel::Error => "error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::captions::{parse_text, ParseOptions};

    #[test]
    fn level_to_filter_works() {
        assert_eq!(level_to_filter_str(LogLevel::Debug), "debug");
        assert_eq!(level_to_filter_str(LogLevel::Info), "info");
    }

    #[test]
    fn lenient_diagnostics_log_without_failing() {
        init_test_tracing();
        let result = parse_text(
            "WEBVTT\n\n00:00.000 --> 00:01.000 align:sideways\nHi\n",
            &ParseOptions::default().collect_errors(true),
        )
        .unwrap();
        assert_eq!(result.errors.map(|e| e.len()), Some(1));
    }
}
