#![deny(missing_docs)]
//! Logging macros shared by the sieve crates.
//!
//! Every macro forwards to the `log` facade. The binary decides where records
//! go; library crates only emit them.

use simplelog::{ColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode};

/// Re-exported so the macros resolve `log` from the caller's crate graph.
#[doc(hidden)]
pub use log as __log;

/// Environment variable read by [`initialize_for_tests`] to pick a level.
pub const TEST_LEVEL_VAR: &str = "SIEVE_TEST_LOG";

/// Trace-level record.
#[macro_export]
macro_rules! sieve_trace {
    ($($arg:tt)*) => {{
        $crate::__log::trace!($($arg)*);
    }};
}

/// Debug-level record, e.g. per-channel counts.
#[macro_export]
macro_rules! sieve_debug {
    ($($arg:tt)*) => {{
        $crate::__log::debug!($($arg)*);
    }};
}

/// Info-level record for run phases and totals.
#[macro_export]
macro_rules! sieve_info {
    ($($arg:tt)*) => {{
        $crate::__log::info!($($arg)*);
    }};
}

/// Warn-level record, used for fetch retries.
#[macro_export]
macro_rules! sieve_warn {
    ($($arg:tt)*) => {{
        $crate::__log::warn!($($arg)*);
    }};
}

/// Error-level record.
#[macro_export]
macro_rules! sieve_error {
    ($($arg:tt)*) => {{
        $crate::__log::error!($($arg)*);
    }};
}

/// Install a terminal logger for test output, limited to sieve crates.
///
/// The level comes from `SIEVE_TEST_LOG` (`trace`, `debug`, `info`, ...) and
/// defaults to `debug`. Safe to call from every test; only the first call
/// installs anything.
pub fn initialize_for_tests() {
    let level = std::env::var(TEST_LEVEL_VAR)
        .ok()
        .and_then(|value| value.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Debug);
    let config = ConfigBuilder::new().add_filter_allow_str("sieve").build();

    let _ = TermLogger::init(level, config, TerminalMode::Mixed, ColorChoice::Never);
}
