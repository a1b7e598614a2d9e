//! Logging setup
//!
//! Console output through `tracing-subscriber`, plus an optional daily
//! rotating log file per scraper command written by `tracing-appender`.

use crate::HarvestError;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Rotated log files kept per command
pub const MAX_LOG_FILES: usize = 5;

/// Returns the filter directive for a verbosity level
///
/// `debug` (the `DEBUG` setting) acts like a single `-v`.
pub fn filter_directive(verbose: u8, quiet: bool, debug: bool) -> &'static str {
    if quiet {
        return "error";
    }
    let level = if debug { verbose.max(1) } else { verbose };
    match level {
        0 => "listing_harvest=info,warn",
        1 => "listing_harvest=debug,info",
        2 => "listing_harvest=trace,debug",
        _ => "trace",
    }
}

/// Sets up the logging/tracing subscriber
///
/// # Arguments
///
/// * `verbose` - Number of `-v` flags
/// * `quiet` - Only show errors
/// * `debug` - The `DEBUG` setting
/// * `log_file` - Directory and file prefix for the rotating log, if any
///
/// # Returns
///
/// * `Ok(Some(WorkerGuard))` - Keep the guard alive until exit so buffered
///   log lines are flushed
/// * `Ok(None)` - Console logging only
/// * `Err(HarvestError)` - The log directory or subscriber could not be set up
pub fn setup_logging(
    verbose: u8,
    quiet: bool,
    debug: bool,
    log_file: Option<(&Path, &str)>,
) -> Result<Option<WorkerGuard>, HarvestError> {
    let filter = EnvFilter::new(filter_directive(verbose, quiet, debug));

    let console = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);

    let (file_layer, guard) = match log_file {
        Some((dir, prefix)) => {
            std::fs::create_dir_all(dir)?;
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix(prefix)
                .filename_suffix("log")
                .max_log_files(MAX_LOG_FILES)
                .build(dir)
                .map_err(|e| HarvestError::Logging(e.to_string()))?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init()
        .map_err(|e| HarvestError::Logging(e.to_string()))?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directive_levels() {
        assert_eq!(filter_directive(0, false, false), "listing_harvest=info,warn");
        assert_eq!(filter_directive(1, false, false), "listing_harvest=debug,info");
        assert_eq!(filter_directive(2, false, false), "listing_harvest=trace,debug");
        assert_eq!(filter_directive(5, false, false), "trace");
    }

    #[test]
    fn test_quiet_wins() {
        assert_eq!(filter_directive(0, true, true), "error");
    }

    #[test]
    fn test_debug_setting_acts_as_verbose() {
        assert_eq!(filter_directive(0, false, true), "listing_harvest=debug,info");
        assert_eq!(filter_directive(2, false, true), "listing_harvest=trace,debug");
    }
}
