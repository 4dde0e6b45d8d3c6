//! Logging to the terminal and the session log file

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use colored::{ColoredString, Colorize};
use log::{self, info};
use thiserror::Error;

// Internal imports
use crate::session;

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Minimum log level must be at least `INFO`, found `{0}`")]
    InvalidMinLogLevel(log::LevelFilter),

    #[error("Error initialising the log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("An error occured while setting up the logger: {0}")]
    FernInitError(log::SetLoggerError),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise the logger for this execution.
///
/// Records go to stdout and to the session's log file, prefixed with the elapsed session time. At
/// debug and trace the module emitting the record is shown too.
///
/// # Notes
///
/// - `min_level` must be at least `Info`, so that planner state changes are never hidden.
/// - This function must only be called once per execution.
pub fn logger_init(
    min_level: self::LevelFilter,
    session: &session::Session,
) -> Result<(), LoggerInitError> {
    if min_level < log::Level::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(min_level));
    }

    let log_file =
        fern::log_file(session.log_file_path.clone()).map_err(LoggerInitError::LogFileInitError)?;

    fern::Dispatch::new()
        .format(|out, message, record| {
            let elapsed_s = session::get_elapsed_seconds();
            let tag = level_to_str(record.level());

            match short_target(record.level(), record.target()) {
                Some(target) => out.finish(format_args!(
                    "[{:10.6} {}] {:>14}: {}",
                    elapsed_s, tag, target, message
                )),
                None => out.finish(format_args!("[{:10.6} {}] {}", elapsed_s, tag, message)),
            }
        })
        .level(min_level)
        .chain(std::io::stdout())
        .chain(log_file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised at {:?}", min_level);
    info!("    Session epoch: {}", session::get_epoch());
    info!("    Log file: {:?}", session.log_file_path);

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the string representation of a log level
fn level_to_str(level: log::Level) -> ColoredString {
    match level {
        log::Level::Trace => "TRC".dimmed().italic(),
        log::Level::Debug => "DBG".dimmed(),
        log::Level::Info => "INF".normal(),
        log::Level::Warn => "WRN".yellow(),
        log::Level::Error => "ERR".red().bold(),
    }
}

/// The last segment of the record's module path, only for debug and trace records.
fn short_target(level: log::Level, target: &str) -> Option<&str> {
    if level <= log::Level::Info {
        return None;
    }

    target.rsplit("::").next()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_level_tags() {
        assert!(level_to_str(log::Level::Warn).to_string().contains("WRN"));
        assert!(level_to_str(log::Level::Trace).to_string().contains("TRC"));
    }

    #[test]
    fn test_short_target() {
        assert_eq!(
            short_target(log::Level::Debug, "nav_lib::nav::comb_planner"),
            Some("comb_planner")
        );
        assert_eq!(
            short_target(log::Level::Trace, "planner_test"),
            Some("planner_test")
        );
        assert_eq!(short_target(log::Level::Info, "nav_lib::nav"), None);
        assert_eq!(short_target(log::Level::Warn, "nav_lib::nav"), None);
    }
}
