//! Logging for the program.
//!
//! The log level is taken from settings, with the `MERCADO_LOG_LEVEL`
//! environment variable as an override. When an output directory is supplied
//! the log is also written to a file there.
use anyhow::{Context, Result};
use chrono::Local;
use log::LevelFilter;
use std::env;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

/// The default program log level
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// The environment variable which overrides the configured log level
pub const LOG_LEVEL_ENV_VAR: &str = "MERCADO_LOG_LEVEL";

/// The name of the log file written to the output directory
const LOG_FILE_NAME: &str = "mercado.log";

static LOGGER_INITIALISED: AtomicBool = AtomicBool::new(false);

/// Whether the program logger has been initialised
pub fn is_logger_initialised() -> bool {
    LOGGER_INITIALISED.load(Ordering::Relaxed)
}

/// Initialise the program logger.
///
/// # Arguments
///
/// * `log_level` - The log level from settings (may be overridden by the
///   environment)
/// * `output_path` - If provided, the log is also written to a file in this
///   directory
pub fn init(log_level: &str, output_path: Option<&Path>) -> Result<()> {
    let log_level = env::var(LOG_LEVEL_ENV_VAR).unwrap_or_else(|_| log_level.to_string());
    let log_level = log_level
        .parse::<LevelFilter>()
        .ok()
        .with_context(|| format!("invalid log level {log_level:?}"))?;

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {message}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target()
            ))
        })
        .level(log_level)
        .chain(std::io::stderr());

    if let Some(output_path) = output_path {
        let log_path = output_path.join(LOG_FILE_NAME);
        let log_file = fern::log_file(&log_path)
            .with_context(|| format!("Could not create log file {}", log_path.display()))?;
        dispatch = dispatch.chain(log_file);
    }

    dispatch.apply().context("Logger already initialised")?;
    LOGGER_INITIALISED.store(true, Ordering::Relaxed);

    Ok(())
}
