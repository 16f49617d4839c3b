//! Process-wide default logger
//!
//! Installed once with [`init`] or [`init_from_config`]; the first use without
//! an explicit install builds the default ([`Logger::new`]) and installing
//! afterwards fails with [`LoggerError::AlreadyInitialized`].

use crate::core::{Context, Field, Logger, LoggerConfig, LoggerError, Result};
use std::fmt;
use std::sync::OnceLock;

static GLOBAL_LOGGER: OnceLock<Logger> = OnceLock::new();

/// Install `logger` as the process-wide default
pub fn init(logger: Logger) -> Result<()> {
    GLOBAL_LOGGER
        .set(logger)
        .map_err(|_| LoggerError::AlreadyInitialized)
}

/// Build from `config` and install the result
pub fn init_from_config(config: &LoggerConfig) -> Result<()> {
    init(config.build()?)
}

/// The process-wide default, built on first use if nothing was installed
pub fn logger() -> &'static Logger {
    GLOBAL_LOGGER.get_or_init(Logger::new)
}

pub fn is_initialized() -> bool {
    GLOBAL_LOGGER.get().is_some()
}

/// Default logger bound to `context`
pub fn with_context(context: &Context) -> Logger {
    logger().bind_context(context)
}

#[track_caller]
pub fn debug(message: impl AsRef<str>, fields: &[Field]) {
    logger().debug(message, fields);
}

#[track_caller]
pub fn info(message: impl AsRef<str>, fields: &[Field]) {
    logger().info(message, fields);
}

#[track_caller]
pub fn warn(message: impl AsRef<str>, fields: &[Field]) {
    logger().warn(message, fields);
}

#[track_caller]
pub fn error(message: impl AsRef<str>, fields: &[Field]) {
    logger().error(message, fields);
}

#[track_caller]
pub fn infof(args: fmt::Arguments<'_>) {
    logger().infof(args);
}

/// Flush the default logger's sinks; a no-op if it was never used
pub fn flush() -> Result<()> {
    match GLOBAL_LOGGER.get() {
        Some(logger) => logger.flush(),
        None => Ok(()),
    }
}
