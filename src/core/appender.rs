//! Appender trait for log output destinations

use super::{error::Result, log_level::LogLevel};

/// Destination for encoded lines
///
/// `line` is already newline-terminated. Implementations must write it as a
/// unit; the logger holds a lock per appender while `append` runs.
pub trait Appender: Send + Sync {
    fn append(&mut self, line: &str, level: LogLevel) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
    fn name(&self) -> &str;
}
