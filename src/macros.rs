//! Logging macros for formatted messages and field lists.
//!
//! The `*f!` macros take `format!`-style arguments and call the matching
//! formatted method, so the bound request fields land in one trailing
//! `request={...}` group.
//!
//! # Examples
//!
//! ```
//! use request_log::prelude::*;
//! use request_log::{fields, infof};
//!
//! let sink = MemoryAppender::new();
//! let logger = Logger::builder().appender(sink.clone()).build().unwrap();
//!
//! let port = 8080;
//! infof!(logger, "listening on port {}", port);
//! logger.info("ready", &fields!["port" => port, "tls" => false]);
//!
//! assert!(sink.lines()[0].contains("msg=\"listening on port 8080\""));
//! assert!(sink.lines()[1].contains("port=8080 tls=false"));
//! ```

/// Log a formatted message at the given level.
///
/// # Examples
///
/// ```
/// # use request_log::prelude::*;
/// # let logger = Logger::new();
/// use request_log::logf;
/// logf!(logger, LogLevel::Info, "Simple message");
/// logf!(logger, LogLevel::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! logf {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.logf($level, format_args!($($arg)+))
    };
}

/// Log a formatted debug-level message.
#[macro_export]
macro_rules! debugf {
    ($logger:expr, $($arg:tt)+) => {
        $logger.debugf(format_args!($($arg)+))
    };
}

/// Log a formatted info-level message.
///
/// # Examples
///
/// ```
/// # use request_log::prelude::*;
/// # let logger = Logger::new();
/// use request_log::infof;
/// infof!(logger, "Items: {}", 100);
/// ```
#[macro_export]
macro_rules! infof {
    ($logger:expr, $($arg:tt)+) => {
        $logger.infof(format_args!($($arg)+))
    };
}

/// Log a formatted warn-level message.
#[macro_export]
macro_rules! warnf {
    ($logger:expr, $($arg:tt)+) => {
        $logger.warnf(format_args!($($arg)+))
    };
}

/// Log a formatted error-level message.
#[macro_export]
macro_rules! errorf {
    ($logger:expr, $($arg:tt)+) => {
        $logger.errorf(format_args!($($arg)+))
    };
}

/// Build a `Vec<Field>` from `key => value` pairs.
///
/// # Examples
///
/// ```
/// use request_log::fields;
///
/// let fields = fields!["status" => 200, "path" => "/orders"];
/// assert_eq!(fields.len(), 2);
/// assert_eq!(fields[0].key, "status");
/// ```
#[macro_export]
macro_rules! fields {
    () => {
        ::std::vec::Vec::<$crate::core::Field>::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {
        vec![$($crate::core::Field::new($key, $value)),+]
    };
}
