//! # request_log
//!
//! Request-scoped structured logging. Ingress code attaches request metadata
//! to an immutable [`Context`]; a [`Logger`] bound to that context renders
//! every schema field, defaulted when absent, on each line it emits.
//!
//! ## Features
//!
//! - **Layered Context**: O(1) attach, lock-free reads, typed keys
//! - **Fixed Schema**: request fields always present, always in the same order
//! - **Pluggable Encoders**: key=value lines by default, JSON lines on request
//! - **Thread Safe**: handles are cheap clones, lines never interleave
//!
//! ```
//! use request_log::prelude::*;
//!
//! let sink = MemoryAppender::new();
//! let logger = Logger::builder().appender(sink.clone()).build().unwrap();
//!
//! let ctx = Context::new()
//!     .attach(&keys::REQUEST_ID, "abc123")
//!     .attach(&keys::SIZE, 42);
//! logger.bind_context(&ctx).info("order placed", &[field("order", 17)]);
//!
//! assert!(sink.contents().contains("order=17 request_id=abc123"));
//! ```

pub mod appenders;
pub mod core;
pub mod encoder;
pub mod global;
pub mod macros;

pub mod prelude {
    pub use crate::appenders::{ConsoleAppender, FileAppender, MemoryAppender};
    pub use crate::core::{
        field, keys, Appender, Context, Field, FieldValue, LogLevel, Logger, LoggerBuilder,
        LoggerConfig, LoggerError, LoggerMetrics, RequestMetadata, Result,
    };
    pub use crate::encoder::{Encoder, EncoderConfig, EncoderRegistry};
}

pub use appenders::{ConsoleAppender, FileAppender, MemoryAppender};
pub use crate::core::{
    field, keys, materialize, Appender, Caller, ClockZone, Context, ContextValue, Field,
    FieldValue, Key, LogLevel, LogRecord, Logger, LoggerBuilder, LoggerConfig, LoggerError,
    LoggerMetrics, MaterializedFields, RequestMetadata, Result, SchemaField, TimestampFormat,
};
pub use encoder::{Encoder, EncoderConfig, EncoderRegistry, JsonEncoder, KvEncoder};
