//! Core logger types and traits

pub mod appender;
pub mod config;
pub mod context;
pub mod error;
pub mod field;
pub mod fields;
pub mod log_level;
pub mod log_record;
pub mod logger;
pub mod metrics;
pub mod timestamp;

pub use appender::Appender;
pub use config::LoggerConfig;
pub use context::{keys, Context, ContextType, ContextValue, Key, RequestMetadata};
pub use error::{LoggerError, Result};
pub use field::{field, Field, FieldValue};
pub use fields::{materialize, materialize_at, MaterializedFields, SchemaField};
pub use log_level::LogLevel;
pub use log_record::{Caller, LogRecord};
pub use logger::{Logger, LoggerBuilder};
pub use metrics::LoggerMetrics;
pub use timestamp::{ClockZone, TimestampFormat};
