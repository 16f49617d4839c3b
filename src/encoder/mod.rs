//! Line encoders and the registry they are selected from
//!
//! An encoder turns a [`LogRecord`] into one newline-terminated line. Encoders
//! are looked up by name when the logger is built; an unknown name is a
//! configuration error.

pub mod json;
pub mod kv;

pub use json::JsonEncoder;
pub use kv::KvEncoder;

use crate::core::{ClockZone, LogRecord, LoggerError, Result, TimestampFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Name of the key=value encoder
pub const KV_ENCODING: &str = "kv";
/// Name of the JSON-lines encoder
pub const JSON_ENCODING: &str = "json";

/// Rendered in place of a value that has no textual form (NaN, infinity)
pub const INVALID_VALUE: &str = "<invalid>";

/// Serializes one record into one line
pub trait Encoder: Send + Sync {
    /// Never fails; unrepresentable values become placeholders.
    fn encode(&self, record: &LogRecord) -> String;
    fn name(&self) -> &str;
}

/// Key names and clock settings shared by the encoders
///
/// # Examples
///
/// ```
/// use request_log::encoder::EncoderConfig;
/// use request_log::core::ClockZone;
///
/// let config = EncoderConfig::new()
///     .with_clock(ClockZone::Utc)
///     .with_message_key("message");
/// assert_eq!(config.message_key, "message");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    pub time_key: String,
    pub level_key: String,
    pub name_key: String,
    pub caller_key: String,
    pub message_key: String,
    pub timestamp_format: TimestampFormat,
    pub clock: ClockZone,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            time_key: "t".to_string(),
            level_key: "level".to_string(),
            name_key: "logger".to_string(),
            caller_key: "caller".to_string(),
            message_key: "msg".to_string(),
            timestamp_format: TimestampFormat::default(),
            clock: ClockZone::default(),
        }
    }
}

impl EncoderConfig {
    /// Create a new encoder configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: ClockZone) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_message_key(mut self, key: impl Into<String>) -> Self {
        self.message_key = key.into();
        self
    }

    /// Reject header keys that would not render verbatim and unparseable
    /// timestamp patterns
    pub fn validate(&self) -> Result<()> {
        let keys = [
            ("time_key", &self.time_key),
            ("level_key", &self.level_key),
            ("name_key", &self.name_key),
            ("caller_key", &self.caller_key),
            ("message_key", &self.message_key),
        ];
        for (what, key) in keys {
            if key.trim().is_empty() {
                return Err(LoggerError::config("EncoderConfig", format!("{} is empty", what)));
            }
            if kv::escape_key(key) != *key {
                return Err(LoggerError::config(
                    "EncoderConfig",
                    format!("{} {:?} is not a bare key", what, key),
                ));
            }
        }
        if !self.timestamp_format.is_valid() {
            return Err(LoggerError::config(
                "EncoderConfig",
                format!("invalid timestamp format {:?}", self.timestamp_format),
            ));
        }
        Ok(())
    }
}

/// Builds an encoder from the shared configuration
pub type EncoderFactory = Arc<dyn Fn(&EncoderConfig) -> Result<Box<dyn Encoder>> + Send + Sync>;

/// Named encoder constructors
#[derive(Clone, Default)]
pub struct EncoderRegistry {
    factories: HashMap<String, EncoderFactory>,
}

impl EncoderRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the `kv` and `json` encoders
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.factories.insert(
            KV_ENCODING.to_string(),
            Arc::new(|config: &EncoderConfig| -> Result<Box<dyn Encoder>> {
                Ok(Box::new(KvEncoder::new(config.clone())))
            }),
        );
        registry.factories.insert(
            JSON_ENCODING.to_string(),
            Arc::new(|config: &EncoderConfig| -> Result<Box<dyn Encoder>> {
                Ok(Box::new(JsonEncoder::new(config.clone())))
            }),
        );
        registry
    }

    /// Register an encoder under `name`; names are unique
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> Result<()>
    where
        F: Fn(&EncoderConfig) -> Result<Box<dyn Encoder>> + Send + Sync + 'static,
    {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(LoggerError::config("EncoderRegistry", "encoder name is empty"));
        }
        if self.factories.contains_key(&name) {
            return Err(LoggerError::duplicate_encoder(name));
        }
        self.factories.insert(name, Arc::new(factory));
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Construct the encoder registered under `name`
    pub fn build(&self, name: &str, config: &EncoderConfig) -> Result<Box<dyn Encoder>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| LoggerError::unknown_encoder(name))?;
        config.validate()?;
        factory(config)
    }
}

impl fmt::Debug for EncoderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncoderRegistry")
            .field("encoders", &self.names())
            .finish()
    }
}

/// Minimal line used when an encoder panics
pub(crate) fn fallback_line(record: &LogRecord) -> String {
    format!(
        "level={} msg={:?} encode_error=true\n",
        record.level.as_str(),
        record.message
    )
}
