//! Logger configuration
//!
//! A serde-deserializable description of a logger. Values come from defaults,
//! then an optional JSON document, then `REQUEST_LOG_*` environment variables.
//! Nothing is opened until [`LoggerConfig::build`], which fails on any
//! misconfiguration.

use super::{
    appender::Appender,
    error::{LoggerError, Result},
    log_level::LogLevel,
    logger::Logger,
};
use crate::appenders::{ConsoleAppender, ConsoleStream, FileAppender};
use crate::encoder::{EncoderConfig, EncoderRegistry, KV_ENCODING};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Minimum level override
pub const ENV_LEVEL: &str = "REQUEST_LOG_LEVEL";
/// Encoder name override
pub const ENV_ENCODING: &str = "REQUEST_LOG_ENCODING";
/// Comma-separated output destinations override
pub const ENV_OUTPUT: &str = "REQUEST_LOG_OUTPUT";

/// Destination name for standard output
pub const STDOUT: &str = "stdout";
/// Destination name for standard error
pub const STDERR: &str = "stderr";

/// Logger configuration
///
/// # Example
///
/// ```
/// use request_log::core::LoggerConfig;
///
/// let config = LoggerConfig::from_json_str(r#"{ "level": "debug", "name": "api" }"#).unwrap();
/// assert_eq!(config.encoding, "kv");
/// assert_eq!(config.output_paths, vec!["stdout"]);
///
/// let logger = config.build().unwrap();
/// assert_eq!(logger.name(), "api");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub level: LogLevel,
    /// Registered encoder name
    pub encoding: String,
    pub name: String,
    /// `"stdout"`, `"stderr"` or a file path
    pub output_paths: Vec<String>,
    /// Where the logger reports its own failures
    pub error_output_paths: Vec<String>,
    pub encoder: EncoderConfig,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            encoding: KV_ENCODING.to_string(),
            name: String::new(),
            output_paths: vec![STDOUT.to_string()],
            error_output_paths: vec![STDERR.to_string()],
            encoder: EncoderConfig::default(),
        }
    }
}

impl LoggerConfig {
    /// Parse a JSON document; missing keys keep their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            LoggerError::io_operation(
                "reading logger configuration",
                format!("cannot read '{}'", path.display()),
                e,
            )
        })?;
        Self::from_json_str(&json)
    }

    /// Overlay `REQUEST_LOG_*` variables from the process environment
    pub fn apply_env(self) -> Result<Self> {
        self.apply_env_from(|name| std::env::var(name).ok())
    }

    /// Overlay `REQUEST_LOG_*` variables read through `lookup`
    ///
    /// Blank values are ignored. An unparsable level is an error.
    pub fn apply_env_from<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(level) = read(ENV_LEVEL) {
            self.level = level
                .trim()
                .parse()
                .map_err(|e: String| LoggerError::config(ENV_LEVEL, e))?;
        }
        if let Some(encoding) = read(ENV_ENCODING) {
            self.encoding = encoding.trim().to_string();
        }
        if let Some(outputs) = read(ENV_OUTPUT) {
            self.output_paths = outputs.split(',').map(|p| p.trim().to_string()).collect();
        }
        Ok(self)
    }

    /// Check everything that can be checked without touching the filesystem
    pub fn validate(&self) -> Result<()> {
        if self.encoding.trim().is_empty() {
            return Err(LoggerError::config("LoggerConfig", "encoding must not be empty"));
        }
        if self.output_paths.is_empty() {
            return Err(LoggerError::config("LoggerConfig", "no output paths"));
        }
        if self.error_output_paths.is_empty() {
            return Err(LoggerError::config("LoggerConfig", "no error output paths"));
        }
        for path in self.output_paths.iter().chain(&self.error_output_paths) {
            if path.trim().is_empty() {
                return Err(LoggerError::destination(path.as_str(), "empty path"));
            }
        }
        self.encoder.validate()
    }

    /// Build a logger with the default encoders
    pub fn build(&self) -> Result<Logger> {
        self.build_with(&EncoderRegistry::with_defaults())
    }

    /// Build a logger resolving the encoding in `registry`
    pub fn build_with(&self, registry: &EncoderRegistry) -> Result<Logger> {
        self.validate()?;

        let encoder = registry.build(&self.encoding, &self.encoder)?;

        let mut builder = Logger::builder()
            .min_level(self.level)
            .name(self.name.as_str());
        for path in &self.output_paths {
            builder = builder.boxed_appender(open_destination(path)?);
        }
        for path in &self.error_output_paths {
            builder = builder.boxed_error_appender(open_destination(path)?);
        }

        builder.encoder_boxed(encoder).build()
    }
}

/// Turn one destination name into a sink
fn open_destination(destination: &str) -> Result<Box<dyn Appender>> {
    match destination.trim() {
        STDOUT => Ok(Box::new(ConsoleAppender::with_stream(ConsoleStream::Stdout))),
        STDERR => Ok(Box::new(ConsoleAppender::with_stream(ConsoleStream::Stderr))),
        "" => Err(LoggerError::destination(destination, "empty path")),
        path => {
            let appender = FileAppender::new(path)
                .map_err(|e| LoggerError::destination(path, e.to_string()))?;
            Ok(Box::new(appender))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = LoggerConfig::default();
        assert_eq!(config.level, LogLevel::Info);
        assert_eq!(config.encoding, "kv");
        assert_eq!(config.output_paths, vec!["stdout"]);
        assert_eq!(config.error_output_paths, vec!["stderr"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = LoggerConfig::from_json_str(
            r#"{ "level": "warn", "encoder": { "clock": "utc", "message_key": "message" } }"#,
        )
        .unwrap();

        assert_eq!(config.level, LogLevel::Warn);
        assert_eq!(config.encoding, "kv");
        assert_eq!(config.encoder.message_key, "message");
        assert_eq!(config.encoder.time_key, "t");
    }

    #[test]
    fn test_malformed_json() {
        let err = LoggerConfig::from_json_str("{ level: ").err().unwrap();
        assert!(matches!(err, LoggerError::JsonError(_)));
    }

    #[test]
    fn test_env_overlay() {
        let config = LoggerConfig::default()
            .apply_env_from(env(&[
                (ENV_LEVEL, "DEBUG"),
                (ENV_ENCODING, "json"),
                (ENV_OUTPUT, "stdout, /var/log/app.log"),
            ]))
            .unwrap();

        assert_eq!(config.level, LogLevel::Debug);
        assert_eq!(config.encoding, "json");
        assert_eq!(config.output_paths, vec!["stdout", "/var/log/app.log"]);
    }

    #[test]
    fn test_env_blank_values_ignored() {
        let config = LoggerConfig::default()
            .apply_env_from(env(&[(ENV_LEVEL, "  "), (ENV_OUTPUT, "")]))
            .unwrap();
        assert_eq!(config, LoggerConfig::default());
    }

    #[test]
    fn test_env_bad_level() {
        let err = LoggerConfig::default()
            .apply_env_from(env(&[(ENV_LEVEL, "loud")]))
            .err()
            .unwrap();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_validate_rejects_empty_destinations() {
        let config = LoggerConfig {
            output_paths: vec![],
            ..LoggerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(LoggerError::InvalidConfiguration { .. })
        ));

        let config = LoggerConfig {
            output_paths: vec!["stdout".to_string(), " ".to_string()],
            ..LoggerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(LoggerError::InvalidDestination { .. })
        ));
    }

    #[test]
    fn test_unknown_encoding_is_fatal() {
        let config = LoggerConfig {
            encoding: "kvpare".to_string(),
            ..LoggerConfig::default()
        };
        let err = config.build().err().unwrap();
        assert!(matches!(err, LoggerError::UnknownEncoder { .. }));
    }

    #[test]
    fn test_unopenable_file_is_fatal() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("no-such-dir").join("app.log");
        let config = LoggerConfig {
            output_paths: vec![missing.display().to_string()],
            ..LoggerConfig::default()
        };

        let err = config.build().err().unwrap();
        assert!(matches!(err, LoggerError::InvalidDestination { .. }));
    }

    #[test]
    fn test_build_file_logger() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let config = LoggerConfig {
            name: "svc".to_string(),
            output_paths: vec![path.display().to_string()],
            ..LoggerConfig::default()
        };

        let logger = config.build().unwrap();
        logger.info("hello", &[]);
        logger.flush().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains(" logger=svc "));
        assert!(content.contains("msg=\"hello\""));
    }
}
