//! Error types for the request logger
//!
//! Only construction-time problems surface as errors. Emission never returns
//! one to the caller; sink failures are routed to the error output instead.

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON (de)serialization error, raised while loading configuration
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// No encoder registered under the requested name
    #[error("Unknown encoder '{name}'")]
    UnknownEncoder { name: String },

    /// An encoder was registered twice under the same name
    #[error("Encoder '{name}' is already registered")]
    DuplicateEncoder { name: String },

    /// Output destination that cannot be turned into a sink
    #[error("Invalid output destination '{destination}': {message}")]
    InvalidDestination {
        destination: String,
        message: String,
    },

    /// File appender error with path
    #[error("File appender error for '{path}': {message}")]
    FileAppenderError { path: String, message: String },

    /// Writer error (generic)
    #[error("Writer error: {0}")]
    WriterError(String),

    /// The process-wide logger was already installed
    #[error("Global logger already initialized")]
    AlreadyInitialized,
}

impl LoggerError {
    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    pub fn unknown_encoder(name: impl Into<String>) -> Self {
        LoggerError::UnknownEncoder { name: name.into() }
    }

    pub fn duplicate_encoder(name: impl Into<String>) -> Self {
        LoggerError::DuplicateEncoder { name: name.into() }
    }

    /// Create an invalid destination error
    pub fn destination(destination: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidDestination {
            destination: destination.into(),
            message: message.into(),
        }
    }

    /// Create a file appender error
    pub fn file_appender(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileAppenderError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a writer error (generic)
    pub fn writer<S: Into<String>>(msg: S) -> Self {
        LoggerError::WriterError(msg.into())
    }
}
