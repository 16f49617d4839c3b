//! Log record structure

use super::field::Field;
use super::log_level::LogLevel;
use chrono::{DateTime, Utc};
use std::fmt;
use std::panic::Location;

/// Source location of a logging call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub file: &'static str,
    pub line: u32,
}

impl Caller {
    pub fn from_location(location: &'static Location<'static>) -> Self {
        Self {
            file: location.file(),
            line: location.line(),
        }
    }

    /// Last directory plus file name, e.g. `handlers/orders.rs:42`
    pub fn short(&self) -> String {
        let file = self.file;
        let trimmed = match file.rfind(['/', '\\']) {
            Some(last) => match file[..last].rfind(['/', '\\']) {
                Some(prev) => &file[prev + 1..],
                None => file,
            },
            None => file,
        };
        format!("{}:{}", trimmed.replace('\\', "/"), self.line)
    }
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// One log emission, built fresh for every call
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub level: LogLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub logger_name: String,
    pub caller: Option<Caller>,
    /// Caller-supplied fields, in call order
    pub fields: Vec<Field>,
    /// Request fields resolved from the bound context
    pub context_fields: Vec<Field>,
}

impl LogRecord {
    /// Sanitize log message to prevent log injection attacks
    ///
    /// Replaces newlines, carriage returns, and tabs with escape sequences
    /// so that one record always occupies one line.
    fn sanitize_message(message: &str) -> String {
        message
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t")
    }

    pub fn new(level: LogLevel, message: impl AsRef<str>) -> Self {
        Self {
            level,
            message: Self::sanitize_message(message.as_ref()),
            timestamp: Utc::now(),
            logger_name: String::new(),
            caller: None,
            fields: Vec::new(),
            context_fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.logger_name = name.into();
        self
    }

    #[must_use]
    pub fn with_caller(mut self, caller: Caller) -> Self {
        self.caller = Some(caller);
        self
    }

    #[must_use]
    pub fn with_fields(mut self, fields: Vec<Field>) -> Self {
        self.fields = fields;
        self
    }

    #[must_use]
    pub fn with_context_fields(mut self, fields: Vec<Field>) -> Self {
        self.context_fields = fields;
        self
    }

    /// Caller fields followed by context fields
    pub fn all_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().chain(self.context_fields.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::field::field;

    #[test]
    fn test_message_is_sanitized() {
        let record = LogRecord::new(LogLevel::Info, "line1\nline2\tend\r");
        assert_eq!(record.message, "line1\\nline2\\tend\\r");
    }

    #[test]
    fn test_short_caller() {
        let caller = Caller {
            file: "src/handlers/orders.rs",
            line: 42,
        };
        assert_eq!(caller.short(), "handlers/orders.rs:42");

        let caller = Caller {
            file: "main.rs",
            line: 7,
        };
        assert_eq!(caller.short(), "main.rs:7");

        let caller = Caller {
            file: "src\\win\\path.rs",
            line: 1,
        };
        assert_eq!(caller.short(), "win/path.rs:1");
    }

    #[test]
    fn test_all_fields_order() {
        let record = LogRecord::new(LogLevel::Debug, "m")
            .with_fields(vec![field("a", 1), field("b", 2)])
            .with_context_fields(vec![field("c", 3)]);

        let keys: Vec<&str> = record.all_fields().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }
}
