//! Timestamp formatting utilities
//!
//! Records capture their time in UTC; the zone used for rendering is chosen
//! by the encoder configuration.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Rendered in place of a timestamp that cannot be formatted
pub const INVALID_TIMESTAMP: &str = "<invalid-time>";

/// Timestamp format options
///
/// # Examples
///
/// ```
/// use request_log::core::{ClockZone, TimestampFormat};
/// use chrono::{TimeZone, Utc};
///
/// let t = Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45).unwrap();
/// assert_eq!(TimestampFormat::Seconds.format(&t, ClockZone::Utc), "2025-01-08 10:30:45");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampFormat {
    /// `2025-01-08 10:30:45`, second resolution
    #[default]
    Seconds,

    /// ISO 8601 with milliseconds and offset: `2025-01-08T10:30:45.123+00:00`
    Iso8601,

    /// RFC 3339 format: `2025-01-08T10:30:45+00:00`
    Rfc3339,

    /// Unix timestamp in milliseconds: `1736332245123`
    UnixMillis,

    /// Custom strftime format
    Custom(String),
}

/// Zone used when rendering timestamps
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockZone {
    #[default]
    Local,
    Utc,
}

impl TimestampFormat {
    /// Format a `DateTime<Utc>` according to this format
    ///
    /// A custom pattern that chrono rejects yields [`INVALID_TIMESTAMP`].
    #[must_use]
    pub fn format(&self, datetime: &DateTime<Utc>, zone: ClockZone) -> String {
        match zone {
            ClockZone::Utc => self.render(datetime),
            ClockZone::Local => self.render(&datetime.with_timezone(&Local)),
        }
    }

    fn render<Tz>(&self, datetime: &DateTime<Tz>) -> String
    where
        Tz: chrono::TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let pattern = match self {
            TimestampFormat::Seconds => "%Y-%m-%d %H:%M:%S",
            TimestampFormat::Iso8601 => "%Y-%m-%dT%H:%M:%S%.3f%:z",
            TimestampFormat::Rfc3339 => return datetime.to_rfc3339(),
            TimestampFormat::UnixMillis => return datetime.timestamp_millis().to_string(),
            TimestampFormat::Custom(pattern) => pattern.as_str(),
        };

        let mut out = String::new();
        match write!(out, "{}", datetime.format(pattern)) {
            Ok(()) => out,
            Err(_) => INVALID_TIMESTAMP.to_string(),
        }
    }

    /// Check that a custom pattern only uses known strftime specifiers
    pub fn is_valid(&self) -> bool {
        match self {
            TimestampFormat::Custom(pattern) => {
                !StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error))
            }
            _ => true,
        }
    }
}
