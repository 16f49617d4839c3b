//! Key=value line encoder
//!
//! Output shape:
//!
//! ```text
//! t="2025-01-08 10:30:45" level=info logger=api caller=handlers/orders.rs:42 msg="order placed" order=17 request_id=abc123 ... size=42 duration=12
//! ```
//!
//! Values are bare unless they are empty or contain whitespace, `=`, `"`, a
//! brace or a control character, in which case they are quoted with `\`
//! escapes. Braces are reserved for groups (`request={...}`). The message is
//! always quoted.

use super::{Encoder, EncoderConfig, INVALID_VALUE};
use crate::core::{Field, FieldValue, LogRecord};

#[derive(Debug, Clone, Default)]
pub struct KvEncoder {
    config: EncoderConfig,
}

impl KvEncoder {
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    fn push_pair(line: &mut String, key: &str, value: &str) {
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(key);
        line.push('=');
        line.push_str(value);
    }

    fn push_field(line: &mut String, field: &Field) {
        let key = escape_key(&field.key);
        Self::push_pair(line, &key, &render_value(&field.value));
    }
}

impl Encoder for KvEncoder {
    fn encode(&self, record: &LogRecord) -> String {
        let config = &self.config;
        let mut line = String::with_capacity(256);

        let timestamp = config.timestamp_format.format(&record.timestamp, config.clock);
        Self::push_pair(&mut line, &config.time_key, &escape_value(&timestamp));
        Self::push_pair(&mut line, &config.level_key, record.level.as_str());

        if !record.logger_name.is_empty() {
            Self::push_pair(&mut line, &config.name_key, &escape_value(&record.logger_name));
        }
        if let Some(caller) = record.caller {
            Self::push_pair(&mut line, &config.caller_key, &escape_value(&caller.short()));
        }

        Self::push_pair(&mut line, &config.message_key, &quote_value(&record.message));

        for field in record.all_fields() {
            Self::push_field(&mut line, field);
        }

        line.push('\n');
        line
    }

    fn name(&self) -> &str {
        super::KV_ENCODING
    }
}

/// Render one field value
fn render_value(value: &FieldValue) -> String {
    match value {
        FieldValue::String(s) => escape_value(s),
        FieldValue::Int(i) => i.to_string(),
        FieldValue::Float(f) if f.is_finite() => f.to_string(),
        FieldValue::Float(_) => INVALID_VALUE.to_string(),
        FieldValue::Bool(b) => b.to_string(),
        FieldValue::Null => "null".to_string(),
        FieldValue::Group(fields) => {
            let mut inner = String::new();
            for field in fields {
                KvEncoder::push_field(&mut inner, field);
            }
            format!("{{{}}}", inner)
        }
    }
}

/// Keep only characters that cannot break the pair syntax
pub(crate) fn escape_key(key: &str) -> String {
    let cleaned: String = key
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
        .collect();
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}

fn needs_quotes(value: &str) -> bool {
    value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '=' | '"' | '{' | '}'))
}

/// Quote a value only when it would otherwise be ambiguous
fn escape_value(value: &str) -> String {
    if needs_quotes(value) {
        quote_value(value)
    } else {
        value.to_string()
    }
}

fn quote_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{{{:04x}}}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
