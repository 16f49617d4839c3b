//! JSON-lines encoder
//!
//! Same keys as the key=value encoder, one object per line, in the same order:
//! header, caller fields, request fields. Groups become nested objects; values
//! without a JSON form become the placeholder string. A caller field named like
//! a header or request key is written as `fields.<key>` instead of replacing it.

use super::{Encoder, EncoderConfig, INVALID_VALUE};
use crate::core::{Field, FieldValue, LogRecord};
use serde_json::{Map, Value};

/// Prefix for caller fields whose key is already used by the line
pub const CALLER_KEY_PREFIX: &str = "fields.";

#[derive(Debug, Clone, Default)]
pub struct JsonEncoder {
    config: EncoderConfig,
}

impl JsonEncoder {
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    /// Build the JSON object for a record without serializing it
    pub fn to_value(&self, record: &LogRecord) -> Value {
        let config = &self.config;
        let mut object = Map::new();

        object.insert(
            config.time_key.clone(),
            Value::String(config.timestamp_format.format(&record.timestamp, config.clock)),
        );
        object.insert(
            config.level_key.clone(),
            Value::String(record.level.as_str().to_string()),
        );
        if !record.logger_name.is_empty() {
            object.insert(config.name_key.clone(), Value::String(record.logger_name.clone()));
        }
        if let Some(caller) = record.caller {
            object.insert(config.caller_key.clone(), Value::String(caller.short()));
        }
        object.insert(config.message_key.clone(), Value::String(record.message.clone()));

        // Caller keys that would shadow a header or request key move under `fields.`
        for field in &record.fields {
            let taken = object.contains_key(&field.key)
                || record.context_fields.iter().any(|c| c.key == field.key);
            let key = if taken {
                format!("{}{}", CALLER_KEY_PREFIX, field.key)
            } else {
                field.key.clone()
            };
            object.insert(key, json_value(&field.value));
        }
        insert_fields(&mut object, record.context_fields.iter());
        Value::Object(object)
    }
}

fn insert_fields<'a>(object: &mut Map<String, Value>, fields: impl Iterator<Item = &'a Field>) {
    for field in fields {
        object.insert(field.key.clone(), json_value(&field.value));
    }
}

fn json_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::Group(fields) => {
            let mut nested = Map::new();
            insert_fields(&mut nested, fields.iter());
            Value::Object(nested)
        }
        other => other
            .to_json_value()
            .unwrap_or_else(|| Value::String(INVALID_VALUE.to_string())),
    }
}

impl Encoder for JsonEncoder {
    fn encode(&self, record: &LogRecord) -> String {
        let mut line = serde_json::to_string(&self.to_value(record))
            .unwrap_or_else(|_| super::fallback_line(record).trim_end().to_string());
        line.push('\n');
        line
    }

    fn name(&self) -> &str {
        super::JSON_ENCODING
    }
}
