//! Materialization of a request context into the fixed field schema
//!
//! Every emitted line carries the same eleven request fields in the same
//! order, whatever the context holds. Missing or mistyped entries fall back
//! to a zero value (`""` for strings, `-1` for `size`) and `start_time` is
//! replaced by the elapsed `duration` in milliseconds.

use super::context::{keys, Context, Key};
use super::field::{Field, FieldValue};
use chrono::{DateTime, Utc};

/// Rendered when the payload size is unknown
pub const UNKNOWN_SIZE: i64 = -1;

/// Field name for the group used by the formatted logging calls
pub const REQUEST_GROUP: &str = "request";

/// One entry of the rendered request schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaField {
    RequestId,
    PlatformId,
    UserFlag,
    Referer,
    UserAgent,
    Method,
    Url,
    SourceIp,
    ServerIp,
    Size,
    Duration,
}

impl SchemaField {
    /// Emission order
    pub const ORDER: [SchemaField; 11] = [
        SchemaField::RequestId,
        SchemaField::PlatformId,
        SchemaField::UserFlag,
        SchemaField::Referer,
        SchemaField::UserAgent,
        SchemaField::Method,
        SchemaField::Url,
        SchemaField::SourceIp,
        SchemaField::ServerIp,
        SchemaField::Size,
        SchemaField::Duration,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SchemaField::Size => keys::SIZE.name(),
            SchemaField::Duration => "duration",
            other => other.string_key().map(|key| key.name()).unwrap_or_default(),
        }
    }

    fn string_key(&self) -> Option<Key<String>> {
        let key = match self {
            SchemaField::RequestId => keys::REQUEST_ID,
            SchemaField::PlatformId => keys::PLATFORM_ID,
            SchemaField::UserFlag => keys::USER_FLAG,
            SchemaField::Referer => keys::REFERER,
            SchemaField::UserAgent => keys::USER_AGENT,
            SchemaField::Method => keys::METHOD,
            SchemaField::Url => keys::URL,
            SchemaField::SourceIp => keys::SOURCE_IP,
            SchemaField::ServerIp => keys::SERVER_IP,
            SchemaField::Size | SchemaField::Duration => return None,
        };
        Some(key)
    }

    fn resolve(&self, context: &Context, now: DateTime<Utc>) -> FieldValue {
        match self {
            SchemaField::Size => FieldValue::Int(context.get(&keys::SIZE).unwrap_or(UNKNOWN_SIZE)),
            SchemaField::Duration => FieldValue::String(
                context
                    .get(&keys::START_TIME)
                    .map(|start| elapsed_millis(start, now).to_string())
                    .unwrap_or_default(),
            ),
            other => FieldValue::String(
                other
                    .string_key()
                    .and_then(|key| context.get(&key))
                    .unwrap_or_default(),
            ),
        }
    }
}

/// Whole milliseconds from `start` to `now`, never negative
pub fn elapsed_millis(start: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    now.signed_duration_since(start).num_milliseconds().max(0)
}

/// The request schema resolved against one context
#[derive(Debug, Clone, PartialEq)]
pub struct MaterializedFields {
    fields: Vec<Field>,
}

impl MaterializedFields {
    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    pub fn as_slice(&self) -> &[Field] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|field| field.key == name)
            .map(|field| &field.value)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_fields(self) -> Vec<Field> {
        self.fields
    }

    /// Collapse the whole schema into one nested field
    pub fn into_group(self, name: impl Into<String>) -> Field {
        Field::new(name, FieldValue::Group(self.fields))
    }
}

impl IntoIterator for MaterializedFields {
    type Item = Field;
    type IntoIter = std::vec::IntoIter<Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

/// Resolve the schema against `context` using the current time
pub fn materialize(context: &Context) -> MaterializedFields {
    materialize_at(context, Utc::now())
}

/// Resolve the schema against `context` as of `now`
pub fn materialize_at(context: &Context, now: DateTime<Utc>) -> MaterializedFields {
    let fields = SchemaField::ORDER
        .iter()
        .map(|schema| Field::new(schema.name(), schema.resolve(context, now)))
        .collect();
    MaterializedFields { fields }
}
