//! Immutable request context carrying the typed metadata fields
//!
//! This module provides:
//! - `Context`: a persistent, layered key/value snapshot
//! - `Key<T>`: typed handles for reading and attaching values
//! - `keys`: the fixed schema of request keys
//! - `RequestMetadata`: attaches every schema key in one call
//!
//! A `Context` is a singly linked list of `Arc` layers. Attaching pushes a new
//! head in O(1) and leaves the receiver untouched, so a snapshot can be shared
//! between threads and bound to any number of loggers without locking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Raw value stored in a context layer
#[derive(Debug, Clone, PartialEq)]
pub enum ContextValue {
    Str(String),
    Int(i64),
    Time(DateTime<Utc>),
}

impl fmt::Display for ContextValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextValue::Str(s) => write!(f, "{}", s),
            ContextValue::Int(i) => write!(f, "{}", i),
            ContextValue::Time(t) => write!(f, "{}", t.to_rfc3339()),
        }
    }
}

/// Types that can live in a context under a typed [`Key`]
pub trait ContextType: Sized {
    fn into_value(self) -> ContextValue;

    /// Returns `None` when the stored value has another type.
    fn from_value(value: &ContextValue) -> Option<Self>;
}

impl ContextType for String {
    fn into_value(self) -> ContextValue {
        ContextValue::Str(self)
    }

    fn from_value(value: &ContextValue) -> Option<Self> {
        match value {
            ContextValue::Str(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl ContextType for i64 {
    fn into_value(self) -> ContextValue {
        ContextValue::Int(self)
    }

    fn from_value(value: &ContextValue) -> Option<Self> {
        match value {
            ContextValue::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl ContextType for DateTime<Utc> {
    fn into_value(self) -> ContextValue {
        ContextValue::Time(self)
    }

    fn from_value(value: &ContextValue) -> Option<Self> {
        match value {
            ContextValue::Time(t) => Some(*t),
            _ => None,
        }
    }
}

/// Typed handle to a context entry
pub struct Key<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Key<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for Key<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Key<T> {}

impl<T> fmt::Debug for Key<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Key").field(&self.name).finish()
    }
}

/// The fixed schema of request keys
pub mod keys {
    use super::Key;
    use chrono::{DateTime, Utc};

    pub const REQUEST_ID: Key<String> = Key::new("request_id");
    pub const PLATFORM_ID: Key<String> = Key::new("platform_id");
    pub const USER_FLAG: Key<String> = Key::new("user_flag");
    pub const REFERER: Key<String> = Key::new("referer");
    pub const USER_AGENT: Key<String> = Key::new("user_agent");
    pub const METHOD: Key<String> = Key::new("method");
    pub const URL: Key<String> = Key::new("url");
    pub const SOURCE_IP: Key<String> = Key::new("source_ip");
    pub const SERVER_IP: Key<String> = Key::new("server_ip");
    pub const SIZE: Key<i64> = Key::new("size");
    /// Request start; only read to derive the elapsed duration
    pub const START_TIME: Key<DateTime<Utc>> = Key::new("start_time");
}

struct Layer {
    key: Cow<'static, str>,
    value: ContextValue,
    parent: Option<Arc<Layer>>,
}

impl Drop for Layer {
    // Unlink iteratively so dropping a long chain cannot overflow the stack.
    fn drop(&mut self) {
        let mut next = self.parent.take();
        while let Some(layer) = next {
            match Arc::try_unwrap(layer) {
                Ok(mut inner) => next = inner.parent.take(),
                Err(_) => break,
            }
        }
    }
}

/// Immutable, layered key/value snapshot
///
/// # Example
///
/// ```
/// use request_log::core::context::{keys, Context};
///
/// let root = Context::new();
/// let ctx = root
///     .attach(&keys::REQUEST_ID, "abc123")
///     .attach(&keys::SIZE, 42);
///
/// assert_eq!(ctx.get(&keys::REQUEST_ID).as_deref(), Some("abc123"));
/// assert_eq!(ctx.get(&keys::SIZE), Some(42));
/// assert!(root.is_empty());
/// ```
#[derive(Clone, Default)]
pub struct Context {
    head: Option<Arc<Layer>>,
}

impl Context {
    /// Create an empty context
    pub const fn new() -> Self {
        Self { head: None }
    }

    /// Layer a typed value over this context
    #[must_use]
    pub fn attach<T, V>(&self, key: &Key<T>, value: V) -> Context
    where
        T: ContextType,
        V: Into<T>,
    {
        self.push(Cow::Borrowed(key.name), value.into().into_value())
    }

    /// Layer a value under an arbitrary name
    ///
    /// Names outside the schema are carried along but never rendered.
    #[must_use]
    pub fn attach_value(&self, name: impl Into<Cow<'static, str>>, value: ContextValue) -> Context {
        self.push(name.into(), value)
    }

    fn push(&self, key: Cow<'static, str>, value: ContextValue) -> Context {
        Context {
            head: Some(Arc::new(Layer {
                key,
                value,
                parent: self.head.clone(),
            })),
        }
    }

    /// Typed read; a value of another type under the same name reads as absent
    pub fn get<T: ContextType>(&self, key: &Key<T>) -> Option<T> {
        self.get_value(key.name).and_then(T::from_value)
    }

    /// Newest value stored under `name`, whatever its type
    pub fn get_value(&self, name: &str) -> Option<&ContextValue> {
        self.layers()
            .find(|layer| layer.key == name)
            .map(|layer| &layer.value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get_value(name).is_some()
    }

    /// Visible keys, newest first; shadowed entries are skipped
    pub fn keys(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for layer in self.layers() {
            let key: &str = &layer.key;
            if !seen.contains(&key) {
                seen.push(key);
            }
        }
        seen
    }

    /// Number of visible keys
    pub fn len(&self) -> usize {
        self.keys().len()
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    fn layers(&self) -> impl Iterator<Item = &Layer> {
        let mut cursor = self.head.as_deref();
        std::iter::from_fn(move || {
            let layer = cursor?;
            cursor = layer.parent.as_deref();
            Some(layer)
        })
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for key in self.keys() {
            if let Some(value) = self.get_value(key) {
                map.entry(&key, value);
            }
        }
        map.finish()
    }
}

/// Request metadata gathered by the ingress layer
///
/// Transport code fills this in from whatever it has (headers, peer address,
/// content length) and attaches it to the request context in one call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMetadata {
    pub request_id: String,
    pub platform_id: String,
    pub user_flag: String,
    pub referer: String,
    pub user_agent: String,
    pub method: String,
    pub url: String,
    pub source_ip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_ip: Option<String>,
    /// Payload size in bytes, when the transport knows it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
}

impl RequestMetadata {
    /// Attach every known field plus the request start time
    #[must_use]
    pub fn attach_to(&self, context: &Context, start_time: DateTime<Utc>) -> Context {
        let mut ctx = context
            .attach(&keys::REQUEST_ID, self.request_id.clone())
            .attach(&keys::USER_FLAG, self.user_flag.clone())
            .attach(&keys::PLATFORM_ID, self.platform_id.clone())
            .attach(&keys::REFERER, self.referer.clone())
            .attach(&keys::USER_AGENT, self.user_agent.clone())
            .attach(&keys::METHOD, self.method.clone())
            .attach(&keys::URL, self.url.clone())
            .attach(&keys::SOURCE_IP, self.source_ip.clone())
            .attach(&keys::START_TIME, start_time);

        if let Some(size) = self.size {
            ctx = ctx.attach(&keys::SIZE, size);
        }
        if let Some(ref server_ip) = self.server_ip {
            ctx = ctx.attach(&keys::SERVER_IP, server_ip.clone());
        }
        ctx
    }
}
