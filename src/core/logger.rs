//! Logger façade
//!
//! A [`Logger`] is a cheap handle over a shared, immutable core (level,
//! encoder, sinks). Binding a context, seeding fields or naming a child all
//! return a new handle; the receiver never changes.
//!
//! Every emission runs the same pipeline on the calling thread:
//! level check → materialize the bound context → build the record → encode →
//! write to each sink. Nothing in that pipeline reports an error to the
//! caller; sink failures go to the error output.

use super::{
    appender::Appender,
    context::Context,
    error::{LoggerError, Result},
    field::Field,
    fields::{materialize_at, REQUEST_GROUP},
    log_level::LogLevel,
    log_record::{Caller, LogRecord},
    metrics::LoggerMetrics,
};
use crate::appenders::ConsoleAppender;
use crate::encoder::{self, Encoder, EncoderConfig, EncoderRegistry, KvEncoder, KV_ENCODING};
use chrono::Utc;
use parking_lot::Mutex;
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe, Location};
use std::sync::Arc;

/// How the request fields are attached to a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContextLayout {
    /// One field per schema entry
    Flat,
    /// A single trailing `request={...}` group
    Grouped,
}

struct LoggerCore {
    min_level: LogLevel,
    encoder: Box<dyn Encoder>,
    appenders: Vec<Mutex<Box<dyn Appender>>>,
    error_output: Vec<Mutex<Box<dyn Appender>>>,
    metrics: LoggerMetrics,
}

impl LoggerCore {
    fn dispatch(&self, record: &LogRecord) {
        let line = match catch_unwind(AssertUnwindSafe(|| self.encoder.encode(record))) {
            Ok(line) => line,
            Err(panic) => {
                self.metrics.record_encode_fallback();
                self.report(&format!(
                    "encoder '{}' panicked: {}",
                    self.encoder.name(),
                    panic_message(panic.as_ref())
                ));
                encoder::fallback_line(record)
            }
        };

        let mut has_error = false;

        // Per-appender panic isolation: one broken sink must not starve the others
        for appender in &self.appenders {
            let mut appender = appender.lock();
            let result = catch_unwind(AssertUnwindSafe(|| appender.append(&line, record.level)));

            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    has_error = true;
                    self.metrics.record_sink_error();
                    self.report(&format!("sink '{}' failed: {}", appender.name(), e));
                }
                Err(panic) => {
                    has_error = true;
                    self.metrics.record_sink_error();
                    self.report(&format!(
                        "sink '{}' panicked: {}",
                        appender.name(),
                        panic_message(panic.as_ref())
                    ));
                }
            }
        }

        if has_error {
            self.metrics.record_failed();
        } else {
            self.metrics.record_logged();
        }
    }

    /// Write a diagnostic to the error output
    fn report(&self, message: &str) {
        let line = format!("[request_log] {}\n", message);
        let mut delivered = false;

        for output in &self.error_output {
            let mut output = output.lock();
            let written = catch_unwind(AssertUnwindSafe(|| {
                output.append(&line, LogLevel::Error).and_then(|_| output.flush())
            }));
            if matches!(written, Ok(Ok(()))) {
                delivered = true;
            }
        }

        // Last resort when the error output itself is broken
        if !delivered {
            eprint!("{}", line);
        }
    }

    fn flush(&self) -> Result<()> {
        let mut first_error = None;
        for appender in &self.appenders {
            let mut appender = appender.lock();
            if let Err(e) = appender.flush() {
                self.metrics.record_sink_error();
                self.report(&format!("sink '{}' flush failed: {}", appender.name(), e));
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Drop for LoggerCore {
    fn drop(&mut self) {
        // Final flush of buffered sinks; failures are already reported
        let _ = self.flush();
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Leveled, context-aware logger handle
///
/// # Example
///
/// ```
/// use request_log::prelude::*;
///
/// let sink = MemoryAppender::new();
/// let logger = Logger::builder()
///     .min_level(LogLevel::Debug)
///     .appender(sink.clone())
///     .build()
///     .unwrap();
///
/// let ctx = Context::new()
///     .attach(&keys::REQUEST_ID, "abc123")
///     .attach(&keys::METHOD, "GET");
///
/// logger.bind_context(&ctx).info("handled", &[field("status", 200)]);
///
/// let line = &sink.lines()[0];
/// assert!(line.contains("status=200 request_id=abc123"));
/// assert!(line.contains("method=GET"));
/// ```
#[derive(Clone)]
pub struct Logger {
    core: Arc<LoggerCore>,
    name: Arc<str>,
    context: Context,
    fields: Arc<[Field]>,
}

impl Logger {
    /// Info-level logger writing key=value lines to stdout
    #[must_use]
    pub fn new() -> Self {
        Self::from_parts(
            LogLevel::Info,
            "",
            Box::new(KvEncoder::new(EncoderConfig::default())),
            vec![Box::new(ConsoleAppender::new())],
            vec![Box::new(ConsoleAppender::stderr())],
        )
    }

    fn from_parts(
        min_level: LogLevel,
        name: &str,
        encoder: Box<dyn Encoder>,
        appenders: Vec<Box<dyn Appender>>,
        error_output: Vec<Box<dyn Appender>>,
    ) -> Self {
        let core = LoggerCore {
            min_level,
            encoder,
            appenders: appenders.into_iter().map(Mutex::new).collect(),
            error_output: error_output.into_iter().map(Mutex::new).collect(),
            metrics: LoggerMetrics::new(),
        };
        Self {
            core: Arc::new(core),
            name: Arc::from(name),
            context: Context::new(),
            fields: Arc::from(Vec::new()),
        }
    }

    /// Create a builder for Logger
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    /// Handle that reads request fields from `context`
    ///
    /// Seeded fields and the name carry over; the receiver keeps its own
    /// binding.
    #[must_use]
    pub fn bind_context(&self, context: &Context) -> Logger {
        Logger {
            context: context.clone(),
            ..self.clone()
        }
    }

    /// The bound context (empty when unbound)
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Handle that prepends `fields` to every line it emits
    #[must_use]
    pub fn with<I>(&self, fields: I) -> Logger
    where
        I: IntoIterator<Item = Field>,
    {
        let mut seeded = self.fields.to_vec();
        seeded.extend(fields);
        Logger {
            fields: Arc::from(seeded),
            ..self.clone()
        }
    }

    /// Child handle; names nest as `parent.child`
    #[must_use]
    pub fn named(&self, name: &str) -> Logger {
        let full = if self.name.is_empty() {
            name.to_string()
        } else if name.is_empty() {
            self.name.to_string()
        } else {
            format!("{}.{}", self.name, name)
        };
        Logger {
            name: Arc::from(full),
            ..self.clone()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn min_level(&self) -> LogLevel {
        self.core.min_level
    }

    #[inline]
    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.core.min_level
    }

    /// Structured emission at `level`
    #[track_caller]
    pub fn log(&self, level: LogLevel, message: impl AsRef<str>, fields: &[Field]) {
        if !self.enabled(level) {
            return;
        }
        self.emit(level, message.as_ref(), fields, ContextLayout::Flat, Location::caller());
    }

    /// Formatted emission at `level`; request fields go into one trailing group
    #[track_caller]
    pub fn logf(&self, level: LogLevel, args: fmt::Arguments<'_>) {
        if !self.enabled(level) {
            return;
        }
        let message = fmt::format(args);
        self.emit(level, &message, &[], ContextLayout::Grouped, Location::caller());
    }

    fn emit(
        &self,
        level: LogLevel,
        message: &str,
        fields: &[Field],
        layout: ContextLayout,
        location: &'static Location<'static>,
    ) {
        let now = Utc::now();
        let materialized = materialize_at(&self.context, now);
        let context_fields = match layout {
            ContextLayout::Flat => materialized.into_fields(),
            ContextLayout::Grouped => vec![materialized.into_group(REQUEST_GROUP)],
        };

        let mut caller_fields = Vec::with_capacity(self.fields.len() + fields.len());
        caller_fields.extend_from_slice(&self.fields);
        caller_fields.extend_from_slice(fields);

        let record = LogRecord::new(level, message)
            .at(now)
            .with_name(&*self.name)
            .with_caller(Caller::from_location(location))
            .with_fields(caller_fields)
            .with_context_fields(context_fields);

        self.core.dispatch(&record);
    }

    #[track_caller]
    #[inline]
    pub fn debug(&self, message: impl AsRef<str>, fields: &[Field]) {
        self.log(LogLevel::Debug, message, fields);
    }

    #[track_caller]
    #[inline]
    pub fn info(&self, message: impl AsRef<str>, fields: &[Field]) {
        self.log(LogLevel::Info, message, fields);
    }

    #[track_caller]
    #[inline]
    pub fn warn(&self, message: impl AsRef<str>, fields: &[Field]) {
        self.log(LogLevel::Warn, message, fields);
    }

    #[track_caller]
    #[inline]
    pub fn error(&self, message: impl AsRef<str>, fields: &[Field]) {
        self.log(LogLevel::Error, message, fields);
    }

    #[track_caller]
    #[inline]
    pub fn debugf(&self, args: fmt::Arguments<'_>) {
        self.logf(LogLevel::Debug, args);
    }

    #[track_caller]
    #[inline]
    pub fn infof(&self, args: fmt::Arguments<'_>) {
        self.logf(LogLevel::Info, args);
    }

    #[track_caller]
    #[inline]
    pub fn warnf(&self, args: fmt::Arguments<'_>) {
        self.logf(LogLevel::Warn, args);
    }

    #[track_caller]
    #[inline]
    pub fn errorf(&self, args: fmt::Arguments<'_>) {
        self.logf(LogLevel::Error, args);
    }

    /// Flush every sink; call before process exit
    pub fn flush(&self) -> Result<()> {
        self.core.flush()
    }

    /// Counters shared by every handle of this logger
    pub fn metrics(&self) -> &LoggerMetrics {
        &self.core.metrics
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("min_level", &self.core.min_level)
            .field("encoder", &self.core.encoder.name())
            .field("context", &self.context)
            .field("fields", &self.fields.len())
            .finish()
    }
}

/// Builder for constructing Logger with a fluent API
///
/// # Example
/// ```
/// use request_log::prelude::*;
///
/// let logger = Logger::builder()
///     .min_level(LogLevel::Debug)
///     .name("api")
///     .encoding("json")
///     .appender(ConsoleAppender::new())
///     .build()
///     .unwrap();
/// assert_eq!(logger.name(), "api");
/// ```
pub struct LoggerBuilder {
    min_level: LogLevel,
    name: String,
    encoding: String,
    encoder_config: EncoderConfig,
    registry: Option<EncoderRegistry>,
    encoder: Option<Box<dyn Encoder>>,
    appenders: Vec<Box<dyn Appender>>,
    error_output: Vec<Box<dyn Appender>>,
}

impl LoggerBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            min_level: LogLevel::Info,
            name: String::new(),
            encoding: KV_ENCODING.to_string(),
            encoder_config: EncoderConfig::default(),
            registry: None,
            encoder: None,
            appenders: Vec::new(),
            error_output: Vec::new(),
        }
    }

    /// Set minimum log level
    #[must_use = "builder methods return a new value"]
    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Select the encoder by registered name
    #[must_use = "builder methods return a new value"]
    pub fn encoding(mut self, name: impl Into<String>) -> Self {
        self.encoding = name.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn encoder_config(mut self, config: EncoderConfig) -> Self {
        self.encoder_config = config;
        self
    }

    /// Registry used to resolve [`encoding`](Self::encoding)
    #[must_use = "builder methods return a new value"]
    pub fn registry(mut self, registry: EncoderRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Use this encoder instead of a registry lookup
    #[must_use = "builder methods return a new value"]
    pub fn encoder<E: Encoder + 'static>(mut self, encoder: E) -> Self {
        self.encoder = Some(Box::new(encoder));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn encoder_boxed(mut self, encoder: Box<dyn Encoder>) -> Self {
        self.encoder = Some(encoder);
        self
    }

    /// Add an appender
    #[must_use = "builder methods return a new value"]
    pub fn appender<A: Appender + 'static>(mut self, appender: A) -> Self {
        self.appenders.push(Box::new(appender));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn boxed_appender(mut self, appender: Box<dyn Appender>) -> Self {
        self.appenders.push(appender);
        self
    }

    /// Add a destination for the logger's own diagnostics (default: stderr)
    #[must_use = "builder methods return a new value"]
    pub fn error_appender<A: Appender + 'static>(mut self, appender: A) -> Self {
        self.error_output.push(Box::new(appender));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn boxed_error_appender(mut self, appender: Box<dyn Appender>) -> Self {
        self.error_output.push(appender);
        self
    }

    /// Build the Logger
    ///
    /// Fails when no appender was added, the encoder name is unknown or its
    /// configuration is invalid.
    pub fn build(self) -> Result<Logger> {
        let encoder = match self.encoder {
            Some(encoder) => encoder,
            None => {
                let registry = self.registry.unwrap_or_else(EncoderRegistry::with_defaults);
                registry.build(&self.encoding, &self.encoder_config)?
            }
        };

        if self.appenders.is_empty() {
            return Err(LoggerError::config("LoggerBuilder", "no appenders"));
        }

        let error_output = if self.error_output.is_empty() {
            vec![Box::new(ConsoleAppender::stderr()) as Box<dyn Appender>]
        } else {
            self.error_output
        };

        Ok(Logger::from_parts(
            self.min_level,
            &self.name,
            encoder,
            self.appenders,
            error_output,
        ))
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appenders::MemoryAppender;
    use crate::core::context::keys;
    use crate::core::field::field;
    use crate::core::ClockZone;

    fn memory_logger(level: LogLevel) -> (Logger, MemoryAppender) {
        let sink = MemoryAppender::new();
        let logger = Logger::builder()
            .min_level(level)
            .encoder_config(EncoderConfig::default().with_clock(ClockZone::Utc))
            .appender(sink.clone())
            .build()
            .unwrap();
        (logger, sink)
    }

    struct FailingAppender;

    impl Appender for FailingAppender {
        fn append(&mut self, _line: &str, _level: LogLevel) -> Result<()> {
            Err(LoggerError::writer("disk full"))
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    struct PanickingAppender;

    impl Appender for PanickingAppender {
        fn append(&mut self, _line: &str, _level: LogLevel) -> Result<()> {
            panic!("appender exploded");
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "panicking"
        }
    }

    struct PanickingEncoder;

    impl Encoder for PanickingEncoder {
        fn encode(&self, _record: &LogRecord) -> String {
            panic!("encoder exploded");
        }

        fn name(&self) -> &str {
            "panicking"
        }
    }

    #[test]
    fn test_unbound_logger_emits_defaults() {
        let (logger, sink) = memory_logger(LogLevel::Info);
        logger.info("started", &[]);

        let lines = sink.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains(" level=info "));
        assert!(lines[0].contains("msg=\"started\" request_id=\"\""));
        assert!(lines[0].contains(" size=-1 duration=\"\"\n"));
    }

    #[test]
    fn test_level_filtering() {
        let (logger, sink) = memory_logger(LogLevel::Warn);
        logger.debug("d", &[]);
        logger.info("i", &[]);
        logger.warn("w", &[]);
        logger.error("e", &[]);

        let lines = sink.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("level=warn"));
        assert!(lines[1].contains("level=error"));
    }

    #[test]
    fn test_bind_does_not_mutate_receiver() {
        let (logger, sink) = memory_logger(LogLevel::Info);
        let ctx = Context::new().attach(&keys::REQUEST_ID, "r-1");

        let bound = logger.bind_context(&ctx);
        logger.info("unbound", &[]);
        bound.info("bound", &[]);

        let lines = sink.lines();
        assert!(lines[0].contains("request_id=\"\""));
        assert!(lines[1].contains("request_id=r-1"));
        assert!(logger.context().is_empty());
    }

    #[test]
    fn test_rebind_replaces_context() {
        let (logger, sink) = memory_logger(LogLevel::Info);
        let first = Context::new().attach(&keys::REQUEST_ID, "one");
        let second = Context::new().attach(&keys::PLATFORM_ID, "PC");

        logger.bind_context(&first).bind_context(&second).info("m", &[]);

        let line = &sink.lines()[0];
        assert!(line.contains("request_id=\"\""));
        assert!(line.contains("platform_id=PC"));
    }

    #[test]
    fn test_with_seeds_fields_before_call_fields() {
        let (logger, sink) = memory_logger(LogLevel::Info);
        let ctx = Context::new().attach(&keys::METHOD, "POST");

        let scoped = logger
            .bind_context(&ctx)
            .with([field("component", "orders")])
            .with([field("attempt", 2)]);
        scoped.info("saved", &[field("order_id", 17)]);

        let line = &sink.lines()[0];
        assert!(line.contains(
            "msg=\"saved\" component=orders attempt=2 order_id=17 request_id=\"\""
        ));
        assert!(line.contains("method=POST"));
    }

    #[test]
    fn test_formatted_variant_groups_request_fields() {
        let (logger, sink) = memory_logger(LogLevel::Info);
        let ctx = Context::new().attach(&keys::REQUEST_ID, "abc");

        logger
            .bind_context(&ctx)
            .infof(format_args!("served {} bytes in {}ms", 512, 3));

        let line = &sink.lines()[0];
        assert!(line.contains("msg=\"served 512 bytes in 3ms\""));
        assert!(line.contains(" request={request_id=abc platform_id=\"\""));
        assert!(line.ends_with("size=-1 duration=\"\"}\n"));
    }

    #[test]
    fn test_formatted_variant_respects_level() {
        let (logger, sink) = memory_logger(LogLevel::Error);
        logger.warnf(format_args!("ignored {}", 1));
        logger.errorf(format_args!("kept {}", 2));

        assert_eq!(sink.len(), 1);
        assert!(sink.lines()[0].contains("level=error"));
    }

    #[test]
    fn test_caller_points_at_call_site() {
        let (logger, sink) = memory_logger(LogLevel::Info);
        let line_no = line!() + 1;
        logger.info("here", &[]);

        let expected = format!("caller=core/logger.rs:{}", line_no);
        assert!(sink.lines()[0].contains(&expected), "{}", sink.lines()[0]);
    }

    #[test]
    fn test_named_children() {
        let (logger, sink) = memory_logger(LogLevel::Info);
        logger.named("http").named("orders").info("x", &[]);
        logger.info("y", &[]);

        let lines = sink.lines();
        assert!(lines[0].contains(" logger=http.orders "));
        assert!(!lines[1].contains("logger="));
    }

    #[test]
    fn test_sink_failure_is_isolated() {
        let sink = MemoryAppender::new();
        let errors = MemoryAppender::new();
        let logger = Logger::builder()
            .appender(FailingAppender)
            .appender(PanickingAppender)
            .appender(sink.clone())
            .error_appender(errors.clone())
            .build()
            .unwrap();

        logger.info("still delivered", &[]);

        assert_eq!(sink.len(), 1);
        let diagnostics = errors.contents();
        assert!(diagnostics.contains("sink 'failing' failed: Writer error: disk full"));
        assert!(diagnostics.contains("sink 'panicking' panicked: appender exploded"));
        assert_eq!(logger.metrics().failed_count(), 1);
        assert_eq!(logger.metrics().sink_errors(), 2);
    }

    #[test]
    fn test_encoder_panic_degrades_line() {
        let sink = MemoryAppender::new();
        let errors = MemoryAppender::new();
        let logger = Logger::builder()
            .encoder(PanickingEncoder)
            .appender(sink.clone())
            .error_appender(errors.clone())
            .build()
            .unwrap();

        logger.error("must survive", &[]);

        assert_eq!(sink.lines(), vec!["level=error msg=\"must survive\" encode_error=true\n"]);
        assert!(errors.contents().contains("encoder 'panicking' panicked"));
        assert_eq!(logger.metrics().encode_fallbacks(), 1);
    }

    #[test]
    fn test_unknown_encoding_fails_build() {
        let err = Logger::builder()
            .encoding("kvpare")
            .appender(MemoryAppender::new())
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, LoggerError::UnknownEncoder { .. }));
    }

    #[test]
    fn test_build_without_appenders_fails() {
        let err = Logger::builder().build().err().unwrap();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
        assert_eq!(
            err.to_string(),
            "Invalid configuration for LoggerBuilder: no appenders"
        );

        let err = Logger::builder()
            .error_appender(MemoryAppender::new())
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_handles_share_metrics() {
        let (logger, _sink) = memory_logger(LogLevel::Info);
        let child = logger.with([field("k", 1)]);
        child.info("a", &[]);
        logger.info("b", &[]);
        assert_eq!(logger.metrics().total_logged(), 2);
    }
}
