//! Property-based tests for request_log using proptest

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use request_log::core::fields::{elapsed_millis, materialize_at, SchemaField, UNKNOWN_SIZE};
use request_log::encoder::{Encoder, EncoderConfig, JsonEncoder, KvEncoder};
use request_log::prelude::*;
use request_log::{ClockZone, LogRecord};

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45).single().unwrap()
}

fn kv() -> KvEncoder {
    KvEncoder::new(EncoderConfig::default().with_clock(ClockZone::Utc))
}

fn level_strategy() -> impl Strategy<Value = LogLevel> {
    prop_oneof![
        Just(LogLevel::Debug),
        Just(LogLevel::Info),
        Just(LogLevel::Warn),
        Just(LogLevel::Error),
    ]
}

/// A context with an arbitrary subset of the string keys attached
fn context_strategy() -> impl Strategy<Value = Context> {
    (
        proptest::option::of(".*"),
        proptest::option::of(".*"),
        proptest::option::of(".*"),
        proptest::option::of(any::<i64>()),
        proptest::option::of(-10_000i64..10_000),
    )
        .prop_map(|(request_id, user_agent, url, size, start_offset)| {
            let mut ctx = Context::new();
            if let Some(v) = request_id {
                ctx = ctx.attach(&keys::REQUEST_ID, v);
            }
            if let Some(v) = user_agent {
                ctx = ctx.attach(&keys::USER_AGENT, v);
            }
            if let Some(v) = url {
                ctx = ctx.attach(&keys::URL, v);
            }
            if let Some(v) = size {
                ctx = ctx.attach(&keys::SIZE, v);
            }
            if let Some(offset) = start_offset {
                ctx = ctx.attach(&keys::START_TIME, base_time() + Duration::milliseconds(offset));
            }
            ctx
        })
}

// ============================================================================
// LogLevel Tests
// ============================================================================

proptest! {
    /// Test that LogLevel string conversions roundtrip correctly
    #[test]
    fn test_log_level_str_roundtrip(level in level_strategy()) {
        let parsed: LogLevel = level.as_str().parse().unwrap();
        prop_assert_eq!(level, parsed);
    }

    /// Test that LogLevel ordering is consistent
    #[test]
    fn test_log_level_ordering(level1 in level_strategy(), level2 in level_strategy()) {
        let val1 = level1 as u8;
        let val2 = level2 as u8;

        prop_assert_eq!(level1 <= level2, val1 <= val2);
        prop_assert_eq!(level1 > level2, val1 > val2);
    }
}

// ============================================================================
// Materializer Tests
// ============================================================================

proptest! {
    /// Every schema field is present, in schema order, for any context
    #[test]
    fn test_materialize_is_total_and_ordered(ctx in context_strategy()) {
        let fields = materialize_at(&ctx, base_time());

        prop_assert_eq!(fields.len(), SchemaField::ORDER.len());
        for (field, schema) in fields.iter().zip(SchemaField::ORDER.iter()) {
            prop_assert_eq!(field.key.as_str(), schema.name());
        }
    }

    /// Unattached strings default to "" and an unattached size to -1
    #[test]
    fn test_materialize_defaults(request_id in ".*") {
        let ctx = Context::new().attach(&keys::REQUEST_ID, request_id.clone());
        let fields = materialize_at(&ctx, base_time());

        prop_assert_eq!(fields.get("request_id").cloned(), Some(FieldValue::String(request_id)));
        prop_assert_eq!(fields.get("referer").cloned(), Some(FieldValue::String(String::new())));
        prop_assert_eq!(fields.get("size").cloned(), Some(FieldValue::Int(UNKNOWN_SIZE)));
        prop_assert_eq!(fields.get("duration").cloned(), Some(FieldValue::String(String::new())));
    }

    /// Materializing the same context at the same instant is deterministic
    #[test]
    fn test_materialize_deterministic(ctx in context_strategy()) {
        prop_assert_eq!(materialize_at(&ctx, base_time()), materialize_at(&ctx, base_time()));
    }

    /// Duration never goes negative and never decreases as time advances
    #[test]
    fn test_duration_monotonic(
        start_offset in -100_000i64..100_000,
        first in 0i64..50_000,
        step in 0i64..50_000,
    ) {
        let start = base_time() + Duration::milliseconds(start_offset);
        let now1 = base_time() + Duration::milliseconds(first);
        let now2 = now1 + Duration::milliseconds(step);

        let d1 = elapsed_millis(start, now1);
        let d2 = elapsed_millis(start, now2);
        prop_assert!(d1 >= 0);
        prop_assert!(d2 >= d1);

        let ctx = Context::new().attach(&keys::START_TIME, start);
        let fields = materialize_at(&ctx, now1);
        prop_assert_eq!(fields.get("duration").cloned(), Some(FieldValue::String(d1.to_string())));
    }
}

// ============================================================================
// Encoder Tests
// ============================================================================

proptest! {
    /// Any message and any field content encodes to exactly one line
    #[test]
    fn test_kv_single_line(
        level in level_strategy(),
        message in ".*",
        key in ".*",
        value in ".*",
        ctx in context_strategy(),
    ) {
        let record = LogRecord::new(level, &message)
            .at(base_time())
            .with_fields(vec![field(key, value)])
            .with_context_fields(materialize_at(&ctx, base_time()).into_fields());

        let line = kv().encode(&record);
        prop_assert!(line.ends_with('\n'));
        prop_assert_eq!(line.matches('\n').count(), 1);
        prop_assert!(line.starts_with("t=\"2025-01-08 10:30:45\" level="));
    }

    /// Bare values never contain separators; anything else is quoted
    #[test]
    fn test_kv_quoting(value in ".*") {
        let record = LogRecord::new(LogLevel::Info, "q")
            .at(base_time())
            .with_fields(vec![field("v", value.clone())]);

        let line = kv().encode(&record);
        let rendered = line
            .trim_end_matches('\n')
            .split_once(" v=")
            .map(|(_, rest)| rest.to_string())
            .unwrap();

        let plain = !value.is_empty()
            && !value
                .chars()
                .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '=' | '"' | '{' | '}'));
        if plain {
            prop_assert_eq!(rendered, value);
        } else {
            prop_assert!(rendered.starts_with('"') && rendered.ends_with('"'));
        }
    }

    /// Non-finite floats render as the placeholder
    #[test]
    fn test_kv_float_rendering(f in any::<f64>()) {
        let record = LogRecord::new(LogLevel::Info, "f")
            .at(base_time())
            .with_fields(vec![field("f", f)]);
        let line = kv().encode(&record);

        if f.is_finite() {
            prop_assert!(!line.contains("<invalid>"));
        } else {
            prop_assert!(line.ends_with(" f=<invalid>\n"));
        }
    }

    /// JSON lines always parse back and keep the message
    #[test]
    fn test_json_parses(message in ".*", ctx in context_strategy()) {
        let encoder = JsonEncoder::new(EncoderConfig::default().with_clock(ClockZone::Utc));
        let record = LogRecord::new(LogLevel::Info, &message)
            .at(base_time())
            .with_context_fields(materialize_at(&ctx, base_time()).into_fields());

        let line = encoder.encode(&record);
        prop_assert_eq!(line.matches('\n').count(), 1);
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        prop_assert_eq!(value["msg"].as_str(), Some(record.message.as_str()));
    }
}

// ============================================================================
// Message Sanitization Tests
// ============================================================================

proptest! {
    /// Records never carry raw line breaks or tabs in their message
    #[test]
    fn test_message_sanitization(message in ".*") {
        let record = LogRecord::new(LogLevel::Info, &message);
        prop_assert!(!record.message.contains('\n'));
        prop_assert!(!record.message.contains('\r'));
        prop_assert!(!record.message.contains('\t'));
    }

    /// Injection attempts through the façade stay on one line
    #[test]
    fn test_log_injection_prevention(
        prefix in "[a-zA-Z0-9 ]{0,20}",
        suffix in "[a-zA-Z0-9 ]{0,20}",
    ) {
        let sink = MemoryAppender::new();
        let logger = Logger::builder().appender(sink.clone()).build().unwrap();

        let malicious = format!("{}\nlevel=error msg=\"FAKE\"\n{}", prefix, suffix);
        logger.info(&malicious, &[]);

        let lines = sink.lines();
        prop_assert_eq!(lines.len(), 1);
        prop_assert_eq!(lines[0].matches('\n').count(), 1);
    }
}
