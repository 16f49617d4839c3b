//! Request logging example
//!
//! Simulates an ingress layer filling a request context and a handler logging
//! through a bound logger, to the console and to a file.
//!
//! Run with: cargo run --example request_logging

use request_log::prelude::*;
use request_log::{global, infof, warnf};
use std::thread;
use std::time::Duration;

fn handle_order(logger: &Logger, order_id: i64) {
    logger.info("validating order", &[field("order_id", order_id)]);
    thread::sleep(Duration::from_millis(15));
    if order_id % 2 == 0 {
        warnf!(logger, "order {} needs manual review", order_id);
    }
    infof!(logger, "order {} accepted", order_id);
}

fn main() -> Result<()> {
    println!("=== request_log - Request Logging Example ===\n");

    // REQUEST_LOG_LEVEL / REQUEST_LOG_ENCODING / REQUEST_LOG_OUTPUT override these
    let config = LoggerConfig {
        name: "shop".to_string(),
        output_paths: vec!["stdout".to_string(), "requests.log".to_string()],
        ..LoggerConfig::default()
    }
    .apply_env()?;

    global::init_from_config(&config)?;
    let logger = global::logger().named("http");

    println!("1. Unbound logger (every request field defaulted):");
    logger.info("listening", &[field("port", 8080)]);

    println!("\n2. Requests with ingress metadata:");
    for order_id in 1..=3 {
        let metadata = RequestMetadata {
            request_id: format!("req-{:04}", order_id),
            platform_id: "PC".to_string(),
            method: "POST".to_string(),
            url: format!("/orders/{}", order_id),
            user_agent: "Mozilla/5.0 (X11; Linux x86_64)".to_string(),
            source_ip: "203.0.113.7".to_string(),
            size: Some(256 * order_id),
            ..RequestMetadata::default()
        };
        let ctx = metadata.attach_to(&Context::new(), chrono::Utc::now());

        let request_logger = logger.bind_context(&ctx).with([field("handler", "orders")]);
        handle_order(&request_logger, order_id);
    }

    global::flush()?;

    println!("\n=== Example completed successfully! ===");
    println!("Check 'requests.log' for the full log output");

    Ok(())
}
