//! Basic logger usage example
//!
//! Demonstrates the terminal format, severity thresholds, structured fields
//! and error payloads.
//!
//! Run with: cargo run --example basic_usage

use rust_log_pipeline::prelude::*;
use rust_log_pipeline::info;

#[derive(Debug, thiserror::Error)]
#[error("connection to {0} refused")]
struct ConnectionRefused(String);

#[tokio::main]
async fn main() -> Result<()> {
    println!("=== Rust Log Pipeline - Basic Usage Example ===\n");

    let logger = Logger::builder()
        .platform(Platform::Terminal)
        .min_level(Severity::Trace)
        .name("basic")
        .build()?;

    println!("1. Logging at different levels:");
    logger.trace("This is a trace message");
    logger.debug("This is a debug message");
    logger.info("This is an info message");
    logger.warn("This is a warning message");
    logger.error("This is an error message");
    logger.fatal("This is a fatal message");
    logger.flush().await?;

    println!("\n2. Structured fields and macros:");
    logger.log_with(
        Severity::Info,
        "request served",
        Fields::new()
            .with_field("status", 200)
            .with_field("path", "/health")
            .with_field("cache", Option::<bool>::None),
    );
    info!(logger, "Processing {} items", 100);
    logger.flush().await?;

    println!("\n3. Error payloads:");
    logger.log_error(Severity::Error, ConnectionRefused("db:5432".to_string()));

    logger.end().await?;

    let metrics = logger.metrics();
    println!(
        "\nEmitted {} records, wrote {}, dropped {}",
        metrics.emitted_count(),
        metrics.written_count(),
        metrics.dropped_count()
    );
    println!("\n=== Example completed successfully! ===");

    Ok(())
}
