//! File logging example
//!
//! Demonstrates the append-log format written to a locked file, with
//! redaction of sensitive fields.
//!
//! Run with: cargo run --example file_logging

use rust_log_pipeline::prelude::*;
use rust_log_pipeline::transformers::AppendLogTransformer;

#[tokio::main]
async fn main() -> Result<()> {
    println!("=== Rust Log Pipeline - File Logging Example ===\n");

    let logger = Logger::builder()
        .transformer(AppendLogTransformer)
        .destination(FileDestination::open("logs/application.log")?)
        .redact(["password", "*.token"])
        .build()?;

    println!("1. Logging to 'logs/application.log':");
    logger.info("Application started");
    logger.log_with(
        Severity::Info,
        "user login",
        Fields::new()
            .with_field("user", "ada")
            .with_field("password", "hunter2")
            .with_field("session", Fields::new().with_field("token", "tok_123")),
    );

    println!("\n2. Performing some operations:");
    for i in 1..=5 {
        logger.info(format!("Processing item {}/5", i));
        if i == 3 {
            logger.warn("Item 3 took longer than expected");
        }
    }

    logger.info("All operations completed");

    // Flush, then release the file lock
    logger.end().await?;

    println!("\n=== Example completed successfully! ===");
    println!("Check 'logs/application.log' for the full log output");

    Ok(())
}
