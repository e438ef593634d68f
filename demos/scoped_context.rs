//! Scoped context example
//!
//! Demonstrates ambient scopes: every record emitted inside `run` carries the
//! scope's `contextId`, including records from tasks spawned with `bind`.
//!
//! Run with: cargo run --example scoped_context

use rust_log_pipeline::prelude::*;
use std::sync::Arc;
use std::time::Duration;

async fn handle_request(logger: Arc<Logger>, path: &'static str, delay_ms: u64) {
    logger.info(format!("start {}", path));
    tokio::time::sleep(Duration::from_millis(delay_ms)).await;

    let propagator = logger.propagator().clone();
    let background = {
        let logger = Arc::clone(&logger);
        propagator.bind(async move {
            logger.debug("audit trail written");
            logger.info("background job finished");
        })
    };
    let _ = tokio::spawn(background).await;

    logger.info(format!("done {}", path));
}

#[tokio::main]
async fn main() -> Result<()> {
    println!("=== Rust Log Pipeline - Scoped Context Example ===\n");

    let logger = Arc::new(
        Logger::builder()
            .platform(Platform::Json)
            .name("scopes")
            .build()?,
    );
    let mut events = logger.subscribe();

    let first = logger
        .new_scope()
        .with_context(Fields::new().with_field("requestPath", "/orders"));
    let second = logger
        .new_scope()
        .with_context(Fields::new().with_field("requestPath", "/users"));

    tokio::join!(
        logger.run(first, handle_request(Arc::clone(&logger), "/orders", 20)),
        logger.run(second, handle_request(Arc::clone(&logger), "/users", 5)),
    );

    logger.end().await?;

    let mut completed = 0;
    while let Ok(event) = events.try_recv() {
        if let LogEvent::Completed { .. } = event {
            completed += 1;
        }
    }
    println!("\n{} records completed", completed);
    println!("\n=== Example completed successfully! ===");

    Ok(())
}
