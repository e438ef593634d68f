//! # Rust Log Pipeline
//!
//! A structured-logging pipeline: records flow from the call-site through an
//! ordered, crash-isolated processor chain, a platform wire-format
//! transformer and a backpressure-aware sink.
//!
//! ## Features
//!
//! - **Ambient context**: scopes follow async control flow and stamp a
//!   `contextId` on every record emitted inside them
//! - **Crash isolation**: a failing or panicking stage never loses the record
//! - **Platform formats**: generic JSON, cloud-function JSON, append-log TSV
//!   and a colored terminal format
//! - **Ordered delivery**: one line per record, in emission order, with
//!   flush and idempotent shutdown
//!
//! ```no_run
//! use rust_log_pipeline::prelude::*;
//!
//! # async fn example() -> Result<()> {
//! let logger = Logger::builder().name("checkout").build()?;
//!
//! let scope = logger.new_scope();
//! logger
//!     .run(scope, async {
//!         logger.info("cart loaded");
//!     })
//!     .await;
//!
//! logger.end().await
//! # }
//! ```

pub mod core;
pub mod destinations;
pub mod macros;
pub mod processors;
pub mod transformers;

pub mod prelude {
    pub use crate::core::{
        ContextHandle, FieldValue, Fields, LogEvent, LogRecord, Logger, LoggerBuilder,
        LoggerConfig, LoggerError, PipelineMetrics, Platform, Processor, RawError, Result,
        Severity, SinkState, Transformer, DEFAULT_SHUTDOWN_TIMEOUT,
    };
    pub use crate::destinations::{MemoryDestination, WriterDestination};
    #[cfg(feature = "file")]
    pub use crate::destinations::FileDestination;
}

pub use self::core::{
    processor_fn, ContextHandle, ContextPropagator, FieldValue, Fields, LogEvent, LogRecord,
    Logger, LoggerBuilder, LoggerConfig, LoggerError, NormalizedError, PipelineMetrics, Platform,
    Processor, ProcessorChain, RawError, Result, Severity, Sink, SinkState, Transformer,
    DEFAULT_SHUTDOWN_TIMEOUT,
};
