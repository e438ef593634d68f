//! Processor trait for record enrichment and side effects

use super::{error::Result, record::LogRecord};
use async_trait::async_trait;
use std::time::Duration;

/// One stage of the processor chain
///
/// A stage receives the record produced by the previous stage and returns
/// the record for the next one. Returning `Err` (or panicking) discards the
/// stage's changes; the chain carries the incoming record forward.
///
/// # Example
///
/// ```no_run
/// use rust_log_pipeline::core::{LogRecord, Processor, Result};
/// use async_trait::async_trait;
///
/// struct Hostname(String);
///
/// #[async_trait]
/// impl Processor for Hostname {
///     async fn process(&self, mut record: LogRecord) -> Result<LogRecord> {
///         record.set_ctx("host", self.0.as_str())?;
///         Ok(record)
///     }
///
///     fn name(&self) -> &str {
///         "hostname"
///     }
/// }
/// ```
#[async_trait]
pub trait Processor: Send + Sync {
    /// Produce the record handed to the next stage
    async fn process(&self, record: LogRecord) -> Result<LogRecord>;

    /// Drain any backend queue owned by this stage
    ///
    /// Returns `false` when the queue could not be drained within `timeout`.
    async fn flush(&self, _timeout: Duration) -> Result<bool> {
        Ok(true)
    }

    /// Get the stage name
    fn name(&self) -> &str;
}

/// Adapter turning a synchronous closure into a [`Processor`]
pub struct FnProcessor<F> {
    name: String,
    f: F,
}

impl<F> FnProcessor<F>
where
    F: Fn(LogRecord) -> Result<LogRecord> + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

#[async_trait]
impl<F> Processor for FnProcessor<F>
where
    F: Fn(LogRecord) -> Result<LogRecord> + Send + Sync,
{
    async fn process(&self, record: LogRecord) -> Result<LogRecord> {
        (self.f)(record)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Build a [`Processor`] from a closure
pub fn processor_fn<F>(name: impl Into<String>, f: F) -> FnProcessor<F>
where
    F: Fn(LogRecord) -> Result<LogRecord> + Send + Sync,
{
    FnProcessor::new(name, f)
}
