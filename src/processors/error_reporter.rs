//! Dispatch of error records to an external error-reporting backend

use crate::core::{FieldValue, Fields, LogRecord, NormalizedError, Processor, Result, Severity};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Contract of a Sentry-style capture service
#[async_trait]
pub trait ErrorReportingBackend: Send + Sync {
    /// Queue an error for reporting; returns the backend's event id
    fn capture_exception(&self, error: &NormalizedError, context: &Fields) -> String;

    /// Drain the backend's internal queue; `false` if `timeout` elapsed first
    async fn flush(&self, timeout: Duration) -> bool;
}

/// Captures every record at or above `min_level` that carries an error in
/// `data.err`. The record itself passes through unchanged.
pub struct ErrorReportingProcessor {
    backend: Arc<dyn ErrorReportingBackend>,
    min_level: Severity,
    captured: AtomicU64,
}

impl ErrorReportingProcessor {
    pub fn new(backend: Arc<dyn ErrorReportingBackend>) -> Self {
        Self {
            backend,
            min_level: Severity::Error,
            captured: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn with_min_level(mut self, level: Severity) -> Self {
        self.min_level = level;
        self
    }

    /// Number of records handed to the backend
    pub fn captured(&self) -> u64 {
        self.captured.load(Ordering::Relaxed)
    }

    fn context(record: &LogRecord) -> Fields {
        let data: Fields = record
            .data
            .iter()
            .filter(|(key, _)| key.as_str() != "err")
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Fields::new()
            .with_field("level", record.level.label())
            .with_field("msg", record.msg.clone())
            .with_field("ctx", FieldValue::Map((*record.ctx).clone()))
            .with_field("data", data)
    }
}

#[async_trait]
impl Processor for ErrorReportingProcessor {
    async fn process(&self, record: LogRecord) -> Result<LogRecord> {
        if !record.level.meets_threshold(self.min_level) {
            return Ok(record);
        }

        if let Some(error) = record.err().and_then(FieldValue::normalized_error) {
            self.backend.capture_exception(&error, &Self::context(&record));
            self.captured.fetch_add(1, Ordering::Relaxed);
        }
        Ok(record)
    }

    async fn flush(&self, timeout: Duration) -> Result<bool> {
        Ok(tokio::time::timeout(timeout, self.backend.flush(timeout))
            .await
            .unwrap_or(false))
    }

    fn name(&self) -> &str {
        "error_reporter"
    }
}
