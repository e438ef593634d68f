//! Error normalization stage

use crate::core::{FieldValue, LogRecord, Processor, Result};
use async_trait::async_trait;

/// Replaces native errors in `data` with their normalized form
///
/// When `data.err` holds an error and the record has no `msg`, the error's
/// message becomes the `msg`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorNormalizer;

impl ErrorNormalizer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Processor for ErrorNormalizer {
    async fn process(&self, mut record: LogRecord) -> Result<LogRecord> {
        let native: Vec<(String, FieldValue)> = record
            .data
            .iter()
            .filter(|(_, value)| matches!(value, FieldValue::Native(_)))
            .filter_map(|(key, value)| {
                value
                    .normalized_error()
                    .map(|e| (key.clone(), FieldValue::Error(e)))
            })
            .collect();

        for (key, normalized) in native {
            record.set_data(key, normalized)?;
        }

        if record.msg.is_none() {
            if let Some(err) = record.err().and_then(FieldValue::normalized_error) {
                record.msg = Some(err.message);
            }
        }

        Ok(record)
    }

    fn name(&self) -> &str {
        "error_normalizer"
    }
}
