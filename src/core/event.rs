//! Observable pipeline events

use super::chain::StageFailure;
use super::error::LoggerError;
use super::record::LogRecord;
use std::sync::Arc;

/// Events published on [`Logger::subscribe`](super::Logger::subscribe)
#[derive(Debug, Clone)]
pub enum LogEvent {
    /// A record was rendered and handed to the sink
    Completed {
        record: Arc<LogRecord>,
        line: Arc<str>,
    },
    /// A processor stage failed; the record moved on without its changes
    StageFailed(Arc<StageFailure>),
    /// The transformer panicked; the unrenderable marker was written instead
    TransformFailed {
        record: Arc<LogRecord>,
        message: String,
    },
    /// The destination failed to write, flush or close
    SinkFailed(Arc<LoggerError>),
}

impl LogEvent {
    pub fn is_failure(&self) -> bool {
        !matches!(self, LogEvent::Completed { .. })
    }
}
