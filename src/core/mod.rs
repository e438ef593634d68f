//! Core pipeline types and traits

pub mod chain;
pub mod config;
pub mod error;
pub mod error_value;
pub mod event;
pub mod fields;
pub mod logger;
pub mod metrics;
pub mod processor;
pub mod record;
pub mod scope;
pub mod severity;
pub mod sink;
pub mod timestamp;
pub mod transformer;

pub use chain::{ChainOutcome, ProcessorChain, StageFailure};
pub use config::{color_enabled, LoggerConfig, Platform};
pub use error::{LoggerError, Result};
pub use error_value::{NormalizedError, RawError};
pub use event::LogEvent;
pub use fields::{FieldValue, Fields, ABSENT_SENTINEL};
pub use logger::{Logger, LoggerBuilder, DEFAULT_EVENT_CAPACITY, DEFAULT_SHUTDOWN_TIMEOUT};
pub use metrics::PipelineMetrics;
pub use processor::{processor_fn, FnProcessor, Processor};
pub use record::LogRecord;
pub use scope::{ContextHandle, ContextPropagator};
pub use severity::Severity;
pub use sink::{Destination, Sink, SinkErrorHandler, SinkState, SinkStatus, DEFAULT_SINK_CAPACITY};
pub use timestamp::TimeInput;
pub use transformer::{Transformer, UNRENDERABLE_MARKER};
