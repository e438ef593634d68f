//! Ordered processor chain with per-stage crash isolation

use super::{
    error::{panic_message, LoggerError, Result},
    processor::Processor,
    record::LogRecord,
};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

/// A stage that failed while processing one record
#[derive(Debug)]
pub struct StageFailure {
    /// Position of the stage in the chain
    pub index: usize,
    pub stage: String,
    pub error: LoggerError,
    /// The record as it entered the failing stage
    pub record: LogRecord,
}

/// Result of running every stage over one record
#[derive(Debug)]
pub struct ChainOutcome {
    pub record: LogRecord,
    pub failures: Vec<StageFailure>,
}

/// Ordered list of processors
///
/// Stages run strictly one after another in registration order; stage `n+1`
/// receives exactly the record stage `n` produced. If a stage returns an
/// error or panics, its output is discarded, the record it received moves on
/// to the next stage, and the failure is reported in [`ChainOutcome`].
#[derive(Clone, Default)]
pub struct ProcessorChain {
    stages: Vec<Arc<dyn Processor>>,
}

impl ProcessorChain {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Append a stage (builder form)
    #[must_use]
    pub fn with<P: Processor + 'static>(mut self, stage: P) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    pub fn push(&mut self, stage: Arc<dyn Processor>) {
        self.stages.push(stage);
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub async fn run(&self, record: LogRecord) -> ChainOutcome {
        let mut current = record;
        let mut failures = Vec::new();

        for (index, stage) in self.stages.iter().enumerate() {
            let attempt = AssertUnwindSafe(stage.process(current.clone()))
                .catch_unwind()
                .await;

            let error = match attempt {
                Ok(Ok(next)) => {
                    current = next;
                    continue;
                }
                Ok(Err(e)) => e,
                Err(panic_info) => {
                    LoggerError::stage_panicked(stage.name(), panic_message(panic_info.as_ref()))
                }
            };

            failures.push(StageFailure {
                index,
                stage: stage.name().to_string(),
                error,
                record: current.clone(),
            });
        }

        ChainOutcome {
            record: current,
            failures,
        }
    }

    /// Flush every stage; `Ok(false)` if any stage missed its deadline
    pub async fn flush(&self, timeout: Duration) -> Result<bool> {
        let mut drained = true;
        for stage in &self.stages {
            let result = AssertUnwindSafe(stage.flush(timeout)).catch_unwind().await;
            match result {
                Ok(Ok(ok)) => drained &= ok,
                Ok(Err(e)) => return Err(e),
                Err(panic_info) => {
                    return Err(LoggerError::stage_panicked(
                        stage.name(),
                        panic_message(panic_info.as_ref()),
                    ))
                }
            }
        }
        Ok(drained)
    }
}

impl std::fmt::Debug for ProcessorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessorChain")
            .field("stages", &self.stage_names())
            .finish()
    }
}
