//! Logger façade and pipeline worker
//!
//! Emit calls are synchronous and never fail: each accepted record is
//! stamped with the call-site scope and location, then queued to a worker
//! task that runs it through processor chain, transformer and sink strictly
//! in emission order.

use super::{
    chain::{ProcessorChain, StageFailure},
    config::{color_enabled, process_env, LoggerConfig, Platform},
    error::{panic_message, LoggerError, Result},
    event::LogEvent,
    fields::{FieldValue, Fields},
    metrics::PipelineMetrics,
    processor::Processor,
    record::LogRecord,
    scope::{ContextHandle, ContextPropagator},
    severity::Severity,
    sink::{Destination, Sink, SinkErrorHandler, SinkState, DEFAULT_SINK_CAPACITY},
    transformer::{Transformer, UNRENDERABLE_MARKER},
};
use crate::destinations::WriterDestination;
use crate::processors::{CallerAnnotator, ContextInjector, ErrorNormalizer, Redactor};
use std::future::Future;
use std::panic::{AssertUnwindSafe, Location};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};

/// Default deadline for processor backends to drain on `flush`/`end`
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Default number of buffered events per subscriber
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// `ctx` key stamped with the logger name
pub const NAME_KEY: &str = "name";

enum Command {
    Emit(LogRecord),
    Flush(oneshot::Sender<()>),
}

/// State owned by the worker task
struct Pipeline {
    chain: ProcessorChain,
    transformer: Arc<dyn Transformer>,
    sink: Arc<Sink>,
    events: broadcast::Sender<LogEvent>,
    metrics: Arc<PipelineMetrics>,
}

impl Pipeline {
    async fn run(self, mut commands: mpsc::UnboundedReceiver<Command>) {
        while let Some(command) = commands.recv().await {
            match command {
                Command::Emit(record) => self.process(record).await,
                Command::Flush(ack) => {
                    self.sink.flushed().await;
                    let _ = ack.send(());
                }
            }
        }
    }

    async fn process(&self, record: LogRecord) {
        let outcome = self.chain.run(record).await;
        for failure in outcome.failures {
            self.metrics.record_stage_failure();
            publish(&self.events, LogEvent::StageFailed(Arc::new(failure)));
        }
        let record = outcome.record;

        let line = match std::panic::catch_unwind(AssertUnwindSafe(|| {
            self.transformer.transform(&record)
        })) {
            Ok(line) if !line.is_empty() => line,
            Ok(_) => UNRENDERABLE_MARKER.to_string(),
            Err(panic_info) => {
                publish(
                    &self.events,
                    LogEvent::TransformFailed {
                        record: Arc::new(record.clone()),
                        message: panic_message(panic_info.as_ref()),
                    },
                );
                UNRENDERABLE_MARKER.to_string()
            }
        };

        let line: Arc<str> = Arc::from(line);
        match self.sink.write(line.as_ref()) {
            Ok(true) => {}
            Ok(false) => {
                self.metrics.record_backpressure_wait();
                self.sink.drained().await;
            }
            Err(e) => {
                self.metrics.record_dropped();
                publish(&self.events, LogEvent::SinkFailed(Arc::new(e)));
                return;
            }
        }
        self.metrics.record_written();

        if self.events.receiver_count() > 0 {
            let _ = self.events.send(LogEvent::Completed {
                record: Arc::new(record),
                line,
            });
        }
    }
}

/// Deliver a failure event, or print it when nobody is listening
fn publish(events: &broadcast::Sender<LogEvent>, event: LogEvent) {
    if events.receiver_count() > 0 {
        let _ = events.send(event);
        return;
    }

    match &event {
        LogEvent::StageFailed(failure) => report_stage_failure(failure),
        LogEvent::TransformFailed { message, .. } => {
            eprintln!("[LOGGER ERROR] Transformer panicked: {}", message);
        }
        LogEvent::SinkFailed(error) => eprintln!("[LOGGER ERROR] Sink failed: {}", error),
        LogEvent::Completed { .. } => {}
    }
}

fn report_stage_failure(failure: &StageFailure) {
    eprintln!(
        "[LOGGER ERROR] Processor #{} '{}' failed: {}",
        failure.index, failure.stage, failure.error
    );
}

/// Entry point for application code
///
/// # Example
///
/// ```no_run
/// use rust_log_pipeline::prelude::*;
///
/// # async fn example() -> Result<()> {
/// let logger = Logger::builder()
///     .platform(Platform::Json)
///     .name("api")
///     .build()?;
///
/// logger.warn("disk almost full");
/// logger.log_with(
///     Severity::Info,
///     "request served",
///     Fields::new().with_field("status", 200),
/// );
///
/// logger.end().await?;
/// # Ok(())
/// # }
/// ```
pub struct Logger {
    min_level: Severity,
    name: Option<String>,
    propagator: ContextPropagator,
    commands: mpsc::UnboundedSender<Command>,
    ended: AtomicBool,
    shutdown: tokio::sync::Mutex<bool>,
    chain: ProcessorChain,
    sink: Arc<Sink>,
    events: broadcast::Sender<LogEvent>,
    metrics: Arc<PipelineMetrics>,
}

impl Logger {
    /// Create a builder for Logger
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    /// Queue a pre-built record
    ///
    /// Records below the minimum level are discarded. The active scope and
    /// the call-site location are captured here unless the record already
    /// carries them. After [`Logger::end`] records are dropped and counted in
    /// [`PipelineMetrics::dropped_count`].
    #[track_caller]
    pub fn emit(&self, mut record: LogRecord) {
        if !record.level.is_emittable() || !record.level.meets_threshold(self.min_level) {
            return;
        }
        if self.ended.load(Ordering::Acquire) {
            self.metrics.record_dropped();
            return;
        }

        if record.scope.is_none() {
            record.scope = self.propagator.current();
        }
        if record.location.is_none() {
            record.location = Some(Location::caller());
        }
        if let Some(name) = &self.name {
            if !record.ctx.contains_key(NAME_KEY) {
                // a frozen ctx keeps exactly what the caller supplied
                let _ = record.set_ctx(NAME_KEY, name.as_str());
            }
        }

        self.metrics.record_emitted();
        if self.commands.send(Command::Emit(record)).is_err() {
            self.metrics.record_dropped();
        }
    }

    #[track_caller]
    pub fn log(&self, level: Severity, msg: impl Into<String>) {
        self.emit(LogRecord::new(level).with_msg(msg));
    }

    #[track_caller]
    pub fn log_with(&self, level: Severity, msg: impl Into<String>, data: Fields) {
        self.emit(LogRecord::new(level).with_msg(msg).with_data(data));
    }

    /// Emit an error as the record payload, under `data.err`
    #[track_caller]
    pub fn log_error<E>(&self, level: Severity, error: E)
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.emit(
            LogRecord::new(level).with_data(Fields::new().with_field("err", FieldValue::error(error))),
        );
    }

    #[track_caller]
    pub fn trace(&self, msg: impl Into<String>) {
        self.log(Severity::Trace, msg);
    }

    #[track_caller]
    pub fn debug(&self, msg: impl Into<String>) {
        self.log(Severity::Debug, msg);
    }

    #[track_caller]
    pub fn info(&self, msg: impl Into<String>) {
        self.log(Severity::Info, msg);
    }

    #[track_caller]
    pub fn warn(&self, msg: impl Into<String>) {
        self.log(Severity::Warn, msg);
    }

    #[track_caller]
    pub fn error(&self, msg: impl Into<String>) {
        self.log(Severity::Error, msg);
    }

    #[track_caller]
    pub fn fatal(&self, msg: impl Into<String>) {
        self.log(Severity::Fatal, msg);
    }

    /// Wait until every record emitted before this call has been written to
    /// the destination, then drain processor backends
    pub async fn flush(&self) -> Result<()> {
        let (ack, done) = oneshot::channel();
        self.commands
            .send(Command::Flush(ack))
            .map_err(|_| LoggerError::ChannelSendError)?;
        done.await.map_err(|_| LoggerError::ChannelReceiveError)?;

        if !self.chain.flush(DEFAULT_SHUTDOWN_TIMEOUT).await? {
            eprintln!(
                "[LOGGER WARNING] Processor backends did not drain within {:?}",
                DEFAULT_SHUTDOWN_TIMEOUT
            );
        }
        Ok(())
    }

    /// Flush, then close the sink
    ///
    /// Idempotent: later (or concurrent) calls wait for the first to finish
    /// and return `Ok(())`. Callers needing a deadline can race this against
    /// `tokio::time::timeout`; a call cancelled before the sink closed leaves
    /// the next call to finish the shutdown.
    pub async fn end(&self) -> Result<()> {
        self.ended.store(true, Ordering::Release);

        let mut done = self.shutdown.lock().await;
        if *done {
            return Ok(());
        }

        let flushed = self.flush().await;
        let closed = self.sink.close().await;
        *done = true;
        flushed.and(closed)
    }

    pub fn is_ended(&self) -> bool {
        self.ended.load(Ordering::Acquire)
    }

    /// Observe completions and failures
    pub fn subscribe(&self) -> broadcast::Receiver<LogEvent> {
        self.events.subscribe()
    }

    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    pub fn min_level(&self) -> Severity {
        self.min_level
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn sink_state(&self) -> SinkState {
        self.sink.state()
    }

    pub fn propagator(&self) -> &ContextPropagator {
        &self.propagator
    }

    /// Allocate a fresh scope handle
    pub fn new_scope(&self) -> ContextHandle {
        self.propagator.new_handle()
    }

    /// Run `future` inside `handle`'s scope
    pub async fn run<F: Future>(&self, handle: ContextHandle, future: F) -> F::Output {
        self.propagator.run(handle, future).await
    }

    pub fn run_sync<R>(&self, handle: ContextHandle, f: impl FnOnce() -> R) -> R {
        self.propagator.run_sync(handle, f)
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if self.ended.load(Ordering::Acquire) {
            return;
        }

        let settled = self.metrics.written_count() + self.metrics.dropped_count();
        let emitted = self.metrics.emitted_count();
        if emitted > settled {
            eprintln!(
                "[LOGGER WARNING] Logger dropped without end(); up to {} records may be lost",
                emitted - settled
            );
        }
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("min_level", &self.min_level)
            .field("name", &self.name)
            .field("chain", &self.chain)
            .field("sink", &self.sink)
            .field("ended", &self.is_ended())
            .finish_non_exhaustive()
    }
}

/// Builder for constructing Logger with a fluent API
///
/// Stages run in this order: error normalization and context injection
/// (unless `standard_processors(false)`), caller annotation (opt-in),
/// redaction (when paths are configured), then custom processors in
/// registration order.
///
/// # Example
/// ```
/// use rust_log_pipeline::prelude::*;
/// use rust_log_pipeline::destinations::MemoryDestination;
///
/// # tokio_test::block_on(async {
/// let (destination, buffer) = MemoryDestination::new();
/// let logger = Logger::builder()
///     .min_level(Severity::Debug)
///     .platform(Platform::Json)
///     .destination(destination)
///     .redact(["password"])
///     .build()
///     .unwrap();
///
/// logger.debug("connected");
/// logger.end().await.unwrap();
/// assert_eq!(buffer.len(), 1);
/// # });
/// ```
pub struct LoggerBuilder {
    min_level: Severity,
    name: Option<String>,
    processors: Vec<Arc<dyn Processor>>,
    standard_processors: bool,
    caller_annotation: bool,
    redact: Vec<String>,
    censor: Option<String>,
    transformer: Option<Arc<dyn Transformer>>,
    platform: Option<Platform>,
    destination: Option<Box<dyn Destination>>,
    sink_capacity: usize,
    event_capacity: usize,
}

impl LoggerBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            min_level: Severity::Info,
            name: None,
            processors: Vec::new(),
            standard_processors: true,
            caller_annotation: false,
            redact: Vec::new(),
            censor: None,
            transformer: None,
            platform: None,
            destination: None,
            sink_capacity: DEFAULT_SINK_CAPACITY,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }

    /// Start from serializable settings
    pub fn from_config(config: LoggerConfig) -> Self {
        let mut builder = Self::new()
            .min_level(config.level)
            .sink_capacity(config.sink_capacity)
            .caller_annotation(config.caller_annotation)
            .redact(config.redact);
        builder.platform = config.platform;
        builder.name = config.name;
        builder.censor = config.censor;
        builder
    }

    /// Set minimum severity; `Severity::Silent` disables output
    #[must_use = "builder methods return a new value"]
    pub fn min_level(mut self, level: Severity) -> Self {
        self.min_level = level;
        self
    }

    /// Name stamped into `ctx.name` of every record that lacks one
    #[must_use = "builder methods return a new value"]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Append a custom processor stage
    #[must_use = "builder methods return a new value"]
    pub fn processor<P: Processor + 'static>(mut self, processor: P) -> Self {
        self.processors.push(Arc::new(processor));
        self
    }

    /// Append a shared processor stage
    #[must_use = "builder methods return a new value"]
    pub fn shared_processor(mut self, processor: Arc<dyn Processor>) -> Self {
        self.processors.push(processor);
        self
    }

    /// Toggle error normalization and context injection (on by default)
    #[must_use = "builder methods return a new value"]
    pub fn standard_processors(mut self, enabled: bool) -> Self {
        self.standard_processors = enabled;
        self
    }

    /// Toggle `ctx.caller` annotation (off by default)
    #[must_use = "builder methods return a new value"]
    pub fn caller_annotation(mut self, enabled: bool) -> Self {
        self.caller_annotation = enabled;
        self
    }

    /// Add redaction paths into `data`
    #[must_use = "builder methods return a new value"]
    pub fn redact<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.redact.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Replacement for redacted values
    #[must_use = "builder methods return a new value"]
    pub fn censor(mut self, censor: impl Into<String>) -> Self {
        self.censor = Some(censor.into());
        self
    }

    /// Explicit transformer; overrides `platform`
    #[must_use = "builder methods return a new value"]
    pub fn transformer<T: Transformer + 'static>(mut self, transformer: T) -> Self {
        self.transformer = Some(Arc::new(transformer));
        self
    }

    /// Platform whose default transformer is used; detected when unset
    #[must_use = "builder methods return a new value"]
    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Destination for the sink; stdout when unset
    #[must_use = "builder methods return a new value"]
    pub fn destination<D: Destination + 'static>(mut self, destination: D) -> Self {
        self.destination = Some(Box::new(destination));
        self
    }

    /// Outstanding lines before the sink applies backpressure
    #[must_use = "builder methods return a new value"]
    pub fn sink_capacity(mut self, capacity: usize) -> Self {
        self.sink_capacity = capacity;
        self
    }

    /// Events buffered per subscriber before the slowest one lags
    #[must_use = "builder methods return a new value"]
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Build the Logger
    ///
    /// # Errors
    ///
    /// [`LoggerError::InvalidConfiguration`] outside a Tokio runtime, for a
    /// zero capacity, or for an invalid redaction path.
    pub fn build(self) -> Result<Logger> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| LoggerError::config("logger", "must be built inside a Tokio runtime"))?;
        if self.event_capacity == 0 {
            return Err(LoggerError::config("logger", "event capacity must be at least 1"));
        }

        let mut chain = ProcessorChain::new();
        if self.standard_processors {
            chain.push(Arc::new(ErrorNormalizer));
            chain.push(Arc::new(ContextInjector));
        }
        if self.caller_annotation {
            chain.push(Arc::new(CallerAnnotator::new()));
        }
        if !self.redact.is_empty() {
            let mut redactor = Redactor::new(&self.redact)?;
            if let Some(censor) = self.censor {
                redactor = redactor.with_censor(censor);
            }
            chain.push(Arc::new(redactor));
        }
        for processor in self.processors {
            chain.push(processor);
        }

        let destination = self
            .destination
            .unwrap_or_else(|| Box::new(WriterDestination::stdout()));
        let terminal = destination.is_terminal();
        let transformer = match self.transformer {
            Some(transformer) => transformer,
            None => {
                let platform = self
                    .platform
                    .unwrap_or_else(|| Platform::detect(process_env, terminal));
                platform.transformer(color_enabled(process_env, terminal))
            }
        };

        let (events, _) = broadcast::channel(self.event_capacity);
        let metrics = Arc::new(PipelineMetrics::new());

        let on_error: SinkErrorHandler = {
            let events = events.clone();
            let metrics = Arc::clone(&metrics);
            Arc::new(move |error: LoggerError| {
                metrics.record_sink_error();
                publish(&events, LogEvent::SinkFailed(Arc::new(error)));
            })
        };
        let sink = Arc::new(Sink::open_with_error_handler(
            destination,
            self.sink_capacity,
            on_error,
        )?);

        let (commands, receiver) = mpsc::unbounded_channel();
        let pipeline = Pipeline {
            chain: chain.clone(),
            transformer,
            sink: Arc::clone(&sink),
            events: events.clone(),
            metrics: Arc::clone(&metrics),
        };
        runtime.spawn(pipeline.run(receiver));

        Ok(Logger {
            min_level: self.min_level,
            name: self.name,
            propagator: ContextPropagator::new(),
            commands,
            ended: AtomicBool::new(false),
            shutdown: tokio::sync::Mutex::new(false),
            chain,
            sink,
            events,
            metrics,
        })
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::destinations::{MemoryBuffer, MemoryDestination};
    use crate::transformers::JsonTransformer;

    fn memory_logger(builder: LoggerBuilder) -> (Logger, MemoryBuffer) {
        let (destination, buffer) = MemoryDestination::new();
        let logger = builder
            .transformer(JsonTransformer)
            .destination(destination)
            .build()
            .unwrap();
        (logger, buffer)
    }

    fn parsed(buffer: &MemoryBuffer) -> Vec<serde_json::Value> {
        buffer
            .lines()
            .iter()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_build_outside_runtime_fails() {
        assert!(matches!(
            Logger::builder().build(),
            Err(LoggerError::InvalidConfiguration { .. })
        ));
    }

    #[tokio::test]
    async fn test_builder_rejects_bad_settings() {
        assert!(Logger::builder().sink_capacity(0).build().is_err());
        assert!(Logger::builder().event_capacity(0).build().is_err());
        assert!(Logger::builder().redact(["a..b"]).build().is_err());
    }

    #[tokio::test]
    async fn test_min_level_filters() {
        let (logger, buffer) = memory_logger(Logger::builder().min_level(Severity::Warn));

        logger.info("hidden");
        logger.warn("shown");
        logger.end().await.unwrap();

        let lines = parsed(&buffer);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["msg"], "shown");
        assert_eq!(logger.metrics().emitted_count(), 1);
    }

    #[tokio::test]
    async fn test_silent_disables_everything() {
        let (logger, buffer) = memory_logger(Logger::builder().min_level(Severity::Silent));

        logger.fatal("nothing");
        logger.emit(LogRecord::new(Severity::Silent));
        logger.end().await.unwrap();

        assert!(buffer.is_empty());
    }

    #[tokio::test]
    async fn test_name_stamped_unless_supplied() {
        let (logger, buffer) = memory_logger(Logger::builder().name("billing"));

        logger.info("a");
        logger.emit(
            LogRecord::new(Severity::Info).with_ctx(Fields::new().with_field(NAME_KEY, "custom")),
        );
        logger.end().await.unwrap();

        let lines = parsed(&buffer);
        assert_eq!(lines[0]["ctx"]["name"], "billing");
        assert_eq!(lines[1]["ctx"]["name"], "custom");
    }

    #[tokio::test]
    async fn test_end_is_idempotent_and_drops_later_emits() {
        let (logger, buffer) = memory_logger(Logger::builder());

        logger.info("before");
        logger.end().await.unwrap();
        logger.end().await.unwrap();
        logger.info("after");

        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.close_count(), 1);
        assert_eq!(logger.sink_state(), SinkState::Closed);
        assert_eq!(logger.metrics().dropped_count(), 1);
        assert!(logger.is_ended());
    }

    #[tokio::test]
    async fn test_concurrent_end_calls() {
        let (logger, buffer) = memory_logger(Logger::builder());
        for i in 0..20 {
            logger.info(format!("line {}", i));
        }

        let (a, b) = tokio::join!(logger.end(), logger.end());
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(buffer.len(), 20);
        assert_eq!(buffer.close_count(), 1);
    }

    #[tokio::test]
    async fn test_flush_keeps_sink_open() {
        let (logger, buffer) = memory_logger(Logger::builder());

        logger.info("one");
        logger.flush().await.unwrap();
        assert_eq!(buffer.len(), 1);
        assert_ne!(logger.sink_state(), SinkState::Closed);

        logger.info("two");
        logger.end().await.unwrap();
        assert_eq!(buffer.len(), 2);
    }

    fn drain_events(events: &mut broadcast::Receiver<LogEvent>) -> Vec<LogEvent> {
        let mut drained = Vec::new();
        while let Ok(event) = events.try_recv() {
            drained.push(event);
        }
        drained
    }

    struct PanickingTransformer;

    impl Transformer for PanickingTransformer {
        fn transform(&self, _record: &LogRecord) -> String {
            panic!("cannot render");
        }

        fn name(&self) -> &str {
            "panicking"
        }
    }

    struct EmptyTransformer;

    impl Transformer for EmptyTransformer {
        fn transform(&self, _record: &LogRecord) -> String {
            String::new()
        }

        fn name(&self) -> &str {
            "empty"
        }
    }

    #[tokio::test]
    async fn test_transform_panic_writes_marker() {
        let (destination, buffer) = MemoryDestination::new();
        let logger = Logger::builder()
            .transformer(PanickingTransformer)
            .destination(destination)
            .build()
            .unwrap();
        let mut events = logger.subscribe();

        logger.info("unlucky");
        logger.end().await.unwrap();

        assert_eq!(buffer.lines(), vec![UNRENDERABLE_MARKER]);
        let failures: Vec<_> = drain_events(&mut events)
            .into_iter()
            .filter_map(|event| match event {
                LogEvent::TransformFailed { record, message } => Some((record, message)),
                _ => None,
            })
            .collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0.msg.as_deref(), Some("unlucky"));
        assert!(failures[0].1.contains("cannot render"));
    }

    #[tokio::test]
    async fn test_empty_transform_writes_marker() {
        let (destination, buffer) = MemoryDestination::new();
        let logger = Logger::builder()
            .transformer(EmptyTransformer)
            .destination(destination)
            .build()
            .unwrap();
        let mut events = logger.subscribe();

        logger.info("blank");
        logger.end().await.unwrap();

        assert_eq!(buffer.lines(), vec![UNRENDERABLE_MARKER]);
        assert!(drain_events(&mut events)
            .iter()
            .all(|event| !event.is_failure()));
    }

    struct FailingDestination;

    #[async_trait::async_trait]
    impl Destination for FailingDestination {
        async fn write_line(&mut self, _line: &str) -> Result<()> {
            Err(LoggerError::writer("disk full"))
        }

        async fn flush(&mut self) -> Result<()> {
            Ok(())
        }

        async fn close(&mut self) -> Result<()> {
            Err(LoggerError::writer("close failed"))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    #[tokio::test]
    async fn test_destination_errors_are_published() {
        let logger = Logger::builder()
            .transformer(JsonTransformer)
            .destination(FailingDestination)
            .build()
            .unwrap();
        let mut events = logger.subscribe();

        logger.info("lost");
        assert!(logger.end().await.is_err());
        assert_eq!(logger.sink_state(), SinkState::Closed);

        let sink_failures: Vec<String> = drain_events(&mut events)
            .into_iter()
            .filter_map(|event| match event {
                LogEvent::SinkFailed(error) => Some(error.to_string()),
                _ => None,
            })
            .collect();
        assert_eq!(sink_failures.len(), 2);
        assert!(sink_failures[0].contains("disk full"));
        assert!(sink_failures[1].contains("close failed"));
        assert_eq!(logger.metrics().sink_errors(), 2);
    }

    struct PanickingDestination;

    #[async_trait::async_trait]
    impl Destination for PanickingDestination {
        async fn write_line(&mut self, line: &str) -> Result<()> {
            panic!("refusing {}", line);
        }

        async fn flush(&mut self) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "panicking"
        }
    }

    #[tokio::test]
    async fn test_panicking_destination_does_not_stall_end() {
        let logger = Logger::builder()
            .transformer(JsonTransformer)
            .destination(PanickingDestination)
            .build()
            .unwrap();
        let mut events = logger.subscribe();

        logger.info("boom");
        let ended = tokio::time::timeout(Duration::from_secs(2), logger.end()).await;

        assert!(matches!(ended, Ok(Ok(()))));
        assert_eq!(logger.sink_state(), SinkState::Closed);
        assert_eq!(logger.metrics().sink_errors(), 1);
        assert!(drain_events(&mut events)
            .iter()
            .any(|event| matches!(event, LogEvent::SinkFailed(_))));
    }

    /// Delays every write so shutdown can be interrupted
    struct SlowDestination(MemoryDestination);

    #[async_trait::async_trait]
    impl Destination for SlowDestination {
        async fn write_line(&mut self, line: &str) -> Result<()> {
            tokio::time::sleep(Duration::from_millis(200)).await;
            self.0.write_line(line).await
        }

        async fn flush(&mut self) -> Result<()> {
            self.0.flush().await
        }

        async fn close(&mut self) -> Result<()> {
            self.0.close().await
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    #[tokio::test]
    async fn test_cancelled_end_can_be_retried() {
        let (destination, buffer) = MemoryDestination::new();
        let logger = Logger::builder()
            .transformer(JsonTransformer)
            .destination(SlowDestination(destination))
            .build()
            .unwrap();

        logger.info("slow line");
        let first = tokio::time::timeout(Duration::from_millis(20), logger.end()).await;
        assert!(first.is_err());
        assert_ne!(logger.sink_state(), SinkState::Closed);

        logger.end().await.unwrap();
        assert_eq!(logger.sink_state(), SinkState::Closed);
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.close_count(), 1);
    }

    #[cfg(feature = "console")]
    #[tokio::test]
    async fn test_terminal_colors_follow_destination() {
        use crate::transformers::PrettyTransformer;

        let (destination, buffer) = MemoryDestination::new();
        let logger = Logger::builder()
            .platform(Platform::Terminal)
            .destination(destination)
            .build()
            .unwrap();
        logger.info("plain");
        logger.end().await.unwrap();

        let lines = buffer.lines();
        assert!(lines[0].contains("plain"));
        if std::env::var_os("FORCE_COLOR").is_none() {
            assert!(!lines[0].contains('\x1b'));
        }

        let colored = PrettyTransformer::new(true).transform(&LogRecord::new(Severity::Info));
        assert!(colored.contains('\x1b'));
    }

    #[tokio::test]
    async fn test_error_payload_sets_msg() {
        #[derive(Debug, thiserror::Error)]
        #[error("connection refused")]
        struct Refused;

        let (logger, buffer) = memory_logger(Logger::builder());
        logger.log_error(Severity::Error, Refused);
        logger.end().await.unwrap();

        let lines = parsed(&buffer);
        assert_eq!(lines[0]["msg"], "connection refused");
        assert_eq!(lines[0]["error"]["type"], "Refused");
    }
}
