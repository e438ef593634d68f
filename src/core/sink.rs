//! Backpressure-aware sink
//!
//! ```text
//! Opening ──> Ready <──> Draining
//!               │            │
//!               └──> Closing <┘ ──> Closed
//! ```
//!
//! Lines are queued in submission order and written by a dedicated writer
//! task that exclusively owns the [`Destination`]. `write` reports
//! `Ok(false)` once more than `capacity` lines are outstanding; the caller is
//! expected to wait on [`Sink::drained`] before writing again. The rejected
//! line itself is still queued and delivered.

use super::error::{panic_message, LoggerError, Result};
use async_trait::async_trait;
use futures::FutureExt;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;

/// Default number of outstanding lines before `write` signals backpressure
pub const DEFAULT_SINK_CAPACITY: usize = 1024;

/// Underlying byte stream a sink delivers lines to
///
/// A destination is owned by exactly one sink. `write_line` receives the
/// line without its terminator.
#[async_trait]
pub trait Destination: Send {
    async fn write_line(&mut self, line: &str) -> Result<()>;

    async fn flush(&mut self) -> Result<()>;

    /// Flush and release the destination
    async fn close(&mut self) -> Result<()> {
        self.flush().await
    }

    fn name(&self) -> &str;

    /// Whether lines land on an interactive terminal
    fn is_terminal(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkState {
    /// Writer task not started yet; writes are queued
    Opening,
    Ready,
    /// Over capacity; waiting for the queue to empty
    Draining,
    /// No new writes; queued lines are still being delivered
    Closing,
    Closed,
}

/// Snapshot published on every state or queue change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkStatus {
    pub state: SinkState,
    /// Lines queued or in flight
    pub pending: usize,
}

/// Callback for destination failures during write, flush and close
pub type SinkErrorHandler = Arc<dyn Fn(LoggerError) + Send + Sync>;

struct Queue {
    lines: VecDeque<String>,
    pending: usize,
    state: SinkState,
}

struct Shared {
    queue: Mutex<Queue>,
    capacity: usize,
    wake: Notify,
    status: watch::Sender<SinkStatus>,
    destination: String,
    on_error: Option<SinkErrorHandler>,
}

impl Shared {
    fn publish(&self, queue: &Queue) {
        self.status.send_replace(SinkStatus {
            state: queue.state,
            pending: queue.pending,
        });
    }

    fn update(&self, f: impl FnOnce(&mut Queue)) {
        let mut queue = self.queue.lock();
        f(&mut queue);
        self.publish(&queue);
    }

    fn report(&self, error: LoggerError) {
        if let Some(handler) = &self.on_error {
            handler(error);
        }
    }
}

pub struct Sink {
    shared: Arc<Shared>,
    writer: Mutex<Option<JoinHandle<Result<()>>>>,
}

impl Sink {
    /// Open a sink over `destination`
    ///
    /// Must be called inside a Tokio runtime; the writer task is spawned on
    /// the current one.
    pub fn open(destination: Box<dyn Destination>, capacity: usize) -> Result<Self> {
        Self::open_inner(destination, capacity, None)
    }

    /// Open a sink whose destination failures are passed to `on_error`
    pub fn open_with_error_handler(
        destination: Box<dyn Destination>,
        capacity: usize,
        on_error: SinkErrorHandler,
    ) -> Result<Self> {
        Self::open_inner(destination, capacity, Some(on_error))
    }

    fn open_inner(
        destination: Box<dyn Destination>,
        capacity: usize,
        on_error: Option<SinkErrorHandler>,
    ) -> Result<Self> {
        if capacity == 0 {
            return Err(LoggerError::config("sink", "capacity must be at least 1"));
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| LoggerError::config("sink", "must be opened inside a Tokio runtime"))?;

        let (status, _) = watch::channel(SinkStatus {
            state: SinkState::Opening,
            pending: 0,
        });
        let shared = Arc::new(Shared {
            queue: Mutex::new(Queue {
                lines: VecDeque::new(),
                pending: 0,
                state: SinkState::Opening,
            }),
            capacity,
            wake: Notify::new(),
            status,
            destination: destination.name().to_string(),
            on_error,
        });

        let writer = runtime.spawn(run_writer(Arc::clone(&shared), destination));

        Ok(Self {
            shared,
            writer: Mutex::new(Some(writer)),
        })
    }

    /// Queue a line for delivery
    ///
    /// Returns `Ok(false)` when the sink is over capacity: the line is queued
    /// anyway, but the caller should await [`Sink::drained`] before the next
    /// write. Fails with [`LoggerError::SinkClosed`] once `close` has begun.
    pub fn write(&self, line: impl Into<String>) -> Result<bool> {
        let accepted = {
            let mut queue = self.shared.queue.lock();
            if matches!(queue.state, SinkState::Closing | SinkState::Closed) {
                return Err(LoggerError::sink_closed(&self.shared.destination));
            }

            queue.lines.push_back(line.into());
            queue.pending += 1;

            let accepted = queue.pending <= self.shared.capacity;
            if !accepted && matches!(queue.state, SinkState::Opening | SinkState::Ready) {
                queue.state = SinkState::Draining;
            }
            self.shared.publish(&queue);
            accepted
        };

        self.shared.wake.notify_one();
        Ok(accepted)
    }

    /// Resolve once the sink leaves `Draining`
    pub async fn drained(&self) {
        self.wait_for(|s| s.state != SinkState::Draining).await;
    }

    /// Resolve once every queued line has been written and flushed
    pub async fn flushed(&self) {
        self.wait_for(|s| s.pending == 0 || s.state == SinkState::Closed)
            .await;
    }

    /// Stop accepting writes, deliver everything queued and close the
    /// destination
    ///
    /// Idempotent: later calls wait for `Closed` and return `Ok(())`. A
    /// destination error during close is returned (and reported), but the
    /// sink still ends up `Closed`.
    pub async fn close(&self) -> Result<()> {
        let first = {
            let mut queue = self.shared.queue.lock();
            let first = !matches!(queue.state, SinkState::Closing | SinkState::Closed);
            if first {
                queue.state = SinkState::Closing;
                self.shared.publish(&queue);
            }
            first
        };
        self.shared.wake.notify_one();

        if !first {
            self.wait_for(|s| s.state == SinkState::Closed).await;
            return Ok(());
        }

        let writer = self.writer.lock().take();
        let result = match writer {
            Some(handle) => match handle.await {
                Ok(result) => result,
                Err(e) => {
                    self.shared
                        .report(LoggerError::writer(format!("sink writer task failed: {}", e)));
                    Err(LoggerError::writer(format!(
                        "sink writer for '{}' did not finish",
                        self.shared.destination
                    )))
                }
            },
            None => Ok(()),
        };

        self.shared.update(|q| {
            q.state = SinkState::Closed;
            q.lines.clear();
            q.pending = 0;
        });
        result
    }

    pub fn state(&self) -> SinkState {
        self.shared.queue.lock().state
    }

    pub fn pending(&self) -> usize {
        self.shared.queue.lock().pending
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    pub fn destination(&self) -> &str {
        &self.shared.destination
    }

    /// Watch state and queue depth
    pub fn subscribe_status(&self) -> watch::Receiver<SinkStatus> {
        self.shared.status.subscribe()
    }

    async fn wait_for(&self, predicate: impl FnMut(&SinkStatus) -> bool) {
        let mut status = self.shared.status.subscribe();
        // The sender lives as long as `self`
        let _ = status.wait_for(predicate).await;
    }
}

impl Drop for Sink {
    fn drop(&mut self) {
        // The detached writer still delivers queued lines and closes
        self.shared.update(|q| {
            if !matches!(q.state, SinkState::Closing | SinkState::Closed) {
                q.state = SinkState::Closing;
            }
        });
        self.shared.wake.notify_one();
    }
}

impl std::fmt::Debug for Sink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = *self.shared.status.borrow();
        f.debug_struct("Sink")
            .field("destination", &self.shared.destination)
            .field("capacity", &self.shared.capacity)
            .field("status", &status)
            .finish()
    }
}

async fn run_writer(shared: Arc<Shared>, mut destination: Box<dyn Destination>) -> Result<()> {
    shared.update(|q| {
        if q.state == SinkState::Opening {
            q.state = SinkState::Ready;
        }
    });

    loop {
        let next = {
            let mut queue = shared.queue.lock();
            match queue.lines.pop_front() {
                Some(line) => Some((line, queue.lines.is_empty())),
                None if queue.state == SinkState::Closing => break,
                None => None,
            }
        };

        let Some((line, last)) = next else {
            shared.wake.notified().await;
            continue;
        };

        if let Err(e) = guarded(&shared, "writing", destination.write_line(&line)).await {
            shared.report(e);
        }
        if last {
            if let Err(e) = guarded(&shared, "flushing", destination.flush()).await {
                shared.report(e);
            }
        }

        shared.update(|q| {
            q.pending = q.pending.saturating_sub(1);
            if q.pending == 0 && q.state == SinkState::Draining {
                q.state = SinkState::Ready;
            }
        });
    }

    let result = match guarded(&shared, "closing", destination.close()).await {
        Ok(()) => Ok(()),
        Err(e) => {
            let summary = LoggerError::writer(format!(
                "closing '{}' failed: {}",
                shared.destination, e
            ));
            shared.report(e);
            Err(summary)
        }
    };
    shared.update(|q| q.state = SinkState::Closed);
    result
}

/// Run one destination call, turning a panic into a writer error
async fn guarded<F>(shared: &Shared, action: &str, call: F) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    match AssertUnwindSafe(call).catch_unwind().await {
        Ok(result) => result,
        Err(panic_info) => Err(LoggerError::writer(format!(
            "destination '{}' panicked while {}: {}",
            shared.destination,
            action,
            panic_message(panic_info.as_ref())
        ))),
    }
}
