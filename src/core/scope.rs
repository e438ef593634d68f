//! Ambient, scope-bound correlation context
//!
//! A [`ContextHandle`] is established for the dynamic extent of a future (or
//! closure) with [`ContextPropagator::run`]. Anything polled inside that
//! future, across every `.await`, reads it back with
//! [`ContextPropagator::current`]. Sibling futures never observe each
//! other's handle, and the previous handle is restored on every exit path,
//! including panics.
//!
//! # Example
//!
//! ```
//! use rust_log_pipeline::core::{ContextHandle, ContextPropagator};
//!
//! # tokio_test::block_on(async {
//! let propagator = ContextPropagator::new();
//! let handle = ContextHandle::new("req-42");
//!
//! let seen = propagator
//!     .run(handle, async { ContextPropagator::new().current().map(|h| h.context_id) })
//!     .await;
//! assert_eq!(seen.as_deref(), Some("req-42"));
//! assert!(propagator.current().is_none());
//! # });
//! ```

use super::fields::Fields;
use rand::Rng;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

tokio::task_local! {
    static ACTIVE_SCOPE: ContextHandle;
}

/// One logical execution scope (inbound request, invocation, job)
#[derive(Debug, Clone, PartialEq)]
pub struct ContextHandle {
    pub context_id: String,
    pub context: Option<Arc<Fields>>,
}

impl ContextHandle {
    pub fn new(context_id: impl Into<String>) -> Self {
        Self {
            context_id: context_id.into(),
            context: None,
        }
    }

    #[must_use]
    pub fn with_context(mut self, context: Fields) -> Self {
        self.context = Some(Arc::new(context));
        self
    }
}

/// Reads and establishes the active [`ContextHandle`]
///
/// The active scope lives in a Tokio task-local, so any propagator reads the
/// same scope; each instance only owns its scope-id sequence.
#[derive(Debug, Clone)]
pub struct ContextPropagator {
    prefix: Arc<str>,
    sequence: Arc<AtomicU64>,
}

impl ContextPropagator {
    pub fn new() -> Self {
        let prefix = format!("{:08x}", rand::thread_rng().gen::<u32>());
        Self {
            prefix: Arc::from(prefix),
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Allocate a handle with a fresh id: `<random prefix>-<sequence>`
    pub fn new_handle(&self) -> ContextHandle {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        ContextHandle::new(format!("{}-{}", self.prefix, seq))
    }

    /// Run `future` with `handle` as the active scope
    pub async fn run<F>(&self, handle: ContextHandle, future: F) -> F::Output
    where
        F: Future,
    {
        ACTIVE_SCOPE.scope(handle, future).await
    }

    /// Synchronous counterpart of [`ContextPropagator::run`]
    pub fn run_sync<R, F>(&self, handle: ContextHandle, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        ACTIVE_SCOPE.sync_scope(handle, f)
    }

    /// Innermost active handle, or `None` outside any scope
    pub fn current(&self) -> Option<ContextHandle> {
        ACTIVE_SCOPE.try_with(ContextHandle::clone).ok()
    }

    /// Carry the current scope (if any) into a future that will be polled
    /// elsewhere, e.g. by `tokio::spawn`
    pub fn bind<F>(&self, future: F) -> impl Future<Output = F::Output>
    where
        F: Future,
    {
        let current = self.current();
        async move {
            match current {
                Some(handle) => ACTIVE_SCOPE.scope(handle, future).await,
                None => future.await,
            }
        }
    }
}

impl Default for ContextPropagator {
    fn default() -> Self {
        Self::new()
    }
}
