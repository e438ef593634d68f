//! Log record structure
//!
//! `data` and `ctx` are shared behind `Arc`, so cloning a record is cheap and
//! every in-place edit goes through `Arc::make_mut`: a stage that changes a
//! record edits its own copy and never the map its caller still holds.

use super::error::Result;
use super::fields::{FieldValue, Fields};
use super::scope::ContextHandle;
use super::severity::Severity;
use super::timestamp::TimeInput;
use chrono::{DateTime, Utc};
use std::panic::Location;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub level: Severity,
    /// Wall-clock time; not monotonic across records
    pub time: DateTime<Utc>,
    pub msg: Option<String>,
    pub ctx: Arc<Fields>,
    pub data: Arc<Fields>,
    /// Ambient scope captured at the call-site
    pub scope: Option<ContextHandle>,
    /// Call-site location captured at emit time
    pub location: Option<&'static Location<'static>>,
}

impl LogRecord {
    pub fn new(level: Severity) -> Self {
        Self {
            level,
            time: Utc::now(),
            msg: None,
            ctx: Arc::new(Fields::new()),
            data: Arc::new(Fields::new()),
            scope: None,
            location: None,
        }
    }

    #[must_use]
    pub fn with_msg(mut self, msg: impl Into<String>) -> Self {
        self.msg = Some(msg.into());
        self
    }

    #[must_use]
    pub fn with_time(mut self, time: impl Into<TimeInput>) -> Self {
        self.time = time.into().to_utc();
        self
    }

    #[must_use]
    pub fn with_data(mut self, data: Fields) -> Self {
        self.data = Arc::new(data);
        self
    }

    #[must_use]
    pub fn with_ctx(mut self, ctx: Fields) -> Self {
        self.ctx = Arc::new(ctx);
        self
    }

    #[must_use]
    pub fn with_scope(mut self, scope: ContextHandle) -> Self {
        self.scope = Some(scope);
        self
    }

    #[must_use]
    pub fn with_location(mut self, location: &'static Location<'static>) -> Self {
        self.location = Some(location);
        self
    }

    /// Copy-on-write access to `data`
    pub fn data_mut(&mut self) -> &mut Fields {
        Arc::make_mut(&mut self.data)
    }

    /// Copy-on-write access to `ctx`
    pub fn ctx_mut(&mut self) -> &mut Fields {
        Arc::make_mut(&mut self.ctx)
    }

    /// Set a `data` field, copying the map first if it is shared
    pub fn set_data(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Result<()> {
        self.data_mut().insert(key, value)
    }

    /// Set a `ctx` field, copying the map first if it is shared
    pub fn set_ctx(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Result<()> {
        self.ctx_mut().insert(key, value)
    }

    /// Value under `data.err`, if any
    pub fn err(&self) -> Option<&FieldValue> {
        self.data.get("err")
    }

    /// `ctx.name`, when present as a string
    pub fn name(&self) -> Option<&str> {
        self.ctx.get("name").and_then(FieldValue::as_str)
    }
}
