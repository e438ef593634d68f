//! Context injection stage

use crate::core::{Fields, LogRecord, Processor, Result};
use async_trait::async_trait;

/// `ctx` key holding the active scope id
pub const CONTEXT_ID_KEY: &str = "contextId";

/// Merges the scope captured at the call-site into `ctx`
///
/// Caller-supplied `ctx` entries take precedence on key collisions. Records
/// emitted outside any scope pass through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextInjector;

impl ContextInjector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Processor for ContextInjector {
    async fn process(&self, mut record: LogRecord) -> Result<LogRecord> {
        let Some(scope) = record.scope.clone() else {
            return Ok(record);
        };

        let mut injected = scope
            .context
            .as_deref()
            .map(|context| context.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_else(Fields::new);
        injected = injected.with_field(CONTEXT_ID_KEY, scope.context_id.as_str());

        if injected.keys().all(|key| record.ctx.contains_key(key)) {
            return Ok(record);
        }
        record.ctx_mut().merge_missing(&injected)?;
        Ok(record)
    }

    fn name(&self) -> &str {
        "context_injector"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ContextHandle, FieldValue, Severity};

    #[tokio::test]
    async fn test_no_scope_passes_through() {
        let record = LogRecord::new(Severity::Info);
        let out = ContextInjector.process(record.clone()).await.unwrap();
        assert_eq!(out, record);
        assert!(out.ctx.is_empty());
    }

    #[tokio::test]
    async fn test_scope_injected() {
        let handle = ContextHandle::new("req-7")
            .with_context(Fields::new().with_field("tenant", "acme"));
        let record = LogRecord::new(Severity::Info).with_scope(handle);

        let out = ContextInjector.process(record).await.unwrap();
        assert_eq!(out.ctx.get(CONTEXT_ID_KEY).and_then(FieldValue::as_str), Some("req-7"));
        assert_eq!(out.ctx.get("tenant").and_then(FieldValue::as_str), Some("acme"));
    }

    #[tokio::test]
    async fn test_caller_ctx_wins() {
        let handle = ContextHandle::new("req-7")
            .with_context(Fields::new().with_field("tenant", "acme"));
        let record = LogRecord::new(Severity::Info)
            .with_scope(handle)
            .with_ctx(Fields::new().with_field("tenant", "override"));

        let out = ContextInjector.process(record).await.unwrap();
        assert_eq!(out.ctx.get("tenant").and_then(FieldValue::as_str), Some("override"));
        assert_eq!(out.ctx.get(CONTEXT_ID_KEY).and_then(FieldValue::as_str), Some("req-7"));
    }

    #[tokio::test]
    async fn test_frozen_ctx_with_missing_keys_fails() {
        let record = LogRecord::new(Severity::Info)
            .with_scope(ContextHandle::new("req-1"))
            .with_ctx(Fields::new().with_field("name", "api").freeze());

        assert!(ContextInjector.process(record).await.is_err());
    }
}
