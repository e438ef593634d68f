//! Transformer trait: record to single wire-format line

use super::fields::FieldValue;
use super::record::LogRecord;
use serde_json::{Map, Value};

/// Written in place of a record no transformer could render
pub const UNRENDERABLE_MARKER: &str = "[unrenderable log record]";

/// Pure, total rendering of a record into one self-contained line
///
/// Implementations must not panic and must not keep state between calls.
/// Serialization problems fall back to an empty string, which the pipeline
/// replaces with [`UNRENDERABLE_MARKER`].
pub trait Transformer: Send + Sync {
    fn transform(&self, record: &LogRecord) -> String;

    fn name(&self) -> &str;
}

/// `data` as a JSON object, with an error-like `err` pulled out and
/// normalized. A non-error `err` stays in the map untouched.
pub(crate) fn split_error(record: &LogRecord) -> (Map<String, Value>, Option<Value>) {
    let mut data = record.data.to_json_map();
    let error = match record.err() {
        Some(value) if value.is_error_like() => {
            data.remove("err");
            value.normalized_error().map(|e| e.to_json_value())
        }
        _ => None,
    };
    (data, error)
}

/// `ctx` as a JSON object, skipping `excluded` keys; `None` when empty
pub(crate) fn ctx_object(record: &LogRecord, excluded: &[&str]) -> Option<Value> {
    let mut ctx = record.ctx.to_json_map();
    for key in excluded {
        ctx.remove(*key);
    }
    (!ctx.is_empty()).then_some(Value::Object(ctx))
}

/// Compact JSON; empty on failure
pub(crate) fn to_json_line(object: Map<String, Value>) -> String {
    serde_json::to_string(&Value::Object(object)).unwrap_or_default()
}

/// Escape control characters so free text cannot break a line-based format
pub(crate) fn escape_control(text: &str) -> String {
    text.replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

/// `ctx.contextId`, falling back to the scope captured at the call-site
pub(crate) fn context_id(record: &LogRecord) -> Option<String> {
    record
        .ctx
        .get(crate::processors::CONTEXT_ID_KEY)
        .and_then(FieldValue::as_str)
        .map(String::from)
        .or_else(|| record.scope.as_ref().map(|s| s.context_id.clone()))
}
