//! Append-log (tab-separated) transformer
//!
//! `<ISO-8601 time>\t<contextId or empty>\t<LEVEL>\t<msg or empty>\t<JSON of remaining fields>`

use crate::core::timestamp::to_iso8601;
use crate::core::transformer::{context_id, ctx_object, escape_control, split_error, to_json_line};
use crate::core::{LogRecord, Severity, Transformer};
use crate::processors::CONTEXT_ID_KEY;

const LEVEL_TABLE: [(Severity, &str); 6] = [
    (Severity::Trace, "TRACE"),
    (Severity::Debug, "DEBUG"),
    (Severity::Info, "INFO"),
    (Severity::Warn, "WARN"),
    (Severity::Error, "ERROR"),
    (Severity::Fatal, "FATAL"),
];

const DEFAULT_LEVEL: &str = "INFO";

pub fn append_log_level(level: Severity) -> &'static str {
    LEVEL_TABLE
        .iter()
        .find(|(s, _)| *s == level)
        .map(|(_, name)| *name)
        .unwrap_or(DEFAULT_LEVEL)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AppendLogTransformer;

impl AppendLogTransformer {
    pub fn new() -> Self {
        Self
    }
}

impl Transformer for AppendLogTransformer {
    fn transform(&self, record: &LogRecord) -> String {
        let (mut rest, error) = split_error(record);
        if let Some(error) = error {
            rest.insert("err".to_string(), error);
        }
        if let Some(ctx) = ctx_object(record, &[CONTEXT_ID_KEY]) {
            rest.insert("ctx".to_string(), ctx);
        }

        let rest = to_json_line(rest);
        format!(
            "{}\t{}\t{}\t{}\t{}",
            to_iso8601(&record.time),
            escape_control(&context_id(record).unwrap_or_default()),
            append_log_level(record.level),
            escape_control(record.msg.as_deref().unwrap_or_default()),
            if rest.is_empty() { "{}" } else { rest.as_str() },
        )
    }

    fn name(&self) -> &str {
        "append_log"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ContextHandle, Fields};

    #[test]
    fn test_columns() {
        let record = LogRecord::new(Severity::Warn)
            .with_time(1_736_332_245_123_i64)
            .with_msg("slow query")
            .with_ctx(Fields::new().with_field("contextId", "req-9").with_field("name", "db"))
            .with_data(Fields::new().with_field("ms", 1200));

        let line = AppendLogTransformer.transform(&record);
        let columns: Vec<&str> = line.split('\t').collect();

        assert_eq!(columns.len(), 5);
        assert_eq!(columns[0], "2025-01-08T10:30:45.123Z");
        assert_eq!(columns[1], "req-9");
        assert_eq!(columns[2], "WARN");
        assert_eq!(columns[3], "slow query");

        let rest: serde_json::Value = serde_json::from_str(columns[4]).unwrap();
        assert_eq!(rest["ms"], 1200);
        assert_eq!(rest["ctx"]["name"], "db");
        assert!(rest["ctx"].get("contextId").is_none());
    }

    #[test]
    fn test_missing_values_leave_empty_columns() {
        let line = AppendLogTransformer.transform(&LogRecord::new(Severity::Info));
        let columns: Vec<&str> = line.split('\t').collect();

        assert_eq!(columns.len(), 5);
        assert_eq!(columns[1], "");
        assert_eq!(columns[3], "");
        assert_eq!(columns[4], "{}");
    }

    #[test]
    fn test_scope_used_when_ctx_lacks_id() {
        let record = LogRecord::new(Severity::Info).with_scope(ContextHandle::new("scope-1"));
        let line = AppendLogTransformer.transform(&record);
        assert_eq!(line.split('\t').nth(1), Some("scope-1"));
    }

    #[test]
    fn test_control_characters_cannot_split_line() {
        let record = LogRecord::new(Severity::Info).with_msg("a\tb\nc");
        let line = AppendLogTransformer.transform(&record);

        assert_eq!(line.split('\t').count(), 5);
        assert!(!line.contains('\n'));
    }
}
