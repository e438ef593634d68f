//! Cloud-function JSON transformer
//!
//! `{"severity":"WARNING","time":"<ISO-8601>","message":"..",<data fields>,"err":{..},"ctx":{..}}`
//!
//! Records at `Error` or above carry an `@type` marker so the platform's
//! error-reporting pipeline picks them up.

use crate::core::timestamp::to_iso8601;
use crate::core::transformer::{ctx_object, to_json_line};
use crate::core::{LogRecord, Severity, Transformer};
use serde_json::Value;

/// Marker that classifies a line as a reported error event
pub const ERROR_EVENT_TYPE: &str =
    "type.googleapis.com/google.devtools.clouderrorreporting.v1beta1.ReportedErrorEvent";

const SEVERITY_TABLE: [(Severity, &str); 6] = [
    (Severity::Trace, "DEBUG"),
    (Severity::Debug, "DEBUG"),
    (Severity::Info, "INFO"),
    (Severity::Warn, "WARNING"),
    (Severity::Error, "ERROR"),
    (Severity::Fatal, "CRITICAL"),
];

const DEFAULT_SEVERITY: &str = "DEFAULT";

/// Platform severity name for `level`
pub fn cloud_severity(level: Severity) -> &'static str {
    SEVERITY_TABLE
        .iter()
        .find(|(s, _)| *s == level)
        .map(|(_, name)| *name)
        .unwrap_or(DEFAULT_SEVERITY)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CloudFunctionTransformer;

impl CloudFunctionTransformer {
    pub fn new() -> Self {
        Self
    }
}

impl Transformer for CloudFunctionTransformer {
    fn transform(&self, record: &LogRecord) -> String {
        // `err` stays under its own key, normalized by `to_json_map`
        let mut object = record.data.to_json_map();

        object.insert(
            "severity".to_string(),
            Value::String(cloud_severity(record.level).to_string()),
        );
        object.insert("time".to_string(), Value::String(to_iso8601(&record.time)));
        if let Some(msg) = &record.msg {
            object.insert("message".to_string(), Value::String(msg.clone()));
        }
        if let Some(ctx) = ctx_object(record, &[]) {
            object.insert("ctx".to_string(), ctx);
        }
        if record.level.meets_threshold(Severity::Error) {
            object.insert("@type".to_string(), Value::String(ERROR_EVENT_TYPE.to_string()));
        }

        to_json_line(object)
    }

    fn name(&self) -> &str {
        "cloud_function"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FieldValue, Fields};

    fn parse(line: &str) -> Value {
        serde_json::from_str(line).expect("line should be valid JSON")
    }

    #[test]
    fn test_severity_table() {
        assert_eq!(cloud_severity(Severity::Trace), "DEBUG");
        assert_eq!(cloud_severity(Severity::Warn), "WARNING");
        assert_eq!(cloud_severity(Severity::Fatal), "CRITICAL");
        assert_eq!(cloud_severity(Severity::Silent), DEFAULT_SEVERITY);
    }

    #[test]
    fn test_info_line_has_no_error_marker() {
        let record = LogRecord::new(Severity::Info)
            .with_msg("ready")
            .with_data(Fields::new().with_field("port", 8080));

        let parsed = parse(&CloudFunctionTransformer.transform(&record));
        assert_eq!(parsed["severity"], "INFO");
        assert_eq!(parsed["message"], "ready");
        assert_eq!(parsed["port"], 8080);
        assert!(parsed.get("@type").is_none());
        assert!(parsed.get("ctx").is_none());
    }

    #[test]
    fn test_data_message_kept_without_msg() {
        let record = LogRecord::new(Severity::Info)
            .with_data(Fields::new().with_field("message", "from data"));
        let parsed = parse(&CloudFunctionTransformer.transform(&record));
        assert_eq!(parsed["message"], "from data");

        let parsed = parse(&CloudFunctionTransformer.transform(&record.with_msg("from record")));
        assert_eq!(parsed["message"], "from record");
    }

    #[test]
    fn test_error_line_is_classified() {
        #[derive(Debug, thiserror::Error)]
        #[error("disk full")]
        struct DiskFull;

        let record = LogRecord::new(Severity::Error)
            .with_data(Fields::new().with_field("err", FieldValue::error(DiskFull)));

        let parsed = parse(&CloudFunctionTransformer.transform(&record));
        assert_eq!(parsed["severity"], "ERROR");
        assert_eq!(parsed["@type"], ERROR_EVENT_TYPE);
        assert_eq!(parsed["err"]["message"], "disk full");
        assert_eq!(parsed["err"]["type"], "DiskFull");
        assert!(!parsed["err"]["stack"].as_str().unwrap().is_empty());
    }
}
