//! Path-based redaction stage
//!
//! Paths are dot-separated keys into `data`. A `*` segment matches every key
//! of a map (or every element of a sequence); a numeric segment indexes a
//! sequence. `"user.password"`, `"*.jwt"`, `"items.0.card"`.

use crate::core::error::panic_message;
use crate::core::{FieldValue, Fields, LogRecord, LoggerError, Processor, Result};
use async_trait::async_trait;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

pub const DEFAULT_CENSOR: &str = "🧱🧱🧱🧱";

/// Diagnostic `data` key holding the failure reason
pub const REDACTION_ERROR_KEY: &str = "redactionError";

/// Diagnostic `data` key listing the original top-level keys
pub const REDACTION_KEYS_KEY: &str = "keys";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Wildcard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct RedactPath {
    raw: String,
    segments: Vec<Segment>,
}

impl RedactPath {
    fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(LoggerError::config("redact", "empty redaction path"));
        }

        let segments = raw
            .split('.')
            .map(|segment| match segment {
                "" => Err(LoggerError::config(
                    "redact",
                    format!("empty segment in redaction path '{}'", raw),
                )),
                "*" => Ok(Segment::Wildcard),
                key => Ok(Segment::Key(key.to_string())),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }
}

/// Replaces values at configured paths in `data` with a censor string
///
/// The caller's maps are never touched: the stage edits its own copy. If
/// the copy cannot be edited (a frozen map on the path) or redaction panics,
/// `data` is replaced by a diagnostic holding only the failure reason and
/// the original top-level key names, so no value can leak.
#[derive(Debug, Clone)]
pub struct Redactor {
    paths: Vec<RedactPath>,
    censor: String,
}

impl Redactor {
    /// # Errors
    ///
    /// Returns [`LoggerError::InvalidConfiguration`] for empty paths or
    /// empty path segments.
    pub fn new<I, S>(paths: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let paths = paths
            .into_iter()
            .map(|p| RedactPath::parse(p.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            paths,
            censor: DEFAULT_CENSOR.to_string(),
        })
    }

    #[must_use]
    pub fn with_censor(mut self, censor: impl Into<String>) -> Self {
        self.censor = censor.into();
        self
    }

    pub fn censor(&self) -> &str {
        &self.censor
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(|p| p.raw.as_str())
    }

    /// Redact a copy of `data`
    pub fn redact(&self, data: &Fields) -> Result<Fields> {
        let mut copy = data.clone();
        for path in &self.paths {
            redact_fields(&mut copy, &path.segments, &self.censor)
                .map_err(|e| LoggerError::redaction(&path.raw, e.to_string()))?;
        }
        Ok(copy)
    }

    fn diagnostic(data: &Fields, reason: String) -> Fields {
        let keys: Vec<FieldValue> = data.keys().map(|k| FieldValue::from(k.as_str())).collect();
        Fields::new()
            .with_field(REDACTION_ERROR_KEY, reason)
            .with_field(REDACTION_KEYS_KEY, FieldValue::Array(keys))
    }
}

fn redact_fields(fields: &mut Fields, path: &[Segment], censor: &str) -> Result<()> {
    let Some((head, rest)) = path.split_first() else {
        return Ok(());
    };

    let keys: Vec<String> = match head {
        Segment::Wildcard => fields.keys().cloned().collect(),
        Segment::Key(key) if fields.contains_key(key) => vec![key.clone()],
        Segment::Key(_) => Vec::new(),
    };

    for key in keys {
        if rest.is_empty() {
            fields.insert(key, censor)?;
        } else if let Some(value) = fields.value_mut(&key) {
            redact_value(value, rest, censor)?;
        }
    }
    Ok(())
}

fn redact_value(value: &mut FieldValue, path: &[Segment], censor: &str) -> Result<()> {
    match value {
        FieldValue::Map(fields) => redact_fields(fields, path, censor),
        FieldValue::Array(items) => redact_items(items, path, censor),
        _ => Ok(()),
    }
}

fn redact_items(items: &mut [FieldValue], path: &[Segment], censor: &str) -> Result<()> {
    let Some((head, rest)) = path.split_first() else {
        return Ok(());
    };

    let indices: Vec<usize> = match head {
        Segment::Wildcard => (0..items.len()).collect(),
        Segment::Key(key) => key
            .parse::<usize>()
            .ok()
            .filter(|i| *i < items.len())
            .into_iter()
            .collect(),
    };

    for i in indices {
        if rest.is_empty() {
            items[i] = FieldValue::from(censor);
        } else {
            redact_value(&mut items[i], rest, censor)?;
        }
    }
    Ok(())
}

#[async_trait]
impl Processor for Redactor {
    async fn process(&self, mut record: LogRecord) -> Result<LogRecord> {
        if self.paths.is_empty() || record.data.is_empty() {
            return Ok(record);
        }

        let attempt = std::panic::catch_unwind(AssertUnwindSafe(|| self.redact(&record.data)));
        let data = match attempt {
            Ok(Ok(redacted)) => redacted,
            Ok(Err(e)) => Self::diagnostic(&record.data, e.to_string()),
            Err(panic_info) => Self::diagnostic(&record.data, panic_message(panic_info.as_ref())),
        };

        record.data = Arc::new(data);
        Ok(record)
    }

    fn name(&self) -> &str {
        "redact"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Severity;

    fn text<'a>(fields: &'a Fields, key: &str) -> Option<&'a str> {
        fields.get(key).and_then(FieldValue::as_str)
    }

    #[tokio::test]
    async fn test_top_level_path() {
        let redactor = Redactor::new(["secret"]).unwrap();
        let record = LogRecord::new(Severity::Info)
            .with_data(Fields::new().with_field("secret", "trustno1").with_field("user", "bob"));
        let original = record.clone();

        let out = redactor.process(record).await.unwrap();

        assert_eq!(text(&out.data, "secret"), Some(DEFAULT_CENSOR));
        assert_eq!(text(&out.data, "user"), Some("bob"));
        assert_eq!(text(&original.data, "secret"), Some("trustno1"));
    }

    #[tokio::test]
    async fn test_wildcard_and_nested() {
        let redactor = Redactor::new(["*.jwt", "card.number"]).unwrap().with_censor("[REDACTED]");
        let data = Fields::new()
            .with_field("alice", Fields::new().with_field("jwt", "a.b.c").with_field("id", 1))
            .with_field("bob", Fields::new().with_field("jwt", "d.e.f"))
            .with_field("card", Fields::new().with_field("number", "4111"));

        let out = redactor.redact(&data).unwrap();

        let alice = out.get("alice").and_then(FieldValue::as_map).unwrap();
        assert_eq!(text(alice, "jwt"), Some("[REDACTED]"));
        assert_eq!(alice.get("id"), Some(&FieldValue::Int(1)));
        let bob = out.get("bob").and_then(FieldValue::as_map).unwrap();
        assert_eq!(text(bob, "jwt"), Some("[REDACTED]"));
        let card = out.get("card").and_then(FieldValue::as_map).unwrap();
        assert_eq!(text(card, "number"), Some("[REDACTED]"));
    }

    #[tokio::test]
    async fn test_sequence_indices() {
        let redactor = Redactor::new(["tokens.1", "users.*.password"]).unwrap();
        let data = Fields::new()
            .with_field("tokens", vec!["keep", "hide"])
            .with_field(
                "users",
                vec![
                    FieldValue::Map(Fields::new().with_field("password", "p1")),
                    FieldValue::Map(Fields::new().with_field("password", "p2")),
                ],
            );

        let out = redactor.redact(&data).unwrap();
        assert_eq!(
            out.get("tokens"),
            Some(&FieldValue::Array(vec!["keep".into(), DEFAULT_CENSOR.into()]))
        );
        let rendered = serde_json::Value::Object(out.to_json_map()).to_string();
        assert!(!rendered.contains("p1"));
        assert!(!rendered.contains("p2"));
    }

    #[tokio::test]
    async fn test_missing_paths_ignored() {
        let redactor = Redactor::new(["nope", "a.b.c"]).unwrap();
        let data = Fields::new().with_field("a", 1);
        assert_eq!(redactor.redact(&data).unwrap(), data);
    }

    #[tokio::test]
    async fn test_frozen_target_yields_diagnostic() {
        let redactor = Redactor::new(["*.jwt"]).unwrap();
        let data = Fields::new()
            .with_field("session", Fields::new().with_field("jwt", "secret-token").freeze())
            .with_field("user", "alice");
        let record = LogRecord::new(Severity::Info).with_data(data);

        let out = redactor.process(record).await.unwrap();

        assert!(text(&out.data, REDACTION_ERROR_KEY).is_some());
        assert_eq!(
            out.data.get(REDACTION_KEYS_KEY),
            Some(&FieldValue::Array(vec!["session".into(), "user".into()]))
        );
        assert_eq!(out.data.len(), 2);
        let rendered = serde_json::Value::Object(out.data.to_json_map()).to_string();
        assert!(!rendered.contains("secret-token"));
        assert!(!rendered.contains("alice"));
    }

    #[test]
    fn test_invalid_paths_rejected() {
        assert!(matches!(
            Redactor::new([""]),
            Err(LoggerError::InvalidConfiguration { .. })
        ));
        assert!(Redactor::new(["a..b"]).is_err());
    }
}
