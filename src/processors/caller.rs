//! Caller-location annotation stage

use crate::core::{LogRecord, Processor, Result};
use async_trait::async_trait;

/// `ctx` key for the call-site location
pub const CALLER_KEY: &str = "caller";

/// Written when no application frame is known
pub const UNKNOWN_CALLER: &str = "";

/// Attaches `file:line` of the application call-site as `ctx.caller`
///
/// The location is captured at emit time through `#[track_caller]`.
/// Locations whose file path (with `/` separators) contains one of the skip
/// fragments belong to logging code and are treated as unknown. By default
/// those are this crate's published sources and the standard library.
#[derive(Debug, Clone)]
pub struct CallerAnnotator {
    skip: Vec<String>,
}

impl CallerAnnotator {
    pub fn new() -> Self {
        Self {
            skip: vec![
                concat!(
                    "/",
                    env!("CARGO_PKG_NAME"),
                    "-",
                    env!("CARGO_PKG_VERSION"),
                    "/src/"
                )
                .to_string(),
                "/rustc/".to_string(),
            ],
        }
    }

    /// Treat locations in files matching `fragment` as library frames
    #[must_use]
    pub fn with_skip(mut self, fragment: impl Into<String>) -> Self {
        self.skip.push(fragment.into());
        self
    }

    fn is_library_frame(&self, file: &str) -> bool {
        let file = file.replace('\\', "/");
        self.skip.iter().any(|fragment| file.contains(fragment.as_str()))
    }
}

impl Default for CallerAnnotator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Processor for CallerAnnotator {
    async fn process(&self, mut record: LogRecord) -> Result<LogRecord> {
        if record.ctx.contains_key(CALLER_KEY) {
            return Ok(record);
        }

        let caller = record
            .location
            .filter(|location| !self.is_library_frame(location.file()))
            .map(|location| format!("{}:{}", location.file(), location.line()))
            .unwrap_or_else(|| UNKNOWN_CALLER.to_string());

        record.set_ctx(CALLER_KEY, caller)?;
        Ok(record)
    }

    fn name(&self) -> &str {
        "caller"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FieldValue, Fields, Severity};
    use std::panic::Location;

    fn caller_of(record: &LogRecord) -> Option<&str> {
        record.ctx.get(CALLER_KEY).and_then(FieldValue::as_str)
    }

    #[tokio::test]
    async fn test_location_attached() {
        let here = Location::caller();
        let record = LogRecord::new(Severity::Info).with_location(here);

        let out = CallerAnnotator::new().process(record).await.unwrap();
        assert_eq!(caller_of(&out), Some(format!("{}:{}", here.file(), here.line()).as_str()));
    }

    #[tokio::test]
    async fn test_missing_location_gets_sentinel() {
        let out = CallerAnnotator::new()
            .process(LogRecord::new(Severity::Info))
            .await
            .unwrap();
        assert_eq!(caller_of(&out), Some(UNKNOWN_CALLER));
    }

    #[tokio::test]
    async fn test_library_frames_skipped() {
        let record = LogRecord::new(Severity::Info).with_location(Location::caller());

        let out = CallerAnnotator::new()
            .with_skip("processors/caller.rs")
            .process(record)
            .await
            .unwrap();
        assert_eq!(caller_of(&out), Some(UNKNOWN_CALLER));
    }

    #[test]
    fn test_only_published_crate_sources_are_library_frames() {
        let annotator = CallerAnnotator::new();
        let installed = format!(
            "/home/dev/.cargo/registry/src/index.crates.io-6f17d22bba15001f/{}-{}/src/core/logger.rs",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        );
        let checkout = format!("/home/dev/{}-main/src/app.rs", env!("CARGO_PKG_NAME"));
        let windows = format!(
            "C:\\Users\\dev\\.cargo\\registry\\src\\x\\{}-{}\\src\\lib.rs",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        );

        assert!(annotator.is_library_frame(&installed));
        assert!(annotator.is_library_frame(&windows));
        assert!(annotator.is_library_frame("/rustc/abc123/library/core/src/ops.rs"));
        assert!(!annotator.is_library_frame(&checkout));
        assert!(!annotator.is_library_frame("src/main.rs"));
    }

    #[tokio::test]
    async fn test_explicit_caller_kept() {
        let record = LogRecord::new(Severity::Info)
            .with_location(Location::caller())
            .with_ctx(Fields::new().with_field(CALLER_KEY, "handler.rs:1"));

        let out = CallerAnnotator::new().process(record).await.unwrap();
        assert_eq!(caller_of(&out), Some("handler.rs:1"));
    }
}
