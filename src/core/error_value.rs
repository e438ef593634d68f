//! Error payloads carried inside records
//!
//! - `RawError`: a native Rust error captured at the call-site, with its
//!   backtrace. Opaque until normalized.
//! - `NormalizedError`: the canonical `{message, type, stack}` shape every
//!   transformer renders.

use std::backtrace::Backtrace;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

/// Canonical error shape rendered by every transformer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedError {
    pub message: String,
    /// Type (class) name of the original error
    pub type_name: String,
    /// Ordered frame strings, headline first
    pub stack: Vec<String>,
}

impl NormalizedError {
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        let type_name = type_name.into();
        let message = message.into();
        Self {
            stack: vec![format!("{}: {}", type_name, message)],
            message,
            type_name,
        }
    }

    #[must_use]
    pub fn with_stack(mut self, stack: Vec<String>) -> Self {
        self.stack = stack;
        self
    }

    /// Stack frames joined into a single newline-separated string
    pub fn stack_string(&self) -> String {
        self.stack.join("\n")
    }

    /// `{ "message", "type", "stack" }` as rendered on the wire
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "message": self.message,
            "type": self.type_name,
            "stack": self.stack_string(),
        })
    }
}

impl fmt::Display for NormalizedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.type_name, self.message)
    }
}

/// Native error captured at the call-site
#[derive(Clone)]
pub struct RawError {
    error: Arc<dyn StdError + Send + Sync>,
    type_name: String,
    backtrace: Arc<Backtrace>,
}

impl RawError {
    pub fn new<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            error: Arc::new(error),
            type_name: short_type_name(std::any::type_name::<E>()),
            backtrace: Arc::new(Backtrace::force_capture()),
        }
    }

    /// Wrap an already type-erased error; its type name is reported as `Error`
    pub fn from_boxed(error: Box<dyn StdError + Send + Sync>) -> Self {
        Self {
            error: Arc::from(error),
            type_name: "Error".to_string(),
            backtrace: Arc::new(Backtrace::force_capture()),
        }
    }

    pub fn message(&self) -> String {
        self.error.to_string()
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn inner(&self) -> &(dyn StdError + Send + Sync) {
        self.error.as_ref()
    }

    /// Convert into the canonical shape
    ///
    /// The stack starts with a `Type: message` headline, followed by the
    /// `source()` chain and the captured backtrace frames, so it is never
    /// empty even when symbols are unavailable.
    pub fn normalize(&self) -> NormalizedError {
        let message = self.message();
        let mut stack = vec![format!("{}: {}", self.type_name, message)];

        let mut cause = self.error.source();
        while let Some(err) = cause {
            stack.push(format!("Caused by: {}", err));
            cause = err.source();
        }

        stack.extend(
            self.backtrace
                .to_string()
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(String::from),
        );

        NormalizedError {
            message,
            type_name: self.type_name.clone(),
            stack,
        }
    }
}

impl PartialEq for RawError {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.error, &other.error)
    }
}

impl fmt::Debug for RawError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawError")
            .field("type_name", &self.type_name)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

/// `my_crate::errors::Timeout<u8>` -> `Timeout`
fn short_type_name(full: &str) -> String {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("{0}")]
    struct Boom(String);

    #[derive(Debug, thiserror::Error)]
    #[error("request failed")]
    struct RequestFailed {
        #[source]
        source: Boom,
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("a::b::Boom"), "Boom");
        assert_eq!(short_type_name("Boom"), "Boom");
        assert_eq!(short_type_name("a::Wrapper<b::Inner>"), "Wrapper");
    }

    #[test]
    fn test_normalize_native_error() {
        let raw = RawError::new(Boom("boom".into()));
        let normalized = raw.normalize();

        assert_eq!(normalized.message, "boom");
        assert_eq!(normalized.type_name, "Boom");
        assert_eq!(normalized.stack[0], "Boom: boom");
    }

    #[test]
    fn test_normalize_includes_source_chain() {
        let raw = RawError::new(RequestFailed {
            source: Boom("socket reset".into()),
        });
        let normalized = raw.normalize();

        assert_eq!(normalized.type_name, "RequestFailed");
        assert!(normalized
            .stack
            .iter()
            .any(|frame| frame == "Caused by: socket reset"));
    }

    #[test]
    fn test_boxed_error_type_name() {
        let boxed: Box<dyn StdError + Send + Sync> = "plain failure".into();
        let raw = RawError::from_boxed(boxed);
        assert_eq!(raw.type_name(), "Error");
        assert_eq!(raw.normalize().message, "plain failure");
    }

    #[test]
    fn test_json_shape() {
        let value = NormalizedError::new("Timeout", "took too long").to_json_value();
        assert_eq!(value["message"], "took too long");
        assert_eq!(value["type"], "Timeout");
        assert_eq!(value["stack"], "Timeout: took too long");
    }
}
