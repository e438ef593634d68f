//! Built-in processor stages

pub mod caller;
pub mod context_injector;
pub mod error_normalizer;
pub mod error_reporter;
pub mod redact;

pub use caller::{CallerAnnotator, CALLER_KEY, UNKNOWN_CALLER};
pub use context_injector::{ContextInjector, CONTEXT_ID_KEY};
pub use error_normalizer::ErrorNormalizer;
pub use error_reporter::{ErrorReportingBackend, ErrorReportingProcessor};
pub use redact::{Redactor, DEFAULT_CENSOR, REDACTION_ERROR_KEY, REDACTION_KEYS_KEY};
