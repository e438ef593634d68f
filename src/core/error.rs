//! Error types for the logging pipeline

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Logger already ended
    #[error("Logger already stopped")]
    LoggerStopped,

    /// Sink no longer accepts writes
    #[error("Sink '{destination}' is closed")]
    SinkClosed { destination: String },

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// File lock error
    #[error("Failed to acquire exclusive lock on '{path}'")]
    FileLockError { path: String },

    /// Destination writer error (generic)
    #[error("Writer error: {0}")]
    WriterError(String),

    /// A processor stage returned an error
    #[error("Processor '{stage}' failed: {message}")]
    StageFailed { stage: String, message: String },

    /// A processor stage panicked
    #[error("Processor '{stage}' panicked: {message}")]
    StagePanicked { stage: String, message: String },

    /// Attempt to mutate a frozen field map
    #[error("Cannot modify frozen field map (key '{key}')")]
    Frozen { key: String },

    /// Redaction could not be applied
    #[error("Redaction of '{path}' failed: {message}")]
    Redaction { path: String, message: String },

    /// Worker channel send error
    #[error("Failed to send command to pipeline worker")]
    ChannelSendError,

    /// Worker channel receive error
    #[error("Pipeline worker dropped the acknowledgement channel")]
    ChannelReceiveError,

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a file lock error
    pub fn file_lock(path: impl Into<String>) -> Self {
        LoggerError::FileLockError { path: path.into() }
    }

    /// Create a sink closed error
    pub fn sink_closed(destination: impl Into<String>) -> Self {
        LoggerError::SinkClosed {
            destination: destination.into(),
        }
    }

    /// Create a stage failure error
    pub fn stage(stage: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::StageFailed {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Create a stage panic error
    pub fn stage_panicked(stage: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::StagePanicked {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Create a frozen map error
    pub fn frozen(key: impl Into<String>) -> Self {
        LoggerError::Frozen { key: key.into() }
    }

    /// Create a redaction error
    pub fn redaction(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::Redaction {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a writer error (generic)
    pub fn writer<S: Into<String>>(msg: S) -> Self {
        LoggerError::WriterError(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }
}

/// Extract a readable message from a caught panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = LoggerError::stage("redact", "boom");
        assert!(matches!(err, LoggerError::StageFailed { .. }));

        let err = LoggerError::config("Sink", "capacity must be positive");
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));

        let err = LoggerError::file_lock("/var/log/app.log");
        assert!(matches!(err, LoggerError::FileLockError { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = LoggerError::stage_panicked("caller", "index out of bounds");
        assert_eq!(
            err.to_string(),
            "Processor 'caller' panicked: index out of bounds"
        );

        let err = LoggerError::frozen("jwt");
        assert_eq!(
            err.to_string(),
            "Cannot modify frozen field map (key 'jwt')"
        );

        let err = LoggerError::sink_closed("memory");
        assert_eq!(err.to_string(), "Sink 'memory' is closed");
    }

    #[test]
    fn test_io_operation_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = LoggerError::io_operation("closing destination", "cannot sync file", io_err);

        assert!(matches!(err, LoggerError::IoOperation { .. }));
        assert!(err.to_string().contains("closing destination"));
        assert!(err.to_string().contains("cannot sync file"));
    }

    #[test]
    fn test_panic_message_extraction() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("static str");
        assert_eq!(panic_message(payload.as_ref()), "static str");

        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");

        let payload: Box<dyn std::any::Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(payload.as_ref()), "Unknown panic");
    }
}
