//! Error types for penuria-core.
//!
//! All harness failures are explicit; the harness itself must never crash,
//! whatever the candidate under test does.

/// Result type alias for harness operations.
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Error type for harness infrastructure failures.
///
/// Candidate-level findings (leaks, wrong failure signals, double frees)
/// are not errors — they are data carried by reports. This enum covers the
/// harness failing to do its own job.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// Configuration error during harness setup.
    #[error("configuration error: {0}")]
    Config(String),

    /// A test case title was not found in the registered suite.
    #[error("unknown test case: {0}")]
    UnknownCase(String),

    /// Invalid state for operation.
    #[error("invalid state: {0}")]
    State(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error (should not occur in production).
    #[error("internal error: {0}")]
    Internal(String),
}

impl HarnessError {
    /// Creates a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an unknown-case error.
    #[must_use]
    pub fn unknown_case(title: impl Into<String>) -> Self {
        Self::UnknownCase(title.into())
    }

    /// Creates an invalid-state error.
    #[must_use]
    pub fn state(msg: impl Into<String>) -> Self {
        Self::State(msg.into())
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns true if this error is recoverable (the suite can continue
    /// with the next test case).
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::UnknownCase(_) | Self::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HarnessError::config("poll interval exceeds timeout");
        assert_eq!(
            err.to_string(),
            "configuration error: poll interval exceeds timeout"
        );
    }

    #[test]
    fn test_unknown_case_display() {
        let err = HarnessError::unknown_case("strdup_basic");
        assert!(err.to_string().contains("strdup_basic"));
    }

    #[test]
    fn test_error_recoverable() {
        assert!(HarnessError::unknown_case("missing").is_recoverable());
        assert!(!HarnessError::config("bad timeout").is_recoverable());
        assert!(!HarnessError::internal("oops").is_recoverable());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: HarnessError = io_err.into();
        assert!(err.to_string().contains("I/O error"));
        assert!(err.is_recoverable());
    }
}
