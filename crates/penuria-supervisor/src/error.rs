//! Supervisor error types.

/// Result type alias for supervisor operations.
pub type Result<T> = std::result::Result<T, SupervisorError>;

/// Errors from the process-supervision side of the harness.
#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    /// Failed to spawn the child process.
    #[error("spawn failed: {0}")]
    Spawn(String),

    /// Failed to poll the child's status.
    #[error("poll failed: {0}")]
    Poll(String),

    /// Failed to terminate the child.
    #[error("kill failed: {0}")]
    Kill(String),

    /// Could not resolve the executable to re-run for child mode.
    #[error("cannot locate harness executable: {0}")]
    Executable(String),

    /// Core harness error.
    #[error("harness error: {0}")]
    Core(#[from] penuria_core::HarnessError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SupervisorError {
    /// Creates a spawn error.
    #[must_use]
    pub fn spawn(msg: impl Into<String>) -> Self {
        Self::Spawn(msg.into())
    }

    /// Creates a poll error.
    #[must_use]
    pub fn poll(msg: impl Into<String>) -> Self {
        Self::Poll(msg.into())
    }

    /// Creates a kill error.
    #[must_use]
    pub fn kill(msg: impl Into<String>) -> Self {
        Self::Kill(msg.into())
    }
}
