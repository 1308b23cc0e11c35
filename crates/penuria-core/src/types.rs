//! Case lifecycle types.
//!
//! A supervised test case follows a strict state machine; outcomes are the
//! only thing that crosses the process boundary besides the exit status.

use serde::{Deserialize, Serialize};

/// Unique identifier for one supervised test case run.
///
/// Titles may collide across suites; the id never does, so log lines and
/// outcomes stay attributable even when a case is re-registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CaseId(uuid::Uuid);

impl CaseId {
    /// Creates a new random case ID.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Creates a case ID from a UUID.
    #[must_use]
    pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for CaseId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CaseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a supervised child process.
///
/// ```text
/// Spawned → Running → {Completed, TimedOut, Crashed}
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaseState {
    /// Child process created, not yet observed running.
    Spawned,
    /// Child process running, parent polling for completion.
    Running,
    /// Child exited on its own; exit code carries the verdict.
    Completed,
    /// Deadline expired (parent kill or in-child alarm).
    TimedOut,
    /// Child died to a signal other than the alarm.
    Crashed,
}

impl CaseState {
    /// Returns true if the case is in a terminal state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::TimedOut | Self::Crashed)
    }

    /// Returns true if the child may still be alive.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        matches!(self, Self::Spawned | Self::Running)
    }
}

/// How a child process exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildExit {
    /// Exit code, if the child exited normally.
    pub code: Option<i32>,
    /// Terminating signal number, if the child was killed by one.
    pub signal: Option<i32>,
}

impl ChildExit {
    /// An exit with the given code.
    #[must_use]
    pub const fn with_code(code: i32) -> Self {
        Self {
            code: Some(code),
            signal: None,
        }
    }

    /// A death by the given signal.
    #[must_use]
    pub const fn with_signal(signal: i32) -> Self {
        Self {
            code: None,
            signal: Some(signal),
        }
    }

    /// Returns true if the child exited normally with status zero.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.code, Some(0))
    }
}

/// Result of one supervised test case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestOutcome {
    /// Run identity.
    pub id: CaseId,
    /// Test case title.
    pub title: String,
    /// Whether the case passed.
    pub passed: bool,
    /// Diagnostic message for failing cases.
    pub message: Option<String>,
    /// Whether the failure was a deadline expiry rather than an assertion.
    pub timed_out: bool,
}

impl TestOutcome {
    /// Creates a passing outcome.
    #[must_use]
    pub fn pass(title: impl Into<String>) -> Self {
        Self {
            id: CaseId::new(),
            title: title.into(),
            passed: true,
            message: None,
            timed_out: false,
        }
    }

    /// Creates a failing outcome with a diagnostic message.
    #[must_use]
    pub fn fail(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: CaseId::new(),
            title: title.into(),
            passed: false,
            message: Some(message.into()),
            timed_out: false,
        }
    }

    /// Creates a timeout outcome.
    #[must_use]
    pub fn timeout(title: impl Into<String>) -> Self {
        Self {
            id: CaseId::new(),
            title: title.into(),
            passed: false,
            message: Some("timed out".to_string()),
            timed_out: true,
        }
    }
}
