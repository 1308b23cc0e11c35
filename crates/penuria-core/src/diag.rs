//! Diagnostic context.
//!
//! A mutable cursor describing what is being checked right now. The driver
//! writes it before each assertion so that failure messages name the exact
//! fault-injection iteration without every check threading that state
//! through by hand. One context per test process, reset at case start.

use parking_lot::Mutex;

/// Mutable "what is being checked" label for failure messages.
#[derive(Debug, Default)]
pub struct DiagContext {
    current: Mutex<Option<String>>,
}

impl DiagContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the current description.
    pub fn set(&self, description: impl Into<String>) {
        *self.current.lock() = Some(description.into());
    }

    /// Clears the description. Called at the start of each test case.
    pub fn reset(&self) {
        *self.current.lock() = None;
    }

    /// Returns the current description, if any.
    #[must_use]
    pub fn current(&self) -> Option<String> {
        self.current.lock().clone()
    }

    /// Prefixes `message` with the current description.
    #[must_use]
    pub fn describe(&self, message: &str) -> String {
        match self.current.lock().as_deref() {
            Some(context) => format!("{context}: {message}"),
            None => message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_context_passthrough() {
        let diag = DiagContext::new();
        assert_eq!(diag.describe("leak of 3 bytes"), "leak of 3 bytes");
        assert!(diag.current().is_none());
    }

    #[test]
    fn test_set_and_describe() {
        let diag = DiagContext::new();
        diag.set("allocation failure injected at call 2");
        assert_eq!(
            diag.describe("should return failure indicator"),
            "allocation failure injected at call 2: should return failure indicator"
        );
    }

    #[test]
    fn test_set_replaces() {
        let diag = DiagContext::new();
        diag.set("baseline run");
        diag.set("injection at call 0");
        assert_eq!(diag.current().as_deref(), Some("injection at call 0"));
    }

    #[test]
    fn test_reset_clears() {
        let diag = DiagContext::new();
        diag.set("baseline run");
        diag.reset();
        assert!(diag.current().is_none());
        assert_eq!(diag.describe("msg"), "msg");
    }
}
