//! Suite reporting.
//!
//! Two sinks: a human-readable progress line per test on stdout, and an
//! append-only log file collecting failing titles. The log is opened in
//! append mode per write so concurrent processes interleave whole lines
//! rather than corrupting each other.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use penuria_core::TestOutcome;

use crate::error::Result;

/// Append-only log of failing test titles, one per line.
#[derive(Debug, Clone)]
pub struct ErrorLog {
    path: PathBuf,
}

impl ErrorLog {
    /// Creates a log over the given path. The file is created lazily on
    /// the first append.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the log path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one failing title.
    ///
    /// # Errors
    /// Returns an error if the log cannot be opened or written.
    pub fn append(&self, title: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{title}")?;
        tracing::debug!(title, path = %self.path.display(), "failure logged");
        Ok(())
    }
}

/// Formats the one-line progress marker for an outcome.
#[must_use]
pub fn progress_line(outcome: &TestOutcome) -> String {
    let marker = if outcome.passed {
        "ok".to_string()
    } else if outcome.timed_out {
        "TIMEOUT".to_string()
    } else {
        match &outcome.message {
            Some(message) => format!("FAILED ({message})"),
            None => "FAILED".to_string(),
        }
    };
    format!("{:<24}: {marker}", outcome.title)
}

/// Prints the progress line for an outcome to stdout.
pub fn print_progress(outcome: &TestOutcome) {
    println!("{}", progress_line(outcome));
}
