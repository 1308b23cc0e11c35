//! Leak verification.
//!
//! After a run, everything the registry still holds live must be accounted
//! for by an explicit ownership transfer to the caller. Anything else is a
//! leak. The checker also folds in the registry's recorded violations
//! (double frees, unknown-handle releases) so one report carries the whole
//! memory-safety verdict for a run.

use serde::{Deserialize, Serialize};

use penuria_core::SizeCheckMode;

use crate::registry::{AllocHandle, AllocMock, Violation};

/// One allocation that outlived its run without being declared returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeakedAllocation {
    /// Sequence index of the leaked allocation (0-indexed).
    pub index: usize,
    /// Size in bytes.
    pub size: usize,
}

/// Everything wrong with a run, memory-wise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeakReport {
    /// Allocations still live at run end, net of declared returns.
    pub leaks: Vec<LeakedAllocation>,
    /// Double frees and unknown-handle releases observed during the run.
    pub violations: Vec<Violation>,
}

impl LeakReport {
    /// Returns true if the run was clean.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.leaks.is_empty() && self.violations.is_empty()
    }
}

impl std::error::Error for LeakReport {}

impl std::fmt::Display for LeakReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for leak in &self.leaks {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "leaked alloc#{} ({} bytes)", leak.index, leak.size)?;
            first = false;
        }
        for violation in &self.violations {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{violation}")?;
            first = false;
        }
        if first {
            write!(f, "no leaks")?;
        }
        Ok(())
    }
}

/// Size-tracking mismatch found by [`LeakChecker::check_size`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SizeMismatch {
    /// The handle does not belong to the current run.
    #[error("size check on unknown handle")]
    UnknownHandle,
    /// The tracked size does not satisfy the expected size.
    #[error("allocated {actual} bytes, expected {expected}")]
    Mismatch {
        /// Size the registry tracked.
        actual: usize,
        /// Size the test expected.
        expected: usize,
    },
}

/// Verifies a run against the registry.
#[derive(Debug, Clone, Copy)]
pub struct LeakChecker {
    mode: SizeCheckMode,
}

impl LeakChecker {
    /// Creates a checker with the given size-check strictness.
    #[must_use]
    pub const fn new(mode: SizeCheckMode) -> Self {
        Self { mode }
    }

    /// Returns the configured strictness.
    #[must_use]
    pub const fn mode(&self) -> SizeCheckMode {
        self.mode
    }

    /// Checks that nothing is live except the declared returns.
    ///
    /// `returned` lists handles the test body handed to the caller — those
    /// are ownership transfers, not leaks. Drains the registry's recorded
    /// violations into the report.
    ///
    /// # Errors
    /// Returns the [`LeakReport`] when any leak or violation was found.
    pub fn check(
        &self,
        mock: &AllocMock,
        returned: &[AllocHandle],
    ) -> std::result::Result<(), LeakReport> {
        let leaks: Vec<LeakedAllocation> = mock
            .outstanding()
            .into_iter()
            .filter(|h| !returned.contains(h))
            .filter_map(|h| {
                mock.query_size(h).map(|size| LeakedAllocation {
                    index: h.index(),
                    size,
                })
            })
            .collect();
        let violations = mock.take_violations();

        let report = LeakReport { leaks, violations };
        if report.is_empty() {
            Ok(())
        } else {
            tracing::warn!(
                leaks = report.leaks.len(),
                violations = report.violations.len(),
                "leak check failed"
            );
            Err(report)
        }
    }

    /// Checks that the tracked size of `handle` satisfies `expected` under
    /// the configured strictness.
    ///
    /// # Errors
    /// Returns a [`SizeMismatch`] describing the failure.
    pub fn check_size(
        &self,
        mock: &AllocMock,
        handle: AllocHandle,
        expected: usize,
    ) -> std::result::Result<(), SizeMismatch> {
        let actual = mock.query_size(handle).ok_or(SizeMismatch::UnknownHandle)?;
        if self.mode.accepts(actual, expected) {
            Ok(())
        } else {
            Err(SizeMismatch::Mismatch { actual, expected })
        }
    }
}

impl Default for LeakChecker {
    fn default() -> Self {
        Self::new(SizeCheckMode::default())
    }
}
