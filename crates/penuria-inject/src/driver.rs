//! Fault-injection driver.
//!
//! Re-running the exact candidate code path once per allocation site is the
//! only way to exhaustively prove allocation-failure safety without static
//! analysis: `O(n)` re-execution buys deterministic fault coverage, with
//! `n` bounded by allocations-per-call.
//!
//! The driver performs one baseline run to learn `n`, then `n` reruns with
//! a different allocation call forced to fail each time, checking after
//! every rerun that the candidate signalled failure and freed all partial
//! work.

use serde::{Deserialize, Serialize};

use penuria_alloc::{AllocHandle, AllocMock, LeakChecker};
use penuria_core::{DiagContext, HarnessConfig};

/// What one execution of a test body reported back.
///
/// Bodies declare which handles were transferred to the caller (and are
/// therefore not leaks) and whether the candidate signalled failure. Extra
/// body-level assertion messages ride along untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunReport {
    /// Handles the candidate handed to its caller.
    pub returned: Vec<AllocHandle>,
    /// Whether the candidate returned its documented failure signal.
    pub failed: bool,
    /// Assertion failures raised by the body itself.
    pub errors: Vec<String>,
}

impl RunReport {
    /// A successful run that transferred no allocations.
    #[must_use]
    pub fn success() -> Self {
        Self::default()
    }

    /// A successful run returning one allocation to the caller.
    #[must_use]
    pub fn returning(handle: AllocHandle) -> Self {
        Self {
            returned: vec![handle],
            ..Self::default()
        }
    }

    /// A run where the candidate signalled failure.
    #[must_use]
    pub fn failure() -> Self {
        Self {
            failed: true,
            ..Self::default()
        }
    }

    /// Appends a body-level assertion failure.
    #[must_use]
    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.errors.push(message.into());
        self
    }
}

/// Aggregated verdict for one test case across all its executions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaseReport {
    /// Number of body executions performed (baseline + injected reruns).
    pub executions: usize,
    /// Allocation calls observed on the baseline run.
    pub baseline_allocations: usize,
    /// Every failure found, already prefixed with its iteration context.
    pub failures: Vec<String>,
}

impl CaseReport {
    /// Returns true if every execution was clean.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }

    /// Joins all failures into one diagnostic message.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        if self.failures.is_empty() {
            None
        } else {
            Some(self.failures.join("; "))
        }
    }
}

/// Drives a test body through its baseline and injected executions.
pub struct FaultDriver<'a> {
    mock: &'a AllocMock,
    diag: &'a DiagContext,
    checker: LeakChecker,
    injection_enabled: bool,
}

impl<'a> FaultDriver<'a> {
    /// Creates a driver over the given registry and diagnostic context.
    #[must_use]
    pub fn new(mock: &'a AllocMock, diag: &'a DiagContext, config: &HarnessConfig) -> Self {
        Self {
            mock,
            diag,
            checker: LeakChecker::new(config.size_check),
            injection_enabled: config.fault_injection,
        }
    }

    /// Runs the body once (baseline) plus once per observed allocation.
    ///
    /// Any single failing iteration fails the whole case; the iteration is
    /// named in the diagnostic. With fault injection disabled only the
    /// baseline executes.
    pub fn drive<F>(&self, body: F) -> CaseReport
    where
        F: Fn(&AllocMock) -> RunReport,
    {
        let mut report = CaseReport::default();
        self.diag.reset();

        // Baseline run: learn how many allocation calls the body makes.
        self.diag.set("baseline run");
        self.mock.reset();
        let baseline = body(self.mock);
        let n = self.mock.count();
        report.executions += 1;
        report.baseline_allocations = n;

        for error in &baseline.errors {
            report.failures.push(self.diag.describe(error));
        }
        if baseline.failed {
            report
                .failures
                .push(self.diag.describe("candidate reported failure"));
        }
        if let Err(leaks) = self.checker.check(self.mock, &baseline.returned) {
            report.failures.push(self.diag.describe(&leaks.to_string()));
        }

        if !self.injection_enabled {
            tracing::debug!("fault injection disabled, baseline only");
            return report;
        }

        // One rerun per allocation call, each forcing a different one to
        // fail. The candidate must free prior partial work and signal
        // failure.
        for k in 0..n {
            self.diag
                .set(format!("allocation failure injected at call {k}"));
            self.mock.reset();
            self.mock.set_failure_point(k);
            let injected = body(self.mock);
            report.executions += 1;

            for error in &injected.errors {
                report.failures.push(self.diag.describe(error));
            }
            if !injected.failed {
                report
                    .failures
                    .push(self.diag.describe("should return failure indicator"));
            }
            if let Err(leaks) = self.checker.check(self.mock, &injected.returned) {
                report.failures.push(self.diag.describe(&leaks.to_string()));
            }
        }

        tracing::debug!(
            executions = report.executions,
            failures = report.failures.len(),
            "case driven"
        );
        report
    }
}
