//! Test suite runner.
//!
//! A suite is a plain table of `{title, body}` entries. The same binary
//! plays both roles: with [`CHILD_CASE_ENV`] set it executes exactly that
//! one case in-process (child mode) and exits with the verdict; otherwise
//! it supervises one child per case sequentially via self-exec.
//!
//! Child mode arms a self-alarm before running the body so a hang dies
//! even if the parent's poll loop is delayed; the parent maps that alarm
//! death to a timeout outcome.

use std::process::ExitCode;

use penuria_alloc::AllocMock;
use penuria_core::{DiagContext, HarnessConfig, TestOutcome};
use penuria_inject::{FaultDriver, RunReport};

use crate::error::{Result, SupervisorError};
use crate::launcher::ChildSpec;
use crate::report::{ErrorLog, print_progress};
use crate::supervisor::Supervisor;

/// Environment variable selecting child mode: its value is the title of
/// the single case to execute in this process.
pub const CHILD_CASE_ENV: &str = "PENURIA_CHILD_CASE";

/// A test body: exercises one candidate through the allocation mock and
/// reports ownership transfers and the candidate's failure signal.
///
/// Plain function pointers only — the body must be runnable in a fresh
/// process that re-registers the suite, so it cannot capture state.
pub type TestBody = fn(&AllocMock) -> RunReport;

/// One registered test case.
#[derive(Debug, Clone)]
pub struct TestCase {
    /// Case title; also the key for child-mode dispatch and the error log.
    pub title: String,
    /// The test body.
    pub body: TestBody,
}

/// Aggregated result of a suite run.
#[derive(Debug, Clone, Default)]
pub struct SuiteSummary {
    /// Per-case outcomes, in registration order.
    pub outcomes: Vec<TestOutcome>,
}

impl SuiteSummary {
    /// Returns true if every case passed.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.outcomes.iter().all(|o| o.passed)
    }

    /// Number of passing cases.
    #[must_use]
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed).count()
    }

    /// Number of failing cases (timeouts included).
    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.passed()
    }

    /// Number of cases that hit the deadline.
    #[must_use]
    pub fn timed_out(&self) -> usize {
        self.outcomes.iter().filter(|o| o.timed_out).count()
    }

    /// Titles of failing cases, in run order.
    #[must_use]
    pub fn failing_titles(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| !o.passed)
            .map(|o| o.title.as_str())
            .collect()
    }

    /// Outcome for a title, if the case ran.
    #[must_use]
    pub fn outcome(&self, title: &str) -> Option<&TestOutcome> {
        self.outcomes.iter().find(|o| o.title == title)
    }

    /// Exit code for a runner binary: success iff everything passed.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        if self.all_passed() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    }
}

/// A registered table of test cases plus the harness configuration.
pub struct TestSuite {
    cases: Vec<TestCase>,
    config: HarnessConfig,
}

impl TestSuite {
    /// Creates an empty suite.
    #[must_use]
    pub fn new(config: HarnessConfig) -> Self {
        Self {
            cases: vec![],
            config,
        }
    }

    /// Registers a case (builder style).
    #[must_use]
    pub fn case(mut self, title: impl Into<String>, body: TestBody) -> Self {
        self.register(title, body);
        self
    }

    /// Registers a case.
    pub fn register(&mut self, title: impl Into<String>, body: TestBody) {
        self.cases.push(TestCase {
            title: title.into(),
            body,
        });
    }

    /// Number of registered cases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cases.len()
    }

    /// Returns true if no cases are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Runs the suite.
    ///
    /// In child mode (env var set) this executes the selected case and
    /// exits the process with its verdict — it does not return. Otherwise
    /// it supervises every case sequentially and returns the summary.
    ///
    /// # Errors
    /// Returns an error if supervision infrastructure fails; candidate
    /// failures are outcomes in the summary, not errors.
    pub async fn run(&self) -> Result<SuiteSummary> {
        if let Ok(title) = std::env::var(CHILD_CASE_ENV) {
            self.run_child(&title);
        }
        self.run_parent().await
    }

    /// Child mode: execute one case in this process and exit.
    ///
    /// Exit codes: 0 pass, 1 assertion failure, 2 unknown case.
    fn run_child(&self, title: &str) -> ! {
        let Some(case) = self.cases.iter().find(|c| c.title == title) else {
            eprintln!("unknown test case: {title}");
            std::process::exit(2);
        };

        // Self-alarm: if the body hangs, SIGALRM terminates this process
        // even when the parent's poll loop is delayed.
        #[cfg(unix)]
        let _previous = nix::unistd::alarm::set(self.config.timeout_secs_ceil());

        let mock = AllocMock::new();
        let diag = DiagContext::new();
        let driver = FaultDriver::new(&mock, &diag, &self.config);
        let report = driver.drive(case.body);

        for failure in &report.failures {
            eprintln!("{title}: {failure}");
        }
        tracing::debug!(
            title,
            executions = report.executions,
            passed = report.passed(),
            "child case done"
        );
        std::process::exit(i32::from(!report.passed()));
    }

    /// Parent mode: one supervised child per case, sequentially.
    async fn run_parent(&self) -> Result<SuiteSummary> {
        let exe = std::env::current_exe()
            .map_err(|e| SupervisorError::Executable(e.to_string()))?;
        let supervisor = Supervisor::new(self.config.clone())?;
        let log = ErrorLog::new(&self.config.log_path);

        let mut summary = SuiteSummary::default();
        for case in &self.cases {
            let spec = ChildSpec::new(&exe).env(CHILD_CASE_ENV, &case.title);
            let outcome = supervisor.supervise(&case.title, &spec).await?;
            print_progress(&outcome);
            if !outcome.passed {
                log.append(&outcome.title)?;
            }
            summary.outcomes.push(outcome);
        }

        tracing::info!(
            cases = summary.outcomes.len(),
            failed = summary.failed(),
            timed_out = summary.timed_out(),
            "suite finished"
        );
        Ok(summary)
    }
}
