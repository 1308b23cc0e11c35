//! Process timeout supervisor.
//!
//! Runs one test case in an isolated child process and enforces a
//! wall-clock deadline on it. The parent polls completion at a fixed short
//! interval rather than blocking, so a hung or spinning candidate can never
//! stall the suite; past the deadline the child is force-killed and the
//! case records a timeout outcome distinct from an assertion failure.
//!
//! The child arms its own alarm as a second line of defense (see the suite
//! module); whichever watchdog fires first wins, and both converge on
//! termination.

use std::time::Instant;

use penuria_core::{CaseState, ChildExit, HarnessConfig, TestOutcome};

use crate::error::Result;
use crate::launcher::{ChildPoll, ChildSpec, ExecLauncher, Launcher};

/// SIGALRM: the child's own watchdog fired before the parent's deadline.
#[cfg(unix)]
const ALARM_SIGNAL: i32 = nix::sys::signal::Signal::SIGALRM as i32;
#[cfg(not(unix))]
const ALARM_SIGNAL: i32 = 14;

/// Enforces per-case deadlines over isolated child processes.
pub struct Supervisor<L: Launcher = ExecLauncher> {
    launcher: L,
    config: HarnessConfig,
}

impl Supervisor<ExecLauncher> {
    /// Creates a supervisor with the production launcher.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn new(config: HarnessConfig) -> Result<Self> {
        Self::with_launcher(ExecLauncher::new(), config)
    }
}

impl<L: Launcher> Supervisor<L> {
    /// Creates a supervisor over a specific launcher.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn with_launcher(launcher: L, config: HarnessConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { launcher, config })
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Runs one child to completion or deadline and classifies the result.
    ///
    /// # Errors
    /// Returns an error if the child cannot be spawned, polled, or killed —
    /// candidate-level failures are outcomes, not errors.
    pub async fn supervise(&self, title: &str, spec: &ChildSpec) -> Result<TestOutcome> {
        let mut handle = self.launcher.spawn(spec).await?;
        let mut state = CaseState::Spawned;
        let started = Instant::now();
        tracing::debug!(title, pid = self.launcher.pid(&handle), "case spawned");

        loop {
            match self.launcher.poll(&mut handle).await? {
                ChildPoll::Exited(exit) => {
                    let outcome = classify(title, exit);
                    state = if outcome.timed_out {
                        CaseState::TimedOut
                    } else if exit.code.is_some() {
                        CaseState::Completed
                    } else {
                        CaseState::Crashed
                    };
                    tracing::debug!(
                        title,
                        ?state,
                        elapsed = ?started.elapsed(),
                        passed = outcome.passed,
                        "case finished"
                    );
                    return Ok(outcome);
                }
                ChildPoll::Running => {
                    if state == CaseState::Spawned {
                        state = CaseState::Running;
                    }
                    if started.elapsed() >= self.config.timeout {
                        tracing::warn!(title, timeout = ?self.config.timeout, "deadline expired, killing child");
                        self.launcher.kill(&mut handle).await?;
                        state = CaseState::TimedOut;
                        tracing::debug!(title, ?state, "case finished");
                        return Ok(TestOutcome::timeout(title));
                    }
                    tokio::time::sleep(self.config.poll_interval).await;
                }
            }
        }
    }
}

/// Maps a child exit to an outcome.
///
/// Exit code zero is the only pass. A nonzero code is a failing outcome
/// even when no assertion printed anything — that covers silent crashes. A
/// signal death is a crash, except SIGALRM, which means the in-child
/// watchdog fired first and is therefore a timeout.
fn classify(title: &str, exit: ChildExit) -> TestOutcome {
    match (exit.code, exit.signal) {
        (Some(0), _) => TestOutcome::pass(title),
        (Some(code), _) => TestOutcome::fail(title, format!("exited with code {code}")),
        (None, Some(ALARM_SIGNAL)) => TestOutcome::timeout(title),
        (None, Some(signal)) => TestOutcome::fail(title, format!("terminated by signal {signal}")),
        (None, None) => TestOutcome::fail(title, "abnormal termination"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    /// Scripted launcher: pops a queued poll result per poll; an empty
    /// queue means the child never finishes on its own.
    struct MockLauncher {
        polls: Mutex<VecDeque<ChildPoll>>,
        killed: Arc<AtomicBool>,
    }

    impl MockLauncher {
        fn new(polls: Vec<ChildPoll>) -> (Self, Arc<AtomicBool>) {
            let killed = Arc::new(AtomicBool::new(false));
            (
                Self {
                    polls: Mutex::new(polls.into()),
                    killed: Arc::clone(&killed),
                },
                killed,
            )
        }
    }

    #[async_trait]
    impl Launcher for MockLauncher {
        type Handle = ();

        async fn spawn(&self, _spec: &ChildSpec) -> Result<()> {
            Ok(())
        }

        async fn poll(&self, _handle: &mut ()) -> Result<ChildPoll> {
            Ok(self.polls.lock().pop_front().unwrap_or(ChildPoll::Running))
        }

        async fn kill(&self, _handle: &mut ()) -> Result<()> {
            self.killed.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn pid(&self, _handle: &()) -> Option<u32> {
            None
        }
    }

    fn fast_config() -> HarnessConfig {
        HarnessConfig::new()
            .with_timeout(Duration::from_millis(200))
            .with_poll_interval(Duration::from_millis(10))
    }

    fn spec() -> ChildSpec {
        ChildSpec::new("/bin/true")
    }

    #[tokio::test]
    async fn test_clean_exit_passes() {
        let (launcher, killed) = MockLauncher::new(vec![ChildPoll::Exited(ChildExit::with_code(0))]);
        let supervisor = Supervisor::with_launcher(launcher, fast_config()).expect("config");
        let outcome = supervisor.supervise("case", &spec()).await.expect("run");
        assert!(outcome.passed);
        assert!(!killed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_nonzero_exit_fails_without_message_from_child() {
        let (launcher, _) = MockLauncher::new(vec![
            ChildPoll::Running,
            ChildPoll::Exited(ChildExit::with_code(3)),
        ]);
        let supervisor = Supervisor::with_launcher(launcher, fast_config()).expect("config");
        let outcome = supervisor.supervise("case", &spec()).await.expect("run");
        assert!(!outcome.passed);
        assert!(!outcome.timed_out);
        assert!(outcome.message.expect("message").contains("code 3"));
    }

    #[tokio::test]
    async fn test_signal_death_is_crash() {
        let (launcher, _) = MockLauncher::new(vec![ChildPoll::Exited(ChildExit::with_signal(11))]);
        let supervisor = Supervisor::with_launcher(launcher, fast_config()).expect("config");
        let outcome = supervisor.supervise("case", &spec()).await.expect("run");
        assert!(!outcome.passed);
        assert!(!outcome.timed_out);
        assert!(outcome.message.expect("message").contains("signal 11"));
    }

    #[tokio::test]
    async fn test_alarm_death_is_timeout() {
        // The in-child watchdog fired before our deadline: timeout, not crash.
        let (launcher, _) =
            MockLauncher::new(vec![ChildPoll::Exited(ChildExit::with_signal(ALARM_SIGNAL))]);
        let supervisor = Supervisor::with_launcher(launcher, fast_config()).expect("config");
        let outcome = supervisor.supervise("case", &spec()).await.expect("run");
        assert!(!outcome.passed);
        assert!(outcome.timed_out);
    }

    #[tokio::test]
    async fn test_deadline_kills_hung_child() {
        let (launcher, killed) = MockLauncher::new(vec![]);
        let supervisor = Supervisor::with_launcher(launcher, fast_config()).expect("config");
        let started = Instant::now();
        let outcome = supervisor.supervise("case", &spec()).await.expect("run");
        assert!(outcome.timed_out);
        assert!(killed.load(Ordering::SeqCst));
        // Within deadline plus a few poll intervals of slack.
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let (launcher, _) = MockLauncher::new(vec![]);
        let config = HarnessConfig::new().with_timeout(Duration::ZERO);
        assert!(Supervisor::with_launcher(launcher, config).is_err());
    }

    #[test]
    fn test_classify_exhaustive() {
        assert!(classify("t", ChildExit::with_code(0)).passed);
        assert!(!classify("t", ChildExit::with_code(1)).passed);
        assert!(classify("t", ChildExit::with_signal(ALARM_SIGNAL)).timed_out);
        assert!(!classify("t", ChildExit::with_signal(9)).timed_out);
        let weird = classify("t", ChildExit { code: None, signal: None });
        assert!(!weird.passed);
    }
}
