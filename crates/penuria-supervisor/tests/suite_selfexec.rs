//! End-to-end suite run through the self-exec child path.
//!
//! This file must contain exactly one test: the suite re-executes the
//! current binary for each case, and the child run must reach `run()` and
//! exit through child mode before anything else spawns processes.

#![cfg(unix)]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::PathBuf;
use std::time::Duration;

use penuria_alloc::AllocMock;
use penuria_core::HarnessConfig;
use penuria_inject::RunReport;
use penuria_supervisor::TestSuite;

/// Allocates 3 blocks, frees 2, returns the 3rd; frees partial work and
/// signals failure when an allocation fails.
fn good_case(mock: &AllocMock) -> RunReport {
    let mut kept = Vec::new();
    for _ in 0..3 {
        match mock.record(16) {
            Some(handle) => kept.push(handle),
            None => {
                for handle in kept {
                    mock.release(handle);
                }
                return RunReport::failure();
            }
        }
    }
    mock.release(kept[0]);
    mock.release(kept[1]);
    RunReport::returning(kept[2])
}

/// Never releases what it allocates and never declares a return.
fn leaky_case(mock: &AllocMock) -> RunReport {
    let _ = mock.record(32);
    RunReport::success()
}

/// Hangs forever; only a watchdog gets this case to an outcome.
fn spinning_case(_mock: &AllocMock) -> RunReport {
    loop {
        std::thread::sleep(Duration::from_millis(25));
    }
}

fn temp_log() -> PathBuf {
    std::env::temp_dir().join(format!("penuria-selfexec-{}.log", std::process::id()))
}

#[tokio::test(flavor = "multi_thread")]
async fn suite_isolates_cases_in_child_processes() {
    let log_path = temp_log();
    let _ = std::fs::remove_file(&log_path);

    let config = HarnessConfig::new()
        .with_timeout(Duration::from_secs(2))
        .with_poll_interval(Duration::from_millis(20))
        .with_log_path(&log_path);

    let suite = TestSuite::new(config)
        .case("good_case", good_case)
        .case("leaky_case", leaky_case)
        .case("spinning_case", spinning_case);

    let summary = suite.run().await.expect("suite run");

    assert_eq!(summary.outcomes.len(), 3);
    assert!(summary.outcome("good_case").expect("ran").passed);
    assert!(!summary.outcome("leaky_case").expect("ran").passed);
    assert!(!summary.outcome("leaky_case").expect("ran").timed_out);
    assert!(summary.outcome("spinning_case").expect("ran").timed_out);
    assert_eq!(summary.passed(), 1);
    assert_eq!(summary.failed(), 2);
    assert_eq!(summary.timed_out(), 1);
    assert!(!summary.all_passed());

    // Failing titles land in the append-only log, one per line.
    let log = std::fs::read_to_string(&log_path).expect("log written");
    assert!(log.contains("leaky_case"));
    assert!(log.contains("spinning_case"));
    assert!(!log.contains("good_case"));

    let _ = std::fs::remove_file(&log_path);
}
