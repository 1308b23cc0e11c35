//! Penuria: process-isolated fault-injection harness for memory-allocating
//! functions.
//!
//! Each test case runs in its own OS process under a wall-clock deadline.
//! Inside the process, a controllable allocation layer simulates
//! out-of-memory conditions one allocation call at a time, proving the
//! candidate frees everything it allocated before failing and returns its
//! documented failure signal.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use penuria::prelude::*;
//!
//! fn dup_hello(mock: &AllocMock) -> RunReport {
//!     match mock.record(6) {
//!         Some(buffer) => RunReport::returning(buffer),
//!         None => RunReport::failure(),
//!     }
//! }
//!
//! # async fn run() -> penuria::supervisor::Result<()> {
//! let suite = TestSuite::new(HarnessConfig::default()).case("dup_hello", dup_hello);
//! let summary = suite.run().await?;
//! assert!(summary.all_passed());
//! # Ok(())
//! # }
//! ```

pub use penuria_alloc as alloc;
pub use penuria_core as core;
pub use penuria_inject as inject;
pub use penuria_supervisor as supervisor;

/// Prelude module for common imports.
pub mod prelude {
    pub use penuria_alloc::{AllocHandle, AllocMock, LeakChecker, LeakReport, Violation};
    pub use penuria_core::{
        CaseId, CaseState, DiagContext, HarnessConfig, SizeCheckMode, TestOutcome,
    };
    pub use penuria_inject::{CaseReport, FaultDriver, RunReport};
    pub use penuria_supervisor::{
        ChildSpec, ErrorLog, ExecLauncher, Launcher, SuiteSummary, Supervisor, TestSuite,
    };
}
