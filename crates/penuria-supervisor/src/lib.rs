// Allow unwrap/expect in tests for clear failure messages
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! # penuria-supervisor
//!
//! Process isolation and deadline enforcement for the penuria harness.
//!
//! - [`Supervisor`] — spawns one child per test case, polls completion at a
//!   fixed interval, and force-kills past the deadline. Timeouts are
//!   reported distinctly from assertion failures and crashes.
//! - [`Launcher`] — the adapter seam between the poll loop and real
//!   processes; [`ExecLauncher`] is the production implementation.
//! - [`TestSuite`] — the registered case table with self-exec child-mode
//!   dispatch, the in-child alarm, progress lines, and the error log.
//!
//! One OS process per test case; the only things crossing the boundary are
//! the exit status and the append-only log.

#![warn(missing_docs)]

pub mod error;
pub mod launcher;
pub mod report;
pub mod suite;
pub mod supervisor;
pub mod telemetry;

pub use error::{Result, SupervisorError};
pub use launcher::{ChildPoll, ChildSpec, ExecLauncher, Launcher, process_exists};
pub use report::{ErrorLog, print_progress, progress_line};
pub use suite::{CHILD_CASE_ENV, SuiteSummary, TestBody, TestCase, TestSuite};
pub use supervisor::Supervisor;
