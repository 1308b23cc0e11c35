// Allow unwrap/expect in tests for clear failure messages
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! # penuria-alloc
//!
//! The controllable allocation layer of the penuria harness.
//!
//! - [`AllocMock`] — the allocation mock registry: records every allocation
//!   call a test body makes, can force the k-th call of a run to fail, and
//!   detects double frees without ever crashing the harness.
//! - [`LeakChecker`] — verifies that a run left nothing live beyond the
//!   declared ownership transfers, and that size tracking satisfies the
//!   configured strictness.
//!
//! Registry state is scoped to one test process and vanishes with it.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod leak;
pub mod registry;

pub use leak::{LeakChecker, LeakReport, LeakedAllocation, SizeMismatch};
pub use registry::{AllocHandle, AllocMock, AllocationRecord, Violation};
