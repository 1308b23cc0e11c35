// Allow unwrap/expect in tests for clear failure messages
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! # penuria-core
//!
//! Core types for the penuria fault-injection harness.
//!
//! This crate provides the foundational pieces shared by the allocation
//! mock, the fault-injection driver, and the process supervisor:
//!
//! - [`HarnessError`] — explicit error taxonomy for harness infrastructure
//! - [`CaseState`] / [`TestOutcome`] — the per-case state machine and result
//! - [`HarnessConfig`] — validated configuration (deadline, poll cadence,
//!   size-check strictness, fault-injection toggle)
//! - [`DiagContext`] — the "what is being checked right now" cursor that
//!   makes failure messages self-describing

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod diag;
pub mod error;
pub mod types;

pub use config::{HarnessConfig, SizeCheckMode};
pub use diag::DiagContext;
pub use error::{HarnessError, Result};
pub use types::{CaseId, CaseState, ChildExit, TestOutcome};
