// Allow unwrap/expect in tests for clear failure messages
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! # penuria-inject
//!
//! The allocation-failure injection driver of the penuria harness.
//!
//! [`FaultDriver`] executes a test body once to count its allocation calls
//! (the baseline run), then once per call with that allocation forced to
//! fail, asserting after every rerun that the candidate signalled failure
//! and freed all partial work. One failing iteration fails the whole case,
//! with the iteration index named in the diagnostic.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod driver;

pub use driver::{CaseReport, FaultDriver, RunReport};
