//! Allocation mock registry.
//!
//! Tracks every allocation a test body makes through the mock, in insertion
//! order, and can force the k-th allocation call of a run to fail. The
//! registry is an explicit, resettable object instantiated per test process;
//! its state vanishes with the process, so no cross-test coupling exists.
//!
//! Double frees and releases of unknown handles are recorded as
//! [`Violation`]s and reported loudly, never panicked on — the harness must
//! survive anything the candidate does.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Opaque identity for one mock allocation.
///
/// Carries the registry generation so a handle that survived a `reset` is
/// detected as unknown instead of silently aliasing a new record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AllocHandle {
    generation: u64,
    index: usize,
}

impl AllocHandle {
    /// Sequence index of this allocation within its run (0-indexed).
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }
}

impl std::fmt::Display for AllocHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "alloc#{}", self.index)
    }
}

/// One tracked allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationRecord {
    /// Sequence index within the run (0-indexed, insertion order).
    pub index: usize,
    /// Requested size in bytes.
    pub size: usize,
    /// Whether the allocation is still live.
    pub live: bool,
}

/// A misuse of the release side of the mock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Violation {
    /// The same handle was released twice.
    DoubleFree {
        /// Sequence index of the twice-freed allocation.
        index: usize,
    },
    /// A handle the registry never produced (or from a previous run).
    UnknownHandle,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DoubleFree { index } => write!(f, "double free of alloc#{index}"),
            Self::UnknownHandle => write!(f, "release of unknown handle"),
        }
    }
}

#[derive(Debug, Default)]
struct RegistryState {
    records: Vec<AllocationRecord>,
    calls: usize,
    failure_point: Option<usize>,
    violations: Vec<Violation>,
    generation: u64,
}

/// The allocation mock: stands in for the system allocator inside a test
/// body, recording every call and optionally failing one on purpose.
#[derive(Debug, Default)]
pub struct AllocMock {
    state: Mutex<RegistryState>,
}

impl AllocMock {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all records and counters and disarms any injection point.
    ///
    /// Must be called before any run whose allocations are to be tracked.
    /// Idempotent; bumps the handle generation so stale handles from
    /// earlier runs stop resolving.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.records.clear();
        state.calls = 0;
        state.failure_point = None;
        state.violations.clear();
        state.generation += 1;
    }

    /// Records one allocation call of `size` bytes.
    ///
    /// Returns `None` — the documented failure signal — when this call's
    /// sequence index matches the armed injection point; the point is
    /// consumed and no record is created. The failed call still advances
    /// the call counter, so `count()` is stable between a baseline run and
    /// an injected rerun of the same deterministic body.
    #[must_use]
    pub fn record(&self, size: usize) -> Option<AllocHandle> {
        let mut state = self.state.lock();
        let index = state.calls;
        state.calls += 1;

        if state.failure_point == Some(index) {
            state.failure_point = None;
            tracing::debug!(index, size, "injected allocation failure");
            return None;
        }

        state.records.push(AllocationRecord {
            index,
            size,
            live: true,
        });
        Some(AllocHandle {
            generation: state.generation,
            index,
        })
    }

    /// Releases a previously recorded allocation.
    ///
    /// An unknown handle or an already-freed record is recorded as a
    /// [`Violation`] and reported via `tracing::error`; the harness keeps
    /// running either way.
    pub fn release(&self, handle: AllocHandle) {
        let mut guard = self.state.lock();
        // Reborrow so records and violations can be borrowed disjointly.
        let state = &mut *guard;
        if handle.generation != state.generation {
            tracing::error!(index = handle.index, "release of stale handle");
            state.violations.push(Violation::UnknownHandle);
            return;
        }
        match state.records.iter_mut().find(|r| r.index == handle.index) {
            Some(record) if record.live => {
                record.live = false;
            }
            Some(record) => {
                tracing::error!(index = record.index, "double free detected");
                let index = record.index;
                state.violations.push(Violation::DoubleFree { index });
            }
            None => {
                tracing::error!(index = handle.index, "release of unknown handle");
                state.violations.push(Violation::UnknownHandle);
            }
        }
    }

    /// Tracked size for a handle of the current run, live or freed.
    #[must_use]
    pub fn query_size(&self, handle: AllocHandle) -> Option<usize> {
        let state = self.state.lock();
        if handle.generation != state.generation {
            return None;
        }
        state
            .records
            .iter()
            .find(|r| r.index == handle.index)
            .map(|r| r.size)
    }

    /// Number of allocation calls observed since the last reset.
    ///
    /// Counts calls, not records: an injected failure consumes an index
    /// without creating a record.
    #[must_use]
    pub fn count(&self) -> usize {
        self.state.lock().calls
    }

    /// Arms injection: the k-th allocation call (0-indexed) of the next run
    /// returns the failure signal. At most one point is active; arming
    /// replaces any previous one.
    pub fn set_failure_point(&self, k: usize) {
        self.state.lock().failure_point = Some(k);
    }

    /// All currently-live allocations, in sequence order.
    #[must_use]
    pub fn outstanding(&self) -> Vec<AllocHandle> {
        let state = self.state.lock();
        state
            .records
            .iter()
            .filter(|r| r.live)
            .map(|r| AllocHandle {
                generation: state.generation,
                index: r.index,
            })
            .collect()
    }

    /// Snapshot of every record of the current run, insertion-ordered.
    #[must_use]
    pub fn records(&self) -> Vec<AllocationRecord> {
        self.state.lock().records.clone()
    }

    /// Drains the violations recorded since the last reset.
    #[must_use]
    pub fn take_violations(&self) -> Vec<Violation> {
        std::mem::take(&mut self.state.lock().violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_assigns_sequence_indices() {
        let mock = AllocMock::new();
        let a = mock.record(8).expect("alloc");
        let b = mock.record(16).expect("alloc");
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(mock.count(), 2);
    }

    #[test]
    fn test_release_marks_freed() {
        let mock = AllocMock::new();
        let a = mock.record(8).expect("alloc");
        let b = mock.record(16).expect("alloc");
        mock.release(a);
        let live = mock.outstanding();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0], b);
        assert!(mock.take_violations().is_empty());
    }

    #[test]
    fn test_query_size() {
        let mock = AllocMock::new();
        let a = mock.record(42).expect("alloc");
        assert_eq!(mock.query_size(a), Some(42));
        // Size stays queryable after release (needed for diagnostics).
        mock.release(a);
        assert_eq!(mock.query_size(a), Some(42));
    }

    #[test]
    fn test_reset_idempotent() {
        let mock = AllocMock::new();
        let _ = mock.record(8);
        mock.reset();
        assert_eq!(mock.count(), 0);
        mock.reset();
        assert_eq!(mock.count(), 0);
        assert!(mock.outstanding().is_empty());
    }

    #[test]
    fn test_failure_point_returns_none_and_skips_record() {
        let mock = AllocMock::new();
        mock.set_failure_point(1);
        assert!(mock.record(8).is_some());
        assert!(mock.record(8).is_none());
        assert!(mock.record(8).is_some());
        // The failed call still consumed an index.
        assert_eq!(mock.count(), 3);
        assert_eq!(mock.records().len(), 2);
    }

    #[test]
    fn test_failure_point_consumed_once() {
        let mock = AllocMock::new();
        mock.set_failure_point(0);
        assert!(mock.record(8).is_none());
        // Consumed; subsequent calls succeed without re-arming.
        assert!(mock.record(8).is_some());
    }

    #[test]
    fn test_failure_point_cleared_by_reset() {
        let mock = AllocMock::new();
        mock.set_failure_point(0);
        mock.reset();
        assert!(mock.record(8).is_some());
    }

    #[test]
    fn test_double_free_recorded_not_fatal() {
        let mock = AllocMock::new();
        let a = mock.record(8).expect("alloc");
        mock.release(a);
        mock.release(a);
        let violations = mock.take_violations();
        assert_eq!(violations, vec![Violation::DoubleFree { index: 0 }]);
        // Drained.
        assert!(mock.take_violations().is_empty());
    }

    #[test]
    fn test_stale_handle_is_unknown() {
        let mock = AllocMock::new();
        let a = mock.record(8).expect("alloc");
        mock.reset();
        let _ = mock.record(8);
        mock.release(a);
        assert_eq!(mock.take_violations(), vec![Violation::UnknownHandle]);
        // The new run's record is untouched.
        assert_eq!(mock.outstanding().len(), 1);
    }

    #[test]
    fn test_stale_handle_size_unknown() {
        let mock = AllocMock::new();
        let a = mock.record(8).expect("alloc");
        mock.reset();
        assert_eq!(mock.query_size(a), None);
    }

    #[test]
    fn test_violation_display() {
        assert_eq!(
            Violation::DoubleFree { index: 3 }.to_string(),
            "double free of alloc#3"
        );
        assert_eq!(
            Violation::UnknownHandle.to_string(),
            "release of unknown handle"
        );
    }

    #[test]
    fn test_record_serialize_roundtrip() {
        let record = AllocationRecord {
            index: 2,
            size: 64,
            live: true,
        };
        let json = serde_json::to_string(&record).unwrap();
        let deserialized: AllocationRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, deserialized);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Whatever interleaving of allocs and frees a body performs,
            /// outstanding() is exactly the set of never-released records.
            #[test]
            fn outstanding_matches_accounting(
                sizes in prop::collection::vec(1usize..4096, 0..32),
                free_mask in prop::collection::vec(any::<bool>(), 0..32),
            ) {
                let mock = AllocMock::new();
                let handles: Vec<_> = sizes
                    .iter()
                    .map(|&s| mock.record(s).expect("no injection armed"))
                    .collect();

                let mut expected_live = 0usize;
                for (i, handle) in handles.iter().enumerate() {
                    if free_mask.get(i).copied().unwrap_or(false) {
                        mock.release(*handle);
                    } else {
                        expected_live += 1;
                    }
                }

                prop_assert_eq!(mock.outstanding().len(), expected_live);
                prop_assert_eq!(mock.count(), sizes.len());
                prop_assert!(mock.take_violations().is_empty());
            }

            /// Reset always returns the registry to the empty state.
            #[test]
            fn reset_clears_everything(sizes in prop::collection::vec(1usize..4096, 0..16)) {
                let mock = AllocMock::new();
                for &s in &sizes {
                    let _ = mock.record(s);
                }
                mock.reset();
                prop_assert_eq!(mock.count(), 0);
                prop_assert!(mock.outstanding().is_empty());
                prop_assert!(mock.records().is_empty());
            }

            /// Injecting at call k never leaves a record for call k, and the
            /// call count is unchanged versus an uninjected run.
            #[test]
            fn injection_preserves_call_count(
                sizes in prop::collection::vec(1usize..4096, 1..16),
                k_seed in any::<prop::sample::Index>(),
            ) {
                let k = k_seed.index(sizes.len());
                let mock = AllocMock::new();
                mock.set_failure_point(k);
                for (i, &s) in sizes.iter().enumerate() {
                    let handle = mock.record(s);
                    prop_assert_eq!(handle.is_none(), i == k);
                }
                prop_assert_eq!(mock.count(), sizes.len());
                prop_assert_eq!(mock.records().len(), sizes.len() - 1);
                prop_assert!(mock.records().iter().all(|r| r.index != k));
            }
        }
    }
}
