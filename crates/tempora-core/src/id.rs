//! Process-wide worker identifiers.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for unique [`WorkerId`] allocation.
static WORKER_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a time-managed worker.
///
/// Allocated from a monotonic atomic counter via [`WorkerId::next`].
/// Ordering reflects allocation order only; the time manager uses it
/// to break ties deterministically between tasks that are otherwise
/// equal. IDs are never reused within a process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkerId(u64);

impl WorkerId {
    /// Allocate a fresh, unique worker ID.
    ///
    /// Each call returns a new ID that compares greater than every ID
    /// returned before it within this process. Thread-safe.
    pub fn next() -> Self {
        Self(WORKER_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw counter value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}", self.0)
    }
}
