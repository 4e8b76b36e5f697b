//! Queue entries and their ordering.
//!
//! The ordering is what makes conservative synchronization work:
//! tasks sort by time, then BLOCK before GRANT, then by worker ID. A
//! GRANT can therefore only reach the front of the queue once no
//! worker's BLOCK horizon lies at or before it.

use std::cmp::Ordering;
use std::fmt;

use tempora_core::{SimTime, WorkerId};

/// What a queued task represents.
///
/// Variant order is significant: `Block` sorts before `Grant` at equal
/// time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskKind {
    /// The worker's synchronization horizon. Until the worker requests
    /// its next advance, no grant at or after this time is released.
    Block,
    /// An opportunity for the worker to execute at this time.
    Grant,
}

/// An entry in the time manager's queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WorkTask<T> {
    /// When the task is due.
    pub time: T,
    /// Owning worker.
    pub worker: WorkerId,
    /// Block or grant.
    pub kind: TaskKind,
}

impl<T: SimTime> WorkTask<T> {
    /// A grant for `worker` at `time`.
    pub fn grant(time: T, worker: WorkerId) -> Self {
        Self {
            time,
            worker,
            kind: TaskKind::Grant,
        }
    }

    /// A block horizon for `worker` at `time`.
    pub fn block(time: T, worker: WorkerId) -> Self {
        Self {
            time,
            worker,
            kind: TaskKind::Block,
        }
    }

    /// Whether this is a grant.
    pub fn is_grant(&self) -> bool {
        self.kind == TaskKind::Grant
    }

    /// Whether this is a block.
    pub fn is_block(&self) -> bool {
        self.kind == TaskKind::Block
    }
}

impl<T: SimTime> Ord for WorkTask<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .cmp(&other.time)
            .then(self.kind.cmp(&other.kind))
            .then(self.worker.cmp(&other.worker))
    }
}

impl<T: SimTime> PartialOrd for WorkTask<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: fmt::Display> fmt::Display for WorkTask<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            TaskKind::Block => "block",
            TaskKind::Grant => "grant",
        };
        write!(f, "{kind}({}@{})", self.worker, self.time)
    }
}
