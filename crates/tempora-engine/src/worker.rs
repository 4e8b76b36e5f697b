//! Per-worker synchronization record.

use std::fmt;
use std::sync::{Arc, Weak};

use tempora_core::{SimTime, Worker, WorkerId};

use crate::task::WorkTask;

/// What the time manager tracks about one registered worker.
///
/// Created by `register_worker`, mutated only while the engine lock is
/// held, dropped by `remove_worker`. The worker itself is held weakly:
/// the time manager tracks participation, not lifetime.
pub(crate) struct WorkerState<T: SimTime> {
    pub id: WorkerId,
    pub lookahead: T::Span,
    /// Last time actually granted; `None` until the first grant.
    pub granted_time: Option<T>,
    /// Time of the last accepted advance request.
    pub next_time: T,
    handle: Weak<dyn Worker<T>>,
}

impl<T: SimTime> WorkerState<T> {
    pub fn new(id: WorkerId, lookahead: T::Span, zero: T, handle: Weak<dyn Worker<T>>) -> Self {
        Self {
            id,
            lookahead,
            granted_time: None,
            next_time: zero,
            handle,
        }
    }

    /// The outstanding synchronization horizon.
    ///
    /// Always `next_time + lookahead`: registration seeds it at
    /// `zero + lookahead` and every accepted request re-seeds it at
    /// `request + lookahead`.
    pub fn block_task(&self) -> WorkTask<T> {
        WorkTask::block(self.next_time.after(self.lookahead), self.id)
    }

    /// Whether a grant at `time` or later has already been released.
    pub fn granted_at_or_after(&self, time: T) -> bool {
        self.granted_time.is_some_and(|granted| granted >= time)
    }

    /// A clone of the weak worker handle, for dispatch outside the lock.
    pub fn handle(&self) -> Weak<dyn Worker<T>> {
        Weak::clone(&self.handle)
    }
}

impl<T: SimTime> fmt::Debug for WorkerState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerState")
            .field("id", &self.id)
            .field("lookahead", &self.lookahead)
            .field("granted_time", &self.granted_time)
            .field("next_time", &self.next_time)
            .field("alive", &(self.handle.strong_count() > 0))
            .finish()
    }
}

/// Downgrade a concrete worker to the handle stored in [`WorkerState`].
pub(crate) fn downgrade<T, W>(worker: &Arc<W>) -> Weak<dyn Worker<T>>
where
    T: SimTime,
    W: Worker<T> + 'static,
{
    let weak: Weak<W> = Arc::downgrade(worker);
    weak
}
