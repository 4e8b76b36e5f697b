//! Error types for the Tempora time-synchronization kernel.
//!
//! Organized by who is at fault: [`SyncError`] is returned to callers
//! of the time manager for precondition violations, [`ClockError`] and
//! [`QueueError`] signal internal defects, and [`WorkerError`] is what
//! a worker callback hands back when its own processing fails.

use thiserror::Error;

use crate::id::WorkerId;
use crate::time::SimTime;

/// Error a worker returns from
/// [`Worker::advance_granted`](crate::traits::Worker::advance_granted).
///
/// Any error (or panic) in a callback removes that worker from the
/// simulation; the rest of the run continues.
pub type WorkerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The wall clock was asked to move backwards.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ClockError<T: SimTime> {
    /// `requested` is earlier than the current reading.
    #[error("wall clock regression from {current} to {requested}")]
    Regression {
        /// Reading at the time of the request.
        current: T,
        /// The rejected time.
        requested: T,
    },
}

/// Errors from the sorted task queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum QueueError {
    /// `poll()` was called on an empty queue.
    #[error("poll on empty queue")]
    Empty,
}

/// Precondition violations reported by the time manager.
///
/// These are caller bugs: the operation is rejected, engine state is
/// left untouched, and the error is returned at the call site.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SyncError<T: SimTime> {
    /// A worker with this ID is already registered.
    #[error("worker {worker} is already registered")]
    AlreadyRegistered {
        /// The duplicate worker.
        worker: WorkerId,
    },
    /// Registration is only allowed before `start()`.
    #[error("cannot register worker {worker}: time management already started")]
    RegistrationAfterStart {
        /// The rejected worker.
        worker: WorkerId,
    },
    /// Registration is only allowed while the wall clock reads zero.
    #[error("cannot register worker {worker}: wall clock already at {wall_clock}")]
    RegistrationClosed {
        /// The rejected worker.
        worker: WorkerId,
        /// Current wall clock reading.
        wall_clock: T,
    },
    /// The worker's lookahead does not advance time at all.
    #[error("worker {worker} declares a zero lookahead")]
    ZeroLookahead {
        /// The rejected worker.
        worker: WorkerId,
    },
    /// No worker with this ID is registered.
    #[error("unknown worker {worker}")]
    UnknownWorker {
        /// The unknown ID.
        worker: WorkerId,
    },
    /// The requested time is earlier than the wall clock.
    #[error("worker {worker} requested {requested}, behind wall clock {wall_clock}")]
    BehindWallClock {
        /// The requesting worker.
        worker: WorkerId,
        /// The rejected time.
        requested: T,
        /// Current wall clock reading.
        wall_clock: T,
    },
    /// The requested time is earlier than the worker's last accepted request.
    #[error("worker {worker} requested {requested}, before its last request {last}")]
    StaleRequest {
        /// The requesting worker.
        worker: WorkerId,
        /// The rejected time.
        requested: T,
        /// The worker's last accepted request.
        last: T,
    },
    /// A grant at the requested time has already been released to the worker.
    #[error("worker {worker} was already granted {requested}")]
    AlreadyGranted {
        /// The requesting worker.
        worker: WorkerId,
        /// The duplicate time.
        requested: T,
    },
    /// `start()` was called a second time.
    #[error("time management is already running")]
    AlreadyStarted,
    /// The wall clock regressed while draining (internal defect).
    #[error(transparent)]
    Clock(#[from] ClockError<T>),
    /// The task queue was polled while empty (internal defect).
    #[error(transparent)]
    Queue(#[from] QueueError),
}
