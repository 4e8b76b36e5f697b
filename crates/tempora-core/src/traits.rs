//! The worker contract consumed by the time manager.

use crate::error::WorkerError;
use crate::id::WorkerId;
use crate::time::SimTime;

/// A simulation component whose progress through logical time is
/// governed by the time manager.
///
/// A worker declares a lookahead: once granted time `T`, it promises
/// not to produce effects visible to other workers before
/// `T + lookahead`. The time manager uses that promise to decide when
/// other workers may safely move past `T`.
///
/// The time manager holds workers through a `Weak` reference and never
/// owns them. Implementations must be `Send + Sync` because callbacks
/// run on whatever thread the configured executor picks.
pub trait Worker<T: SimTime>: Send + Sync {
    /// Identity used for every further interaction with the time manager.
    fn id(&self) -> WorkerId;

    /// The lookahead declared at registration.
    fn lookahead(&self) -> T::Span;

    /// Called when the time manager grants this worker `time`.
    ///
    /// The worker performs its local work for `time` and then, to keep
    /// progressing, requests its next advance (directly or from another
    /// thread). Returning an error, or panicking, removes the worker
    /// from the simulation.
    fn advance_granted(&self, time: T) -> Result<(), WorkerError>;
}
