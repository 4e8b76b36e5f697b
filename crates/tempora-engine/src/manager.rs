//! The time manager: conservative advance algorithm and termination.
//!
//! [`TimeManager`] owns the task queue, the worker map, and the wall
//! clock behind a single mutex. Workers register before the run, each
//! seeded with a GRANT at zero and a BLOCK at its lookahead. From then
//! on every advance request removes the worker's BLOCK, queues a GRANT
//! at the requested time plus a new BLOCK one lookahead later, and
//! drains.
//!
//! # Architecture
//!
//! ```text
//! Worker callback           Executor                 Engine lock
//!     |                         |                         |
//!     |--request_advance()----->| (fast check) ---------->| validate
//!     |<--Ok(()) immediately    |                         |
//!     |                         |--process_advance()----->| validate again
//!     |                         |                         | remove BLOCK
//!     |                         |                         | queue GRANT + BLOCK
//!     |                         |                         | drain -> grants
//!     |                         |<------------------------| unlock
//!     |<--advance_granted(t)----| (one job per grant)     |
//! ```
//!
//! Grants are dispatched only after the lock is released, so the
//! inline executor can re-enter the manager from inside a callback
//! without a reentrant lock.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use indexmap::IndexMap;
use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use tempora_core::{SimTime, SyncError, TimeDomain, WallClock, Worker, WorkerId};

use crate::config::{ConfigError, EngineConfig};
use crate::executor::Executor;
use crate::gate::CompletionGate;
use crate::queue::SortedQueue;
use crate::task::WorkTask;
use crate::worker::{downgrade, WorkerState};

// ── Grant ──────────────────────────────────────────────────────────

/// A released grant waiting to be handed to the executor.
struct Grant<T: SimTime> {
    worker: WorkerId,
    time: T,
    handle: Weak<dyn Worker<T>>,
}

type Grants<T> = SmallVec<[Grant<T>; 4]>;

/// Result of one locked mutation: grants to dispatch once unlocked,
/// and whether the run is now complete.
struct Step<T: SimTime> {
    grants: Grants<T>,
    complete: bool,
}

impl<T: SimTime> Step<T> {
    fn new(grants: Grants<T>, complete: bool) -> Self {
        Self { grants, complete }
    }
}

// ── EngineState ────────────────────────────────────────────────────

/// Everything guarded by the engine lock.
///
/// Queue and worker map are only ever mutated together, inside one
/// method call on this struct.
struct EngineState<T: SimTime> {
    queue: SortedQueue<WorkTask<T>>,
    workers: IndexMap<WorkerId, WorkerState<T>>,
    clock: WallClock<T>,
    domain: TimeDomain<T>,
    stop_time: T,
    started: bool,
}

impl<T: SimTime> EngineState<T> {
    fn new(domain: TimeDomain<T>, stop_time: T) -> Self {
        Self {
            queue: SortedQueue::new(),
            workers: IndexMap::new(),
            clock: WallClock::new(domain.zero),
            domain,
            stop_time,
            started: false,
        }
    }

    fn register(
        &mut self,
        id: WorkerId,
        lookahead: T::Span,
        handle: Weak<dyn Worker<T>>,
    ) -> Result<(), SyncError<T>> {
        if self.started {
            return Err(SyncError::RegistrationAfterStart { worker: id });
        }
        let zero = self.domain.zero;
        if self.clock.time() != zero {
            return Err(SyncError::RegistrationClosed {
                worker: id,
                wall_clock: self.clock.time(),
            });
        }
        if self.workers.contains_key(&id) {
            return Err(SyncError::AlreadyRegistered { worker: id });
        }
        if zero.after(lookahead) <= zero {
            return Err(SyncError::ZeroLookahead { worker: id });
        }

        let state = WorkerState::new(id, lookahead, zero, handle);
        self.queue.add(WorkTask::grant(zero, id));
        self.queue.add(state.block_task());
        self.workers.insert(id, state);
        Ok(())
    }

    fn start(&mut self) -> Result<Step<T>, SyncError<T>> {
        if self.started {
            return Err(SyncError::AlreadyStarted);
        }
        self.started = true;
        let grants = self.drain()?;
        Ok(Step::new(grants, self.queue.is_empty()))
    }

    fn check_advance(&self, id: WorkerId, next: T) -> Result<(), SyncError<T>> {
        let worker = self
            .workers
            .get(&id)
            .ok_or(SyncError::UnknownWorker { worker: id })?;
        let wall_clock = self.clock.time();
        if next < wall_clock {
            return Err(SyncError::BehindWallClock {
                worker: id,
                requested: next,
                wall_clock,
            });
        }
        if next < worker.next_time {
            return Err(SyncError::StaleRequest {
                worker: id,
                requested: next,
                last: worker.next_time,
            });
        }
        if worker.granted_at_or_after(next) {
            return Err(SyncError::AlreadyGranted {
                worker: id,
                requested: next,
            });
        }
        Ok(())
    }

    fn apply_advance(&mut self, id: WorkerId, next: T) -> Result<Step<T>, SyncError<T>> {
        self.check_advance(id, next)?;
        let Some(worker) = self.workers.get_mut(&id) else {
            return Err(SyncError::UnknownWorker { worker: id });
        };
        let old_block = worker.block_task();
        let finished = next > self.stop_time;
        if !finished {
            worker.next_time = next;
        }
        let block = worker.block_task();
        self.queue.remove(&old_block);

        if finished {
            debug!(worker = %id, time = %next, "worker requested past stop time");
            // Its BLOCK is gone, which may free grants held behind it.
            let grants = self.drain()?;
            return Ok(Step::new(grants, self.started && self.queue.is_empty()));
        }

        self.queue.add(WorkTask::grant(next, id));
        self.queue.add(block);
        let grants = self.drain()?;
        Ok(Step::new(grants, false))
    }

    /// Returns `None` if `id` was not registered.
    fn remove(&mut self, id: WorkerId) -> Result<Option<Step<T>>, SyncError<T>> {
        if self.workers.shift_remove(&id).is_none() {
            return Ok(None);
        }
        self.queue.remove_if(|task| task.worker == id);
        let grants = self.drain()?;
        let complete = self.started && self.queue.is_empty();
        Ok(Some(Step::new(grants, complete)))
    }

    /// Release every grant not preceded by a BLOCK.
    fn drain(&mut self) -> Result<Grants<T>, SyncError<T>> {
        let mut grants = Grants::new();
        while self.queue.peek().is_some_and(WorkTask::is_grant) {
            let task = self.queue.poll()?;
            self.clock.advance_to(task.time)?;
            if let Some(worker) = self.workers.get_mut(&task.worker) {
                worker.granted_time = Some(task.time);
                trace!(worker = %task.worker, time = %task.time, "advance granted");
                grants.push(Grant {
                    worker: task.worker,
                    time: task.time,
                    handle: worker.handle(),
                });
            }
        }
        Ok(grants)
    }
}

// ── Shared ─────────────────────────────────────────────────────────

struct Shared<T: SimTime> {
    state: Mutex<EngineState<T>>,
    executor: Arc<dyn Executor>,
    gate: CompletionGate,
}

impl<T: SimTime> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, EngineState<T>> {
        // Every mutation restores queue/map consistency before it can panic.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn finish(self: &Arc<Self>, step: Step<T>) {
        self.dispatch(step.grants);
        if step.complete && self.gate.release() {
            debug!("all workers finished, simulation complete");
        }
    }

    fn dispatch(self: &Arc<Self>, grants: Grants<T>) {
        for grant in grants {
            let shared = Arc::clone(self);
            self.executor.execute(Box::new(move || shared.run_grant(grant)));
        }
    }

    fn process_advance(self: &Arc<Self>, id: WorkerId, next: T) {
        let result = self.lock().apply_advance(id, next);
        match result {
            Ok(step) => self.finish(step),
            Err(e) => self.handle_error(id, &e),
        }
    }

    fn run_grant(self: &Arc<Self>, grant: Grant<T>) {
        let Some(worker) = grant.handle.upgrade() else {
            warn!(worker = %grant.worker, "worker dropped before its grant, removing it");
            self.evict(grant.worker);
            return;
        };
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| worker.advance_granted(grant.time)));
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => self.handle_error(grant.worker, &e),
            Err(payload) => self.handle_error(grant.worker, &panic_message(payload.as_ref())),
        }
    }

    /// Isolate a failure to one worker by removing it.
    fn handle_error(self: &Arc<Self>, id: WorkerId, cause: &dyn fmt::Display) {
        let result = self.lock().remove(id);
        match result {
            Ok(Some(step)) => {
                warn!(
                    worker = %id,
                    error = %cause,
                    "error while handling worker, the worker has been removed"
                );
                self.finish(step);
            }
            Ok(None) => {
                warn!(
                    worker = %id,
                    error = %cause,
                    "worker no longer exists, but an error happened for it"
                );
            }
            Err(e) => {
                warn!(worker = %id, error = %e, "failed to remove worker after error");
            }
        }
    }

    fn evict(self: &Arc<Self>, id: WorkerId) {
        let result = self.lock().remove(id);
        match result {
            Ok(Some(step)) => {
                debug!(worker = %id, "worker removed");
                self.finish(step);
            }
            Ok(None) => {}
            Err(e) => warn!(worker = %id, error = %e, "failed to remove worker"),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic with non-string payload".to_string()
    }
}

// ── TimeManager ────────────────────────────────────────────────────

/// Lookahead-based conservative time manager.
///
/// A cheap-to-clone handle; every clone drives the same engine. Workers
/// typically hold a clone so they can request their next advance from
/// inside [`Worker::advance_granted`].
///
/// Lifecycle: register workers while the wall clock reads zero, call
/// [`start`](TimeManager::start) once, then let workers drive the run
/// through [`request_advance`](TimeManager::request_advance) until each
/// has requested past the stop time.
/// [`wait_for_end`](TimeManager::wait_for_end) blocks until then.
pub struct TimeManager<T: SimTime> {
    shared: Arc<Shared<T>>,
}

impl<T: SimTime> Clone for TimeManager<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: SimTime> TimeManager<T> {
    /// Build a time manager from a validated configuration.
    pub fn new(config: EngineConfig<T>) -> Result<Self, ConfigError> {
        config.validate()?;
        let state = EngineState::new(config.domain, config.stop_time);
        Ok(Self {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                executor: config.executor,
                gate: CompletionGate::new(),
            }),
        })
    }

    /// Add a worker to the simulation.
    ///
    /// Only valid before [`start`](TimeManager::start) and while the
    /// wall clock still reads the domain's zero. Queues a GRANT at zero
    /// and the worker's first BLOCK at `zero + lookahead`. The manager
    /// keeps only a weak reference.
    pub fn register_worker<W>(&self, worker: &Arc<W>) -> Result<(), SyncError<T>>
    where
        W: Worker<T> + 'static,
    {
        self.register_handle(worker.id(), worker.lookahead(), downgrade(worker))
    }

    /// [`register_worker`](TimeManager::register_worker) for an already
    /// type-erased worker.
    pub fn register_dyn_worker(&self, worker: &Arc<dyn Worker<T>>) -> Result<(), SyncError<T>> {
        self.register_handle(worker.id(), worker.lookahead(), Arc::downgrade(worker))
    }

    fn register_handle(
        &self,
        id: WorkerId,
        lookahead: T::Span,
        handle: Weak<dyn Worker<T>>,
    ) -> Result<(), SyncError<T>> {
        self.shared.lock().register(id, lookahead, handle)?;
        debug!(worker = %id, lookahead = ?lookahead, "worker registered");
        Ok(())
    }

    /// Remove a worker and every task it owns.
    ///
    /// No-op for unknown IDs. A callback already running for this
    /// worker is allowed to finish; its later requests are rejected.
    pub fn remove_worker(&self, id: WorkerId) {
        self.shared.evict(id);
    }

    /// Start the run, releasing every worker's zero-time grant.
    pub fn start(&self) -> Result<(), SyncError<T>> {
        let step = self.shared.lock().start()?;
        debug!(grants = step.grants.len(), "time management started");
        self.shared.finish(step);
        Ok(())
    }

    /// Ask to advance worker `id` to `next`.
    ///
    /// Validates synchronously and returns at once; the rest of the
    /// processing runs on the executor. Fails if `id` is unknown, if
    /// `next` is behind the wall clock, if `next` is earlier than the
    /// worker's last accepted request, or if `next` has already been
    /// granted. Requesting past the stop time finishes the worker.
    pub fn request_advance(&self, id: WorkerId, next: T) -> Result<(), SyncError<T>> {
        self.shared.lock().check_advance(id, next)?;
        let shared = Arc::clone(&self.shared);
        self.shared
            .executor
            .execute(Box::new(move || shared.process_advance(id, next)));
        Ok(())
    }

    /// Block until every worker has finished and no tasks remain.
    pub fn wait_for_end(&self) {
        self.shared.gate.wait();
    }

    /// Like [`wait_for_end`](TimeManager::wait_for_end), giving up after
    /// `timeout`. Returns `true` if the run completed.
    pub fn wait_for_end_timeout(&self, timeout: Duration) -> bool {
        self.shared.gate.wait_timeout(timeout)
    }

    /// Whether the run has completed.
    pub fn is_finished(&self) -> bool {
        self.shared.gate.is_open()
    }

    /// Whether [`start`](TimeManager::start) has been called.
    pub fn is_started(&self) -> bool {
        self.shared.lock().started
    }

    /// Current wall clock reading.
    pub fn wall_clock(&self) -> T {
        self.shared.lock().clock.time()
    }

    /// Current stop time.
    pub fn stop_time(&self) -> T {
        self.shared.lock().stop_time
    }

    /// Change the stop time. Takes effect at the next advance request.
    pub fn set_stop_time(&self, stop_time: T) -> Result<(), ConfigError> {
        let mut state = self.shared.lock();
        if !state.domain.contains(stop_time) {
            return Err(ConfigError::StopTimeOutOfRange {
                stop: stop_time.to_string(),
            });
        }
        state.stop_time = stop_time;
        Ok(())
    }

    /// The time domain this manager was built with.
    pub fn domain(&self) -> TimeDomain<T> {
        self.shared.lock().domain
    }

    /// Number of registered workers.
    pub fn worker_count(&self) -> usize {
        self.shared.lock().workers.len()
    }

    /// Whether `id` is registered.
    pub fn contains_worker(&self, id: WorkerId) -> bool {
        self.shared.lock().workers.contains_key(&id)
    }

    /// Last time granted to `id`; `None` if unknown or not yet granted.
    pub fn granted_time(&self, id: WorkerId) -> Option<T> {
        self.shared.lock().workers.get(&id).and_then(|w| w.granted_time)
    }

    /// Time of `id`'s last accepted advance request.
    pub fn requested_time(&self, id: WorkerId) -> Option<T> {
        self.shared.lock().workers.get(&id).map(|w| w.next_time)
    }

    /// Sorted snapshot of the task queue.
    pub fn pending_tasks(&self) -> Vec<WorkTask<T>> {
        self.shared.lock().queue.iter().copied().collect()
    }
}

impl<T: SimTime> fmt::Debug for TimeManager<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("TimeManager")
            .field("wall_clock", &state.clock.time())
            .field("stop_time", &state.stop_time)
            .field("started", &state.started)
            .field("workers", &state.workers.len())
            .field("pending_tasks", &state.queue.len())
            .finish()
    }
}
