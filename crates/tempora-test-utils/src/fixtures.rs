//! Worker fixtures for engine tests.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tempora_core::{Millis, MillisSpan, SimTime, Worker, WorkerError, WorkerId};
use tempora_engine::TimeManager;

fn push_grant(grants: &Mutex<Vec<Millis>>, time: Millis) {
    grants
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(time);
}

fn snapshot(grants: &Mutex<Vec<Millis>>) -> Vec<Millis> {
    grants
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

// ── RecordingWorker ─────────────────────────────────────────────

/// Records every grant and never requests on its own.
///
/// Tests drive it by calling
/// [`TimeManager::request_advance`] with [`RecordingWorker::id`].
pub struct RecordingWorker {
    id: WorkerId,
    lookahead: MillisSpan,
    grants: Mutex<Vec<Millis>>,
}

impl RecordingWorker {
    pub fn new(lookahead_ms: u64) -> Arc<Self> {
        Arc::new(Self {
            id: WorkerId::next(),
            lookahead: MillisSpan::from_ms(lookahead_ms),
            grants: Mutex::new(Vec::new()),
        })
    }

    pub fn id(&self) -> WorkerId {
        self.id
    }

    /// Grant times received so far, in delivery order.
    pub fn grants(&self) -> Vec<Millis> {
        snapshot(&self.grants)
    }

    pub fn grant_count(&self) -> usize {
        self.grants
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Worker<Millis> for RecordingWorker {
    fn id(&self) -> WorkerId {
        self.id
    }

    fn lookahead(&self) -> MillisSpan {
        self.lookahead
    }

    fn advance_granted(&self, time: Millis) -> Result<(), WorkerError> {
        push_grant(&self.grants, time);
        Ok(())
    }
}

impl fmt::Debug for RecordingWorker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingWorker")
            .field("id", &self.id)
            .field("lookahead", &self.lookahead)
            .finish_non_exhaustive()
    }
}

// ── SteppingWorker ──────────────────────────────────────────────

/// Requests `granted + lookahead` from every grant until the manager
/// stops accepting its requests.
///
/// Also checks that grants arrive in non-decreasing time order; a
/// regression is remembered and reported by
/// [`saw_regression`](SteppingWorker::saw_regression).
pub struct SteppingWorker {
    id: WorkerId,
    lookahead: MillisSpan,
    manager: TimeManager<Millis>,
    grants: Mutex<Vec<Millis>>,
    regression: AtomicBool,
}

impl SteppingWorker {
    /// Create a worker and register it with `manager`.
    pub fn register(manager: &TimeManager<Millis>, lookahead_ms: u64) -> Arc<Self> {
        let worker = Arc::new(Self {
            id: WorkerId::next(),
            lookahead: MillisSpan::from_ms(lookahead_ms),
            manager: manager.clone(),
            grants: Mutex::new(Vec::new()),
            regression: AtomicBool::new(false),
        });
        if let Err(e) = manager.register_worker(&worker) {
            panic!("fixture registration failed: {e}");
        }
        worker
    }

    pub fn id(&self) -> WorkerId {
        self.id
    }

    pub fn grants(&self) -> Vec<Millis> {
        snapshot(&self.grants)
    }

    pub fn grant_count(&self) -> usize {
        self.grants
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn saw_regression(&self) -> bool {
        self.regression.load(Ordering::SeqCst)
    }

    fn record(&self, time: Millis) {
        let mut grants = self.grants.lock().unwrap_or_else(PoisonError::into_inner);
        if grants.last().is_some_and(|&last| last > time) {
            self.regression.store(true, Ordering::SeqCst);
        }
        grants.push(time);
    }
}

impl Worker<Millis> for SteppingWorker {
    fn id(&self) -> WorkerId {
        self.id
    }

    fn lookahead(&self) -> MillisSpan {
        self.lookahead
    }

    fn advance_granted(&self, time: Millis) -> Result<(), WorkerError> {
        self.record(time);
        self.manager
            .request_advance(self.id, time.after(self.lookahead))?;
        Ok(())
    }
}

impl fmt::Debug for SteppingWorker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SteppingWorker")
            .field("id", &self.id)
            .field("lookahead", &self.lookahead)
            .field("grants", &self.grant_count())
            .finish_non_exhaustive()
    }
}

// ── FailingWorker ───────────────────────────────────────────────

/// How a [`FailingWorker`] misbehaves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailMode {
    /// Return an error from the callback.
    Error,
    /// Panic inside the callback.
    Panic,
}

#[derive(Debug)]
struct InjectedFailure {
    grant: usize,
}

impl fmt::Display for InjectedFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "injected failure on grant {}", self.grant)
    }
}

impl std::error::Error for InjectedFailure {}

/// Steps like [`SteppingWorker`] but fails on its `fail_on`-th grant
/// (1-based) instead of requesting.
pub struct FailingWorker {
    id: WorkerId,
    lookahead: MillisSpan,
    manager: TimeManager<Millis>,
    fail_on: usize,
    mode: FailMode,
    invoked: AtomicUsize,
}

impl FailingWorker {
    /// Create a worker and register it with `manager`.
    pub fn register(
        manager: &TimeManager<Millis>,
        lookahead_ms: u64,
        fail_on: usize,
        mode: FailMode,
    ) -> Arc<Self> {
        let worker = Arc::new(Self {
            id: WorkerId::next(),
            lookahead: MillisSpan::from_ms(lookahead_ms),
            manager: manager.clone(),
            fail_on,
            mode,
            invoked: AtomicUsize::new(0),
        });
        if let Err(e) = manager.register_worker(&worker) {
            panic!("fixture registration failed: {e}");
        }
        worker
    }

    pub fn id(&self) -> WorkerId {
        self.id
    }

    /// Number of callback invocations, including the failing one.
    pub fn invoked(&self) -> usize {
        self.invoked.load(Ordering::SeqCst)
    }
}

impl Worker<Millis> for FailingWorker {
    fn id(&self) -> WorkerId {
        self.id
    }

    fn lookahead(&self) -> MillisSpan {
        self.lookahead
    }

    fn advance_granted(&self, time: Millis) -> Result<(), WorkerError> {
        let grant = self.invoked.fetch_add(1, Ordering::SeqCst) + 1;
        if grant == self.fail_on {
            match self.mode {
                FailMode::Error => return Err(Box::new(InjectedFailure { grant })),
                FailMode::Panic => panic!("injected panic on grant {grant}"),
            }
        }
        self.manager
            .request_advance(self.id, time.after(self.lookahead))?;
        Ok(())
    }
}

impl fmt::Debug for FailingWorker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FailingWorker")
            .field("id", &self.id)
            .field("fail_on", &self.fail_on)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}
