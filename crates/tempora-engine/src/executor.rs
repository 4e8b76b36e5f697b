//! Execution strategies for advance processing and grant callbacks.
//!
//! The time manager never runs scheduling work or worker callbacks
//! directly; it hands each unit of work to an [`Executor`]. Two
//! strategies ship with the engine:
//!
//! - [`InlineExecutor`] runs the job on the calling thread. Fully
//!   deterministic, but every nested advance deepens the stack, so it
//!   only suits shallow simulations and tests.
//! - [`ThreadPoolExecutor`] feeds a fixed set of pool threads through a
//!   crossbeam channel, letting workers whose lookahead windows do not
//!   overlap run concurrently.

use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};
use tracing::error;

use crate::config::{ConfigError, PoolConfig};

/// A unit of work handed to an [`Executor`].
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Runs units of work on behalf of the time manager.
///
/// Implementations must eventually run every submitted job exactly
/// once. `execute` must not wait for the job to finish unless the
/// strategy is explicitly synchronous.
pub trait Executor: Send + Sync {
    /// Submit `job` for execution.
    fn execute(&self, job: Job);
}

// ── InlineExecutor ─────────────────────────────────────────────────

/// Runs every job immediately on the calling thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct InlineExecutor;

impl Executor for InlineExecutor {
    fn execute(&self, job: Job) {
        job();
    }
}

// ── ThreadPoolExecutor ─────────────────────────────────────────────

/// Fixed-size pool of named threads fed by an unbounded channel.
///
/// A job that panics is logged and discarded; the pool thread keeps
/// serving. Dropping the executor closes the channel and joins every
/// pool thread except the one doing the drop (if the last reference is
/// released from inside a job).
pub struct ThreadPoolExecutor {
    job_tx: Option<Sender<Job>>,
    threads: Vec<JoinHandle<()>>,
}

impl ThreadPoolExecutor {
    /// Spawn the pool described by `config`.
    pub fn new(config: &PoolConfig) -> Result<Self, ConfigError> {
        let count = config.resolved_worker_count();
        let (job_tx, job_rx) = crossbeam_channel::unbounded::<Job>();
        let mut threads = Vec::with_capacity(count);
        for i in 0..count {
            let rx = job_rx.clone();
            let handle = thread::Builder::new()
                .name(format!("tempora-pool-{i}"))
                .spawn(move || pool_loop(rx))
                .map_err(|e| ConfigError::ThreadSpawnFailed {
                    reason: format!("pool thread {i}: {e}"),
                })?;
            threads.push(handle);
        }
        Ok(Self {
            job_tx: Some(job_tx),
            threads,
        })
    }

    /// Number of pool threads.
    pub fn thread_count(&self) -> usize {
        self.threads.len()
    }
}

impl Executor for ThreadPoolExecutor {
    fn execute(&self, job: Job) {
        if let Some(tx) = &self.job_tx {
            if tx.send(job).is_err() {
                error!("thread pool channel closed, job dropped");
            }
        }
    }
}

impl Drop for ThreadPoolExecutor {
    fn drop(&mut self) {
        // Closing the sender ends every pool loop once the backlog drains.
        drop(self.job_tx.take());
        let current = thread::current().id();
        for handle in self.threads.drain(..) {
            if handle.thread().id() == current {
                continue;
            }
            if handle.join().is_err() {
                error!("thread pool thread panicked during shutdown");
            }
        }
    }
}

fn pool_loop(job_rx: Receiver<Job>) {
    while let Ok(job) = job_rx.recv() {
        if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
            error!("job panicked on pool thread");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::time::Duration;

    #[test]
    fn inline_runs_on_calling_thread() {
        let caller = thread::current().id();
        let ran_on = Arc::new(std::sync::Mutex::new(None));
        let slot = Arc::clone(&ran_on);
        InlineExecutor.execute(Box::new(move || {
            *slot.lock().unwrap() = Some(thread::current().id());
        }));
        assert_eq!(*ran_on.lock().unwrap(), Some(caller));
    }

    #[test]
    fn pool_runs_every_job_once() {
        let pool = ThreadPoolExecutor::new(&PoolConfig {
            worker_count: Some(4),
        })
        .unwrap();
        assert_eq!(pool.thread_count(), 4);
        let counter = Arc::new(AtomicUsize::new(0));
        let (done_tx, done_rx) = crossbeam_channel::unbounded();
        for _ in 0..100 {
            let counter = Arc::clone(&counter);
            let done_tx = done_tx.clone();
            pool.execute(Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                done_tx.send(()).unwrap();
            }));
        }
        for _ in 0..100 {
            done_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        }
        assert_eq!(counter.load(Ordering::SeqCst), 100);
    }

    #[test]
    fn pool_runs_jobs_concurrently() {
        let pool = ThreadPoolExecutor::new(&PoolConfig {
            worker_count: Some(2),
        })
        .unwrap();
        // Both jobs must be in flight at once for the barrier to release.
        let barrier = Arc::new(Barrier::new(3));
        for _ in 0..2 {
            let barrier = Arc::clone(&barrier);
            pool.execute(Box::new(move || {
                barrier.wait();
            }));
        }
        barrier.wait();
    }

    #[test]
    fn pool_survives_panicking_job() {
        let pool = ThreadPoolExecutor::new(&PoolConfig {
            worker_count: Some(1),
        })
        .unwrap();
        pool.execute(Box::new(|| panic!("boom")));
        let (tx, rx) = crossbeam_channel::bounded(1);
        pool.execute(Box::new(move || tx.send(42).unwrap()));
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 42);
    }

    #[test]
    fn drop_drains_backlog_and_joins() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let pool = ThreadPoolExecutor::new(&PoolConfig {
                worker_count: Some(2),
            })
            .unwrap();
            for _ in 0..50 {
                let counter = Arc::clone(&counter);
                pool.execute(Box::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                }));
            }
        }
        assert_eq!(counter.load(Ordering::SeqCst), 50);
    }

    #[test]
    fn drop_from_inside_a_job_does_not_deadlock() {
        let pool: Arc<dyn Executor> = Arc::new(
            ThreadPoolExecutor::new(&PoolConfig {
                worker_count: Some(1),
            })
            .unwrap(),
        );
        let (tx, rx) = crossbeam_channel::bounded(1);
        let inner = Arc::clone(&pool);
        drop(pool);
        let held = Arc::new(std::sync::Mutex::new(Some(inner)));
        let job_slot = Arc::clone(&held);
        held.lock()
            .unwrap()
            .as_ref()
            .unwrap()
            .execute(Box::new(move || {
                // Releases the last strong reference on the pool thread itself.
                job_slot.lock().unwrap().take();
                tx.send(()).unwrap();
            }));
        rx.recv_timeout(Duration::from_secs(5)).unwrap();
    }
}
