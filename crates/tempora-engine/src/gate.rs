//! One-shot completion gate.

use std::sync::{Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// A latch that opens once and never closes again.
///
/// Every thread blocked in [`wait`](CompletionGate::wait) is released
/// when [`release`](CompletionGate::release) is first called; later
/// releases are no-ops.
#[derive(Debug, Default)]
pub struct CompletionGate {
    open: Mutex<bool>,
    cond: Condvar,
}

impl CompletionGate {
    /// Create a closed gate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the gate. Returns `true` if this call opened it.
    pub fn release(&self) -> bool {
        let mut open = self.open.lock().unwrap_or_else(PoisonError::into_inner);
        if *open {
            return false;
        }
        *open = true;
        self.cond.notify_all();
        true
    }

    /// Whether the gate has been opened.
    pub fn is_open(&self) -> bool {
        *self.open.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block until the gate is open.
    pub fn wait(&self) {
        let mut open = self.open.lock().unwrap_or_else(PoisonError::into_inner);
        while !*open {
            open = self.cond.wait(open).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Block until the gate is open or `timeout` elapses.
    ///
    /// Returns `true` if the gate is open.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut open = self.open.lock().unwrap_or_else(PoisonError::into_inner);
        while !*open {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            open = self
                .cond
                .wait_timeout(open, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn releases_once() {
        let gate = CompletionGate::new();
        assert!(!gate.is_open());
        assert!(gate.release());
        assert!(!gate.release());
        assert!(gate.is_open());
        gate.wait();
    }

    #[test]
    fn timeout_on_closed_gate() {
        let gate = CompletionGate::new();
        assert!(!gate.wait_timeout(Duration::from_millis(20)));
    }

    #[test]
    fn wakes_all_waiters() {
        let gate = Arc::new(CompletionGate::new());
        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let gate = Arc::clone(&gate);
                thread::spawn(move || gate.wait_timeout(Duration::from_secs(5)))
            })
            .collect();
        thread::sleep(Duration::from_millis(10));
        gate.release();
        for w in waiters {
            assert!(w.join().unwrap());
        }
    }
}
