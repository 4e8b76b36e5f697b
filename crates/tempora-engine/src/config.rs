//! Engine configuration, validation, and error types.
//!
//! [`EngineConfig`] is the builder input for a
//! [`TimeManager`](crate::manager::TimeManager).
//! [`validate()`](EngineConfig::validate) checks the time-domain
//! invariants before the manager is constructed.

use std::fmt;
use std::sync::Arc;

use tempora_core::{Millis, SimTime, TimeDomain};
use thiserror::Error;

use crate::executor::{Executor, InlineExecutor};

// ── PoolConfig ─────────────────────────────────────────────────────

/// Configuration for [`ThreadPoolExecutor`](crate::executor::ThreadPoolExecutor).
#[derive(Clone, Debug, Default)]
pub struct PoolConfig {
    /// Number of pool threads. `None` = auto-detect
    /// (`available_parallelism`, clamped to `[2, 16]`).
    pub worker_count: Option<usize>,
}

impl PoolConfig {
    /// Resolve the actual thread count, applying auto-detection if `None`.
    ///
    /// Explicit values are clamped to `[1, 64]`. A pool with zero
    /// threads would accept jobs and never run them.
    pub fn resolved_worker_count(&self) -> usize {
        match self.worker_count {
            Some(n) => n.clamp(1, 64),
            None => {
                let cpus = std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(4);
                cpus.clamp(2, 16)
            }
        }
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected while validating an [`EngineConfig`] or building an
/// executor.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The domain's zero time is after its maximum.
    #[error("time domain is inverted: zero {zero} is after max {max}")]
    InvertedDomain {
        /// Rendered zero time.
        zero: String,
        /// Rendered max time.
        max: String,
    },
    /// The stop time lies outside the time domain.
    #[error("stop time {stop} is outside the time domain")]
    StopTimeOutOfRange {
        /// Rendered stop time.
        stop: String,
    },
    /// A pool thread could not be spawned.
    #[error("thread spawn failed: {reason}")]
    ThreadSpawnFailed {
        /// Description of which thread failed.
        reason: String,
    },
}

// ── EngineConfig ───────────────────────────────────────────────────

/// Complete configuration for constructing a time manager.
pub struct EngineConfig<T: SimTime> {
    /// Zero and maximum time of the simulation.
    pub domain: TimeDomain<T>,
    /// Workers requesting past this time are finished. Default: `domain.max`.
    pub stop_time: T,
    /// Strategy for advance processing and grant callbacks.
    /// Default: [`InlineExecutor`].
    pub executor: Arc<dyn Executor>,
}

impl<T: SimTime> EngineConfig<T> {
    /// Configuration over `domain` with defaults for everything else.
    pub fn new(domain: TimeDomain<T>) -> Self {
        Self {
            domain,
            stop_time: domain.max,
            executor: Arc::new(InlineExecutor),
        }
    }

    /// Replace the stop time.
    pub fn with_stop_time(mut self, stop_time: T) -> Self {
        self.stop_time = stop_time;
        self
    }

    /// Replace the executor.
    pub fn with_executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = executor;
        self
    }

    /// Validate all structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.domain.zero > self.domain.max {
            return Err(ConfigError::InvertedDomain {
                zero: self.domain.zero.to_string(),
                max: self.domain.max.to_string(),
            });
        }
        if !self.domain.contains(self.stop_time) {
            return Err(ConfigError::StopTimeOutOfRange {
                stop: self.stop_time.to_string(),
            });
        }
        Ok(())
    }
}

impl Default for EngineConfig<Millis> {
    fn default() -> Self {
        Self::new(Millis::DOMAIN)
    }
}

impl<T: SimTime> fmt::Debug for EngineConfig<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("domain", &self.domain)
            .field("stop_time", &self.stop_time)
            .finish_non_exhaustive()
    }
}
