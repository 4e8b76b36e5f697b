//! Benchmark profiles and utilities for the Tempora time manager.
//!
//! - [`lookahead_profile`]: deterministic lookaheads from a seed
//! - [`inline_manager`] / [`pooled_manager`]: managers ready for registration
//! - [`task_profile`]: a shuffled batch of queue tasks

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::sync::Arc;

use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use tempora_core::{Millis, WorkerId};
use tempora_engine::{
    ConfigError, EngineConfig, Executor, PoolConfig, ThreadPoolExecutor, TimeManager, WorkTask,
};

/// Generate `n` lookaheads in `[min_ms, min_ms + spread_ms)`.
///
/// The same seed always yields the same profile.
pub fn lookahead_profile(n: usize, min_ms: u64, spread_ms: u64, seed: u64) -> Vec<u64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n)
        .map(|_| min_ms + rng.next_u64() % spread_ms.max(1))
        .collect()
}

/// Manager on the inline executor stopping at `stop_ms`.
pub fn inline_manager(stop_ms: u64) -> Result<TimeManager<Millis>, ConfigError> {
    TimeManager::new(EngineConfig::default().with_stop_time(Millis::from_ms(stop_ms)))
}

/// Manager on a `threads`-wide pool stopping at `stop_ms`.
pub fn pooled_manager(stop_ms: u64, threads: usize) -> Result<TimeManager<Millis>, ConfigError> {
    let pool = ThreadPoolExecutor::new(&PoolConfig {
        worker_count: Some(threads),
    })?;
    let pool: Arc<dyn Executor> = Arc::new(pool);
    TimeManager::new(
        EngineConfig::default()
            .with_stop_time(Millis::from_ms(stop_ms))
            .with_executor(pool),
    )
}

/// `n` tasks spread over `workers` workers, alternating GRANT and
/// BLOCK, in seeded random order.
pub fn task_profile(n: usize, workers: usize, seed: u64) -> Vec<WorkTask<Millis>> {
    let ids: Vec<WorkerId> = (0..workers.max(1)).map(|_| WorkerId::next()).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            let time = Millis::from_ms(rng.next_u64() % 100_000);
            let worker = ids[i % ids.len()];
            if i % 2 == 0 {
                WorkTask::grant(time, worker)
            } else {
                WorkTask::block(time, worker)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookahead_profile_in_range_and_deterministic() {
        let a = lookahead_profile(100, 100, 50, 42);
        let b = lookahead_profile(100, 100, 50, 42);
        assert_eq!(a, b);
        assert!(a.iter().all(|&l| (100..150).contains(&l)));
    }

    #[test]
    fn managers_build() {
        assert!(inline_manager(1000).is_ok());
        let tm = pooled_manager(1000, 2).unwrap();
        assert_eq!(tm.stop_time(), Millis::from_ms(1000));
    }

    #[test]
    fn task_profile_length() {
        let tasks = task_profile(64, 4, 7);
        assert_eq!(tasks.len(), 64);
        assert_eq!(tasks.iter().filter(|t| t.is_grant()).count(), 32);
    }
}
