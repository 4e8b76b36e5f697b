//! Integration test: self-driven runs to the stop time.
//!
//! Each worker requests `granted + lookahead` from inside its own
//! callback until it passes the stop time. A worker with lookahead `L`
//! under stop time `S` is granted `0, L, 2L, ..` up to `S`, which is
//! `S / L + 1` grants.

use std::sync::Arc;
use std::time::Duration;

use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use tempora_core::Millis;
use tempora_engine::{EngineConfig, Executor, PoolConfig, ThreadPoolExecutor, TimeManager};
use tempora_test_utils::{init_tracing, SteppingWorker};

const WAIT: Duration = Duration::from_secs(60);

fn pooled(stop_ms: u64) -> TimeManager<Millis> {
    init_tracing();
    let pool = ThreadPoolExecutor::new(&PoolConfig::default()).unwrap();
    let pool: Arc<dyn Executor> = Arc::new(pool);
    let config = EngineConfig::default()
        .with_stop_time(Millis::from_ms(stop_ms))
        .with_executor(pool);
    TimeManager::new(config).unwrap()
}

fn expected_grants(stop_ms: u64, lookahead_ms: u64) -> usize {
    (stop_ms / lookahead_ms + 1) as usize
}

#[test]
fn inline_single_worker_runs_to_stop() {
    init_tracing();
    let tm = TimeManager::new(EngineConfig::default().with_stop_time(Millis::from_ms(1000)))
        .unwrap();
    let w = SteppingWorker::register(&tm, 100);
    tm.start().unwrap();
    // Inline processing finishes the whole run inside start().
    assert!(tm.is_finished());
    assert_eq!(w.grant_count(), 11);
    assert_eq!(w.grants().last(), Some(&Millis::from_ms(1000)));
    assert!(!w.saw_regression());
}

#[test]
fn pooled_single_worker_runs_to_stop() {
    let tm = pooled(1000);
    let w = SteppingWorker::register(&tm, 100);
    tm.start().unwrap();
    assert!(tm.wait_for_end_timeout(WAIT));
    assert_eq!(w.grant_count(), 11);
    assert!(tm.pending_tasks().is_empty());
}

#[test]
fn pooled_mixed_lookaheads() {
    let tm = pooled(10_000);
    let w50 = SteppingWorker::register(&tm, 50);
    let w100 = SteppingWorker::register(&tm, 100);
    let w120 = SteppingWorker::register(&tm, 120);
    tm.start().unwrap();
    assert!(tm.wait_for_end_timeout(WAIT));

    assert_eq!(w50.grant_count(), 201);
    assert_eq!(w100.grant_count(), 101);
    assert_eq!(w120.grant_count(), 84);
    for w in [&w50, &w100, &w120] {
        assert!(!w.saw_regression(), "{w:?} saw a grant regression");
    }
}

#[test]
fn pooled_many_random_lookaheads() {
    const STOP: u64 = 10_000;
    let tm = pooled(STOP);
    let mut rng = ChaCha8Rng::seed_from_u64(0x7e5a);
    let workers: Vec<(u64, Arc<SteppingWorker>)> = (0..250)
        .map(|_| {
            let lookahead = rng.next_u64() % 50 + 100;
            (lookahead, SteppingWorker::register(&tm, lookahead))
        })
        .collect();
    assert_eq!(tm.worker_count(), 250);

    tm.start().unwrap();
    assert!(tm.wait_for_end_timeout(WAIT));

    for (lookahead, w) in &workers {
        assert_eq!(
            w.grant_count(),
            expected_grants(STOP, *lookahead),
            "lookahead {lookahead}"
        );
        assert!(!w.saw_regression());
    }
}

#[test]
fn worker_removed_before_start_gets_nothing() {
    let tm = pooled(1000);
    let gone = SteppingWorker::register(&tm, 50);
    let kept = SteppingWorker::register(&tm, 100);
    tm.remove_worker(gone.id());
    tm.start().unwrap();
    assert!(tm.wait_for_end_timeout(WAIT));
    assert_eq!(gone.grant_count(), 0);
    assert_eq!(kept.grant_count(), 11);
}

#[test]
fn lowered_stop_time_shortens_run() {
    let tm = pooled(10_000);
    tm.set_stop_time(Millis::from_ms(500)).unwrap();
    let w = SteppingWorker::register(&tm, 100);
    tm.start().unwrap();
    assert!(tm.wait_for_end_timeout(WAIT));
    assert_eq!(w.grant_count(), 6);
}

#[test]
fn wall_clock_never_passes_stop_time() {
    let tm = pooled(1000);
    let workers: Vec<_> = [30, 70, 110]
        .into_iter()
        .map(|l| SteppingWorker::register(&tm, l))
        .collect();
    tm.start().unwrap();
    assert!(tm.wait_for_end_timeout(WAIT));
    assert!(tm.wall_clock() <= Millis::from_ms(1000));
    for w in &workers {
        assert!(w.grants().iter().all(|&t| t <= Millis::from_ms(1000)));
    }
}
