//! Criterion micro-benchmarks for task queue operations.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use tempora_bench::task_profile;
use tempora_core::Millis;
use tempora_engine::{SortedQueue, WorkTask};

fn filled(tasks: &[WorkTask<Millis>]) -> SortedQueue<WorkTask<Millis>> {
    let mut queue = SortedQueue::new();
    for &task in tasks {
        queue.add(task);
    }
    queue
}

/// Benchmark: insert 10K shuffled tasks into an empty queue.
fn bench_add_10k(c: &mut Criterion) {
    let tasks = task_profile(10_000, 64, 42);
    c.bench_function("queue_add_10k", |b| {
        b.iter(|| black_box(filled(&tasks)));
    });
}

/// Benchmark: fill with 10K tasks, then poll until empty.
fn bench_drain_10k(c: &mut Criterion) {
    let tasks = task_profile(10_000, 64, 42);
    c.bench_function("queue_drain_10k", |b| {
        b.iter(|| {
            let mut queue = filled(&tasks);
            while let Ok(task) = queue.poll() {
                black_box(task);
            }
        });
    });
}

/// Benchmark: purge one worker's tasks from a 10K-task queue.
fn bench_remove_worker_10k(c: &mut Criterion) {
    let tasks = task_profile(10_000, 64, 42);
    let victim = tasks[0].worker;
    c.bench_function("queue_remove_worker_10k", |b| {
        b.iter(|| {
            let mut queue = filled(&tasks);
            queue.remove_if(|t| t.worker == victim);
            black_box(queue.len())
        });
    });
}

criterion_group!(
    benches,
    bench_add_10k,
    bench_drain_10k,
    bench_remove_worker_10k
);
criterion_main!(benches);
