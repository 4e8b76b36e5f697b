//! Conservative time management for parallel discrete-event simulation.
//!
//! Provides the [`TimeManager`] that lets independently executing
//! workers advance through logical time without violating causality,
//! backed by a sorted task queue, per-worker synchronization state,
//! and a pluggable [`Executor`] (inline or thread pool).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod executor;
pub mod gate;
pub mod manager;
pub mod queue;
pub mod task;
mod worker;

pub use config::{ConfigError, EngineConfig, PoolConfig};
pub use executor::{Executor, InlineExecutor, Job, ThreadPoolExecutor};
pub use gate::CompletionGate;
pub use manager::TimeManager;
pub use queue::SortedQueue;
pub use task::{TaskKind, WorkTask};
