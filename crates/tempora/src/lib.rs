//! Tempora: conservative time management for parallel discrete-event simulation.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the Tempora sub-crates. For most users, adding `tempora` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use tempora::prelude::*;
//!
//! // A worker that asks for its next step from inside every grant.
//! struct Ticker {
//!     id: WorkerId,
//!     manager: TimeManager<Millis>,
//!     seen: Mutex<Vec<Millis>>,
//! }
//!
//! impl Worker<Millis> for Ticker {
//!     fn id(&self) -> WorkerId { self.id }
//!     fn lookahead(&self) -> MillisSpan { MillisSpan::from_ms(100) }
//!     fn advance_granted(&self, time: Millis) -> Result<(), WorkerError> {
//!         self.seen.lock().unwrap().push(time);
//!         self.manager.request_advance(self.id, time.after(self.lookahead()))?;
//!         Ok(())
//!     }
//! }
//!
//! let config = EngineConfig::default().with_stop_time(Millis::from_ms(500));
//! let manager = TimeManager::new(config).unwrap();
//! let ticker = Arc::new(Ticker {
//!     id: WorkerId::next(),
//!     manager: manager.clone(),
//!     seen: Mutex::new(Vec::new()),
//! });
//! manager.register_worker(&ticker).unwrap();
//! manager.start().unwrap();
//! manager.wait_for_end();
//!
//! // Granted at 0, 100, .., 500.
//! assert_eq!(ticker.seen.lock().unwrap().len(), 6);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `tempora-core` | Time model, worker IDs, the `Worker` trait, errors |
//! | [`engine`] | `tempora-engine` | Time manager, task queue, executors, configuration |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, traits, and IDs (`tempora-core`).
///
/// Contains the [`types::SimTime`] abstraction with its millisecond
/// instance [`types::Millis`], the [`types::Worker`] trait, and the
/// error types returned by the manager.
pub use tempora_core as types;

/// Time management engine (`tempora-engine`).
///
/// [`engine::TimeManager`] drives the run; [`engine::InlineExecutor`]
/// and [`engine::ThreadPoolExecutor`] decide where its work executes.
pub use tempora_engine as engine;

/// Common imports for typical Tempora usage.
///
/// ```rust
/// use tempora::prelude::*;
/// ```
pub mod prelude {
    // Time model and workers
    pub use tempora_core::{
        Millis, MillisSpan, SimTime, TimeDomain, Worker, WorkerError, WorkerId,
    };

    // Errors
    pub use tempora_core::SyncError;
    pub use tempora_engine::ConfigError;

    // Engine
    pub use tempora_engine::{
        EngineConfig, Executor, InlineExecutor, PoolConfig, ThreadPoolExecutor, TimeManager,
    };
}
