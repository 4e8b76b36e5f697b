//! Core types and traits for the Tempora time-synchronization kernel.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the fundamental abstractions used throughout the Tempora workspace:
//! worker identifiers, the time model, the worker contract, and the
//! error types.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod time;
pub mod traits;

pub use error::{ClockError, QueueError, SyncError, WorkerError};
pub use id::WorkerId;
pub use time::{Millis, MillisSpan, SimTime, TimeDomain, WallClock};
pub use traits::Worker;
