//! Test utilities and worker fixtures for Tempora development.
//!
//! Provides ready-made [`Worker`](tempora_core::Worker) implementations
//! for engine tests and a one-shot tracing initializer:
//!
//! - [`RecordingWorker`] records every grant and never advances on its own.
//! - [`SteppingWorker`] requests `granted + lookahead` from every grant.
//! - [`FailingWorker`] steps like [`SteppingWorker`] but fails on a chosen grant.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{FailMode, FailingWorker, RecordingWorker, SteppingWorker};

use std::sync::Once;

use tracing_subscriber::EnvFilter;

/// Install a console `tracing` subscriber for tests.
///
/// Honors `RUST_LOG`, defaulting to `warn`. Safe to call from every
/// test; only the first call in a process installs anything, and an
/// already-present global subscriber is left alone.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
