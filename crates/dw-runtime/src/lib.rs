//! dw-runtime
//!
//! Drives the engine: one reconciliation cycle per tick or request.
//!
//! Architectural decisions:
//! - All mutable state lives in an explicit [`ReconcileContext`]
//! - Clock, provider construction and event reporting are injected
//! - The provider fetch is the only await point; merge runs once its result is in
//! - At most one fetch per calendar day, gated by the `lastRetrieved` watermark
//! - Persistence is the caller's job, driven by [`CycleReport::dirty`]

use std::time::Duration;

mod clock;
mod context;
mod cycle;
mod events;

pub use clock::{Clock, SystemClock};
pub use context::ReconcileContext;
pub use cycle::{cycle_and_save, run_cycle, CycleReport, HttpProviders, MergeCounts, ProviderFactory};
pub use events::{CycleEvent, Fanout, Reporter, TracingReporter};

/// Provider timeout when none is configured.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);
