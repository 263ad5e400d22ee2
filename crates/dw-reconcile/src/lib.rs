//! dw-reconcile
//!
//! Merge engine: splices a provider's holiday list into the local list.
//!
//! Architectural decisions:
//! - Only holidays take part; working days and events are purely local
//! - Hand-entered holidays (empty source) are never deleted
//! - Provider holidays absent from a fresh fetch are deleted
//! - Every deletion rebuilds the holiday index and restarts the sweep
//! - The local list is always re-normalized after a change
//!
//! Deterministic, pure logic. No IO. No provider calls.

mod engine;
mod types;
pub mod watermark;

pub use engine::{holiday_refs, merge, merge_with};
pub use types::*;
pub use watermark::{FetchDue, FetchWatermark};
