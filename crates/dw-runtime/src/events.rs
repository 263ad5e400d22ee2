//! One-way notifications emitted by a reconciliation cycle.

use chrono::NaiveDate;
use dw_core::TodayFacts;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

/// Everything a cycle tells the outside world.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CycleEvent {
    /// The stored list was out of canonical form and has been rewritten.
    Normalized { today: NaiveDate, len: usize },
    /// Provider settings are incomplete; no fetch until they change.
    ConfigProblem { status: String },
    /// A provider fetch finished, successfully or not.
    Fetched {
        provider: String,
        status: String,
        candidates: usize,
    },
    /// Candidates were merged into the local list.
    Merged {
        inserted: usize,
        updated: usize,
        deleted: usize,
        skipped_manual: usize,
    },
    /// The merge sweep aborted. Fatal for this cycle only.
    MergeFault { message: String },
    /// Facts for `date`, computed after all list changes.
    Today { date: NaiveDate, facts: TodayFacts },
}

impl CycleEvent {
    pub fn is_error(&self) -> bool {
        matches!(self, CycleEvent::MergeFault { .. })
    }

    /// Status-class events: the ones a user-facing status line shows.
    pub fn status_line(&self) -> Option<&str> {
        match self {
            CycleEvent::ConfigProblem { status } | CycleEvent::Fetched { status, .. } => {
                Some(status)
            }
            CycleEvent::MergeFault { message } => Some(message),
            _ => None,
        }
    }
}

/// Receives cycle events. Implementations must not block.
pub trait Reporter: Send + Sync {
    fn report(&self, event: &CycleEvent);
}

/// Writes every event to the `tracing` subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, event: &CycleEvent) {
        match event {
            CycleEvent::Normalized { today, len } => info!(%today, len, "date list normalized"),
            CycleEvent::ConfigProblem { status } => warn!(%status, "provider not usable"),
            CycleEvent::Fetched {
                provider,
                status,
                candidates,
            } => info!(%provider, %status, candidates, "provider fetch finished"),
            CycleEvent::Merged {
                inserted,
                updated,
                deleted,
                skipped_manual,
            } => info!(inserted, updated, deleted, skipped_manual, "holidays merged"),
            CycleEvent::MergeFault { message } => error!(%message, "merge fault"),
            CycleEvent::Today { date, facts } => info!(
                %date,
                is_holiday = facts.is_holiday,
                is_working_day = facts.is_working_day,
                reason = %facts.reason,
                "today"
            ),
        }
    }
}

/// Forwards each event to every wrapped reporter in turn.
pub struct Fanout<'a>(pub Vec<&'a dyn Reporter>);

impl Reporter for Fanout<'_> {
    fn report(&self, event: &CycleEvent) {
        for r in &self.0 {
            r.report(event);
        }
    }
}
