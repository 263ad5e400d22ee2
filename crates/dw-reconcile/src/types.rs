use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A local holiday as seen by the sweep: its position in the local list plus
/// the fields the sweep compares.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HolidayRef {
    pub index: usize,
    pub date: NaiveDate,
    pub source: String,
    pub reason: String,
}

impl HolidayRef {
    pub fn is_manual(&self) -> bool {
        self.source.is_empty()
    }
}

/// One committed change to the local list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MergeAction {
    /// Candidate absent locally; appended.
    Inserted {
        date: NaiveDate,
        reason: String,
        source: String,
    },
    /// Same date on both sides; local labels overwritten from the candidate.
    Updated {
        date: NaiveDate,
        old_reason: String,
        new_reason: String,
        source: String,
    },
    /// Provider holiday no longer offered by the provider; removed.
    Deleted {
        date: NaiveDate,
        reason: String,
        source: String,
    },
}

/// The sweep reached a state it cannot make progress from.
///
/// Never expected in practice. Changes committed before the fault stay in
/// place; the caller must not retry with the same inputs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SweepFault {
    /// A stored index no longer points at the holiday it was taken from.
    StaleIndex {
        index: usize,
        expected: NaiveDate,
    },
    /// More delete-and-restart rounds than there were records to delete.
    NoProgress { restarts: usize, budget: usize },
}

impl fmt::Display for SweepFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SweepFault::StaleIndex { index, expected } => write!(
                f,
                "merge sweep aborted: local index {index} no longer holds the holiday dated {expected}"
            ),
            SweepFault::NoProgress { restarts, budget } => write!(
                f,
                "merge sweep aborted: {restarts} restarts exceeded budget of {budget}"
            ),
        }
    }
}

impl std::error::Error for SweepFault {}

/// Outcome of one merge.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Committed changes, in the order they were applied.
    pub actions: Vec<MergeAction>,
    /// Provider-stale holidays left alone because they were entered by hand.
    pub skipped_manual: usize,
    /// Candidates dropped because they were not holidays.
    pub discarded: usize,
    /// Set when the sweep aborted.
    pub fault: Option<SweepFault>,
}

impl MergeReport {
    pub fn changed(&self) -> bool {
        !self.actions.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        self.fault.is_none()
    }

    pub fn inserted(&self) -> usize {
        self.count(|a| matches!(a, MergeAction::Inserted { .. }))
    }

    pub fn updated(&self) -> usize {
        self.count(|a| matches!(a, MergeAction::Updated { .. }))
    }

    pub fn deleted(&self) -> usize {
        self.count(|a| matches!(a, MergeAction::Deleted { .. }))
    }

    fn count(&self, pred: impl Fn(&MergeAction) -> bool) -> usize {
        self.actions.iter().filter(|a| pred(a)).count()
    }
}
