//! Reconciliation context: the single owner of one location's state.
//!
//! Everything the cycle mutates lives here and is passed in explicitly;
//! there is no process-wide instance.

use std::time::Duration;

use chrono::NaiveDate;
use dw_config::{ResolvedSecrets, StateSnapshot};
use dw_core::{facts_for, normalize_with, DateType, Record, TodayFacts, WorkWeek};
use dw_provider::ApiConfig;
use dw_reconcile::FetchWatermark;

use crate::DEFAULT_FETCH_TIMEOUT;

/// Local list, work week, provider config and fetch bookkeeping.
#[derive(Debug, Clone)]
pub struct ReconcileContext {
    pub snapshot: StateSnapshot,
    pub secrets: ResolvedSecrets,
    pub fetch_timeout: Duration,
    /// Config whose problem was last reported; suppresses repeats.
    pub(crate) reported_config: Option<(String, String, String, String)>,
    /// Facts from the most recent cycle.
    pub last_facts: Option<TodayFacts>,
}

impl ReconcileContext {
    pub fn new(snapshot: StateSnapshot) -> Self {
        Self {
            snapshot,
            secrets: ResolvedSecrets::default(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            reported_config: None,
            last_facts: None,
        }
    }

    pub fn with_secrets(mut self, secrets: ResolvedSecrets) -> Self {
        self.secrets = secrets;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn records(&self) -> &[Record] {
        &self.snapshot.date_list
    }

    pub fn work_week(&self) -> &WorkWeek {
        &self.snapshot.work_week
    }

    pub fn api(&self) -> &ApiConfig {
        &self.snapshot.api
    }

    /// Provider config with environment secrets applied. Never persisted.
    pub fn effective_api(&self) -> ApiConfig {
        self.secrets.apply(&self.snapshot.api)
    }

    pub fn watermark(&self) -> FetchWatermark {
        FetchWatermark::from_last(self.snapshot.api.last_retrieved)
    }

    /// Bring the list into canonical form for `today`.
    pub fn normalize(&mut self, today: NaiveDate) -> bool {
        normalize_with(&mut self.snapshot.date_list, today, self.snapshot.type_order)
    }

    /// Facts for `today` without touching the stored list.
    ///
    /// Works on a normalized copy so a stale head cannot leak into the answer.
    pub fn facts(&self, today: NaiveDate) -> TodayFacts {
        let mut list = self.snapshot.date_list.clone();
        normalize_with(&mut list, today, self.snapshot.type_order);
        facts_for(&list, &self.snapshot.work_week, today)
    }

    // -----------------------------------------------------------------------
    // Hand edits
    // -----------------------------------------------------------------------

    /// Add a hand-entered record and re-normalize. Returns `true` if the list
    /// changed (a record for the same slot absorbs the new labels instead).
    pub fn add_record(&mut self, record: Record, today: NaiveDate) -> bool {
        let before = self.snapshot.date_list.clone();
        self.snapshot.date_list.insert(0, record);
        self.normalize(today);
        self.snapshot.date_list != before
    }

    /// Remove records on `date`, optionally only those of `date_type`.
    /// Returns how many were removed.
    pub fn remove_records(&mut self, date: NaiveDate, date_type: Option<DateType>) -> usize {
        let before = self.snapshot.date_list.len();
        self.snapshot
            .date_list
            .retain(|r| !(r.date == date && date_type.map_or(true, |t| r.date_type == t)));
        before - self.snapshot.date_list.len()
    }

    pub fn set_work_week(&mut self, work_week: WorkWeek) -> bool {
        let changed = self.snapshot.work_week != work_week;
        self.snapshot.work_week = work_week;
        changed
    }

    /// Forget the fetch watermark so the next cycle fetches again.
    pub fn force_fetch(&mut self) {
        self.snapshot.api.last_retrieved = None;
    }
}
