//! dw-testkit
//!
//! Deterministic stand-ins for the runtime's collaborators: a settable clock,
//! an in-memory state store, a scripted holiday provider and a reporter that
//! records every event.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Result;
use chrono::NaiveDate;
use dw_config::{Loaded, StateSnapshot, StateStore};
use dw_core::{parse_date, Record};
use dw_provider::{ApiConfig, HolidayProvider, ProviderError};
use dw_runtime::{Clock, CycleEvent, ProviderFactory, Reporter};

/// Parse `YYYY-MM-DD`; panics on bad input.
pub fn date(s: &str) -> NaiveDate {
    match parse_date(s) {
        Ok(d) => d,
        Err(e) => panic!("bad test date '{s}': {e}"),
    }
}

/// Provider-sourced holiday.
pub fn holiday(d: &str, reason: &str, source: &str) -> Record {
    Record::holiday(date(d), reason, source)
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panicking test thread must not hide the state from the assertions.
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Clock pinned to a date until moved.
#[derive(Debug)]
pub struct FixedClock {
    today: Mutex<NaiveDate>,
}

impl FixedClock {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today: Mutex::new(today),
        }
    }

    pub fn set(&self, today: NaiveDate) {
        *lock(&self.today) = today;
    }

    pub fn advance_days(&self, days: u64) {
        let mut t = lock(&self.today);
        *t = *t + chrono::Days::new(days);
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        *lock(&self.today)
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Snapshot kept in memory; counts saves.
#[derive(Debug, Default)]
pub struct MemoryStore {
    stored: Mutex<Option<StateSnapshot>>,
    saves: Mutex<usize>,
}

impl MemoryStore {
    pub fn with_snapshot(snapshot: StateSnapshot) -> Self {
        Self {
            stored: Mutex::new(Some(snapshot)),
            saves: Mutex::new(0),
        }
    }

    pub fn saves(&self) -> usize {
        *lock(&self.saves)
    }

    pub fn stored(&self) -> Option<StateSnapshot> {
        lock(&self.stored).clone()
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<Loaded> {
        Ok(match lock(&self.stored).clone() {
            Some(snapshot) => Loaded {
                snapshot,
                migrations: Vec::new(),
                created: false,
            },
            None => Loaded::fresh(),
        })
    }

    fn save(&self, snapshot: &StateSnapshot) -> Result<()> {
        *lock(&self.stored) = Some(snapshot.clone());
        *lock(&self.saves) += 1;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Script {
    responses: VecDeque<Result<Vec<Record>, ProviderError>>,
    years: Vec<i32>,
    built_for: Vec<ApiConfig>,
}

/// Provider answering from a queue of canned responses.
///
/// An exhausted queue answers with an empty list. Clones share the queue,
/// so the same value works as the [`ProviderFactory`] and as the provider.
#[derive(Debug, Clone, Default)]
pub struct ScriptedProvider {
    script: Arc<Mutex<Script>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, records: Vec<Record>) -> Self {
        lock(&self.script).responses.push_back(Ok(records));
        self
    }

    pub fn fail(self, error: ProviderError) -> Self {
        lock(&self.script).responses.push_back(Err(error));
        self
    }

    /// Years passed to each fetch, in call order.
    pub fn calls(&self) -> Vec<i32> {
        lock(&self.script).years.clone()
    }

    /// Effective configs the factory was asked to build for.
    pub fn built_for(&self) -> Vec<ApiConfig> {
        lock(&self.script).built_for.clone()
    }
}

#[async_trait::async_trait]
impl HolidayProvider for ScriptedProvider {
    fn source_name(&self) -> &'static str {
        "scripted"
    }

    async fn fetch_holidays(&self, year: i32) -> Result<Vec<Record>, ProviderError> {
        let mut script = lock(&self.script);
        script.years.push(year);
        script.responses.pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }
}

impl ProviderFactory for ScriptedProvider {
    fn build(&self, api: &ApiConfig) -> Result<Box<dyn HolidayProvider>, ProviderError> {
        lock(&self.script).built_for.push(api.clone());
        Ok(Box::new(self.clone()))
    }
}

// ---------------------------------------------------------------------------
// Reporter
// ---------------------------------------------------------------------------

/// Keeps every reported event.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<CycleEvent>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<CycleEvent> {
        lock(&self.events).clone()
    }

    /// Drain and return the events seen so far.
    pub fn take(&self) -> Vec<CycleEvent> {
        std::mem::take(&mut *lock(&self.events))
    }

    pub fn config_problems(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                CycleEvent::ConfigProblem { status } => Some(status),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<CycleEvent> {
        self.events().into_iter().filter(CycleEvent::is_error).collect()
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, event: &CycleEvent) {
        lock(&self.events).push(event.clone());
    }
}
