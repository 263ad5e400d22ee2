//! Daily fetch watermark.
//!
//! # Purpose
//!
//! Providers are queried at most once per calendar day. The watermark holds
//! the date of the last attempted fetch (`lastRetrieved` in the persisted
//! API config) and answers whether another fetch is due.
//!
//! # Invariants
//!
//! - A fetch is due iff the watermark is not exactly `today`.
//! - A watermark in the future (clock moved backwards) counts as due.
//! - The watermark advances only through [`FetchWatermark::accept`], which
//!   the caller invokes after a provider call, successful or not.

use chrono::NaiveDate;

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// Result of checking the watermark against today's date.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchDue {
    /// No fetch has ever been recorded.
    NeverFetched,
    /// Last fetch was on a different day.
    Due { last: NaiveDate },
    /// Already fetched today; skip the provider.
    AlreadyFetched { last: NaiveDate },
}

impl FetchDue {
    pub fn is_due(&self) -> bool {
        !matches!(self, FetchDue::AlreadyFetched { .. })
    }
}

// ---------------------------------------------------------------------------
// Watermark
// ---------------------------------------------------------------------------

/// Tracks the date of the last provider fetch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FetchWatermark {
    last_retrieved: Option<NaiveDate>,
}

impl FetchWatermark {
    /// Watermark that has never been advanced.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume from a persisted `lastRetrieved`.
    pub fn from_last(last_retrieved: Option<NaiveDate>) -> Self {
        Self { last_retrieved }
    }

    /// Read-only probe; does not move the watermark.
    pub fn check(&self, today: NaiveDate) -> FetchDue {
        match self.last_retrieved {
            None => FetchDue::NeverFetched,
            Some(last) if last == today => FetchDue::AlreadyFetched { last },
            Some(last) => FetchDue::Due { last },
        }
    }

    /// Record a fetch attempt made on `today`. Returns the prior decision.
    pub fn accept(&mut self, today: NaiveDate) -> FetchDue {
        let due = self.check(today);
        self.last_retrieved = Some(today);
        due
    }

    pub fn last(&self) -> Option<NaiveDate> {
        self.last_retrieved
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
