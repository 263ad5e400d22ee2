//! Work week: which weekdays are ordinary working days.
//!
//! Indexed by weekday with 0 = Sunday, matching
//! [`chrono::Weekday::num_days_from_sunday`].

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

const WEEKDAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

const WEEKDAY_ABBREVS: [&str; 7] = ["sun", "mon", "tue", "wed", "thu", "fri", "sat"];

/// Seven working-day flags, Sunday first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkWeek(pub [bool; 7]);

impl Default for WorkWeek {
    /// Western week: Monday to Friday.
    fn default() -> Self {
        Self([false, true, true, true, true, true, false])
    }
}

impl WorkWeek {
    pub fn is_working(&self, weekday: usize) -> bool {
        self.0.get(weekday).copied().unwrap_or(false)
    }

    /// Parse a comma separated list of day abbreviations, e.g. `mon,tue,wed`.
    pub fn from_days(days: &str) -> Result<Self, String> {
        let mut flags = [false; 7];
        for part in days.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let key = part.to_ascii_lowercase();
            let idx = WEEKDAY_ABBREVS
                .iter()
                .position(|a| key.starts_with(a))
                .ok_or_else(|| format!("unknown weekday '{part}'"))?;
            flags[idx] = true;
        }
        Ok(Self(flags))
    }

    /// Inverse of [`WorkWeek::from_days`].
    pub fn to_days(&self) -> String {
        WEEKDAY_ABBREVS
            .iter()
            .zip(self.0.iter())
            .filter(|(_, on)| **on)
            .map(|(a, _)| *a)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Weekday index of `date`, 0 = Sunday.
pub fn weekday_index(date: NaiveDate) -> usize {
    date.weekday().num_days_from_sunday() as usize
}

/// English weekday name for an index, 0 = Sunday.
pub fn weekday_name(weekday: usize) -> &'static str {
    WEEKDAY_NAMES.get(weekday).copied().unwrap_or("")
}
