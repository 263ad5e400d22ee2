//! Dated record model.
//!
//! A [`Record`] is one entry of the special-days list: a calendar date, a
//! [`DateType`], and three optional labels (`reason`, `source`, `tag`).
//!
//! # Invariants
//! - `date` is always a valid calendar date; the textual form is strictly
//!   `YYYY-MM-DD`, so string order and chronological order agree.
//! - `date_type` is one of the four closed kinds.
//! - An empty `source` means the record was entered by hand.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

/// Canonical textual date format.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Source reported for today's facts when the matching records carry no
/// provenance of their own.
pub const MANUAL_SOURCE: &str = "manual";

// ---------------------------------------------------------------------------
// DateType
// ---------------------------------------------------------------------------

/// Kind of special day.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DateType {
    Holiday,
    Working,
    Event,
    /// Recurs every year: rolled forward instead of expiring.
    EventAnnual,
}

impl DateType {
    pub const ALL: [DateType; 4] = [
        DateType::Holiday,
        DateType::Working,
        DateType::Event,
        DateType::EventAnnual,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DateType::Holiday => "holiday",
            DateType::Working => "working",
            DateType::Event => "event",
            DateType::EventAnnual => "event-annual",
        }
    }
}

impl fmt::Display for DateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DateType {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "holiday" => Ok(DateType::Holiday),
            "working" => Ok(DateType::Working),
            "event" => Ok(DateType::Event),
            "event-annual" => Ok(DateType::EventAnnual),
            other => Err(RecordError::UnknownDateType(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// TypeOrder
// ---------------------------------------------------------------------------

/// Tie-break between records sharing a date.
///
/// Stored data has been written under both orders, so the comparator is
/// selectable. Today's facts are derived from the first record of the run,
/// so the order decides whether a working-day override or a holiday wins.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TypeOrder {
    /// `working < event < event-annual < holiday`
    #[default]
    WorkingFirst,
    /// `holiday < event-annual < event < working`
    HolidayFirst,
}

impl TypeOrder {
    pub fn rank(&self, t: DateType) -> u8 {
        let working_first = match t {
            DateType::Working => 0,
            DateType::Event => 1,
            DateType::EventAnnual => 2,
            DateType::Holiday => 3,
        };
        match self {
            TypeOrder::WorkingFirst => working_first,
            TypeOrder::HolidayFirst => 3 - working_first,
        }
    }

    /// Total order over records: date first, then type rank.
    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        a.date
            .cmp(&b.date)
            .then_with(|| self.rank(a.date_type).cmp(&self.rank(b.date_type)))
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// A record could not be built from its textual form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// Date is not a real calendar date in `YYYY-MM-DD` form.
    InvalidDate(String),
    /// `dateType` is not one of the four known kinds.
    UnknownDateType(String),
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordError::InvalidDate(raw) => {
                write!(f, "invalid date '{raw}': expected YYYY-MM-DD")
            }
            RecordError::UnknownDateType(raw) => write!(
                f,
                "unknown dateType '{raw}': expected holiday | working | event | event-annual"
            ),
        }
    }
}

impl std::error::Error for RecordError {}

/// Parse a strict `YYYY-MM-DD` date.
///
/// Chrono alone accepts unpadded fields (`2024-1-5`), which would break the
/// string/chronological equivalence of the stored form, so the shape is
/// checked first.
pub fn parse_date(s: &str) -> Result<NaiveDate, RecordError> {
    let raw = s.trim();
    let b = raw.as_bytes();
    let shaped = b.len() == 10
        && b[4] == b'-'
        && b[7] == b'-'
        && b.iter()
            .enumerate()
            .all(|(i, c)| i == 4 || i == 7 || c.is_ascii_digit());
    if !shaped {
        return Err(RecordError::InvalidDate(raw.to_string()));
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| RecordError::InvalidDate(raw.to_string()))
}

/// Same month/day one year later. Feb 29 becomes Feb 28 in non-leap years.
pub fn next_year(date: NaiveDate) -> NaiveDate {
    let year = date.year() + 1;
    date.with_year(year)
        .or_else(|| NaiveDate::from_ymd_opt(year, date.month(), 28))
        .unwrap_or(date)
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One special day.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    #[serde(with = "iso_date")]
    pub date: NaiveDate,
    pub date_type: DateType,
    #[serde(default, deserialize_with = "null_as_empty", skip_serializing_if = "String::is_empty")]
    pub reason: String,
    #[serde(default, deserialize_with = "null_as_empty", skip_serializing_if = "String::is_empty")]
    pub source: String,
    #[serde(default, deserialize_with = "null_as_empty", skip_serializing_if = "String::is_empty")]
    pub tag: String,
}

impl Record {
    pub fn new(date: NaiveDate, date_type: DateType) -> Self {
        Self {
            date,
            date_type,
            reason: String::new(),
            source: String::new(),
            tag: String::new(),
        }
    }

    /// Build a record from its textual date and type.
    pub fn parse(date: &str, date_type: &str) -> Result<Self, RecordError> {
        Ok(Self::new(parse_date(date)?, date_type.parse()?))
    }

    pub fn holiday(date: NaiveDate, reason: impl Into<String>, source: impl Into<String>) -> Self {
        Self::new(date, DateType::Holiday)
            .with_reason(reason)
            .with_source(source)
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// `true` when nobody but a human could have written this record.
    pub fn is_manual(&self) -> bool {
        self.source.is_empty()
    }

    pub fn is_holiday(&self) -> bool {
        self.date_type == DateType::Holiday
    }

    /// Same `(date, date_type)` slot: such records are duplicates.
    pub fn same_slot(&self, other: &Record) -> bool {
        self.date == other.date && self.date_type == other.date_type
    }

    /// Fill this record's empty labels from `other`. Non-empty labels win.
    pub fn absorb(&mut self, other: &Record) {
        if self.reason.is_empty() {
            self.reason.clone_from(&other.reason);
        }
        if self.source.is_empty() {
            self.source.clone_from(&other.source);
        }
        if self.tag.is_empty() {
            self.tag.clone_from(&other.tag);
        }
    }

    pub fn date_str(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.date_str(), self.date_type)?;
        if !self.reason.is_empty() {
            write!(f, " \"{}\"", self.reason)?;
        }
        if !self.tag.is_empty() {
            write!(f, " tag={}", self.tag)?;
        }
        if !self.source.is_empty() {
            write!(f, " source={}", self.source)?;
        }
        Ok(())
    }
}

fn null_as_empty<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(de)?.unwrap_or_default())
}

mod iso_date {
    use chrono::NaiveDate;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    use super::{parse_date, DATE_FORMAT};

    pub fn serialize<S: Serializer>(date: &NaiveDate, ser: S) -> Result<S::Ok, S::Error> {
        ser.collect_str(&date.format(DATE_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(de)?;
        parse_date(&raw).map_err(D::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    #[test]
    fn parse_date_accepts_padded_iso() {
        assert_eq!(d("2024-02-29"), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn parse_date_rejects_unpadded_and_impossible_dates() {
        assert!(matches!(parse_date("2024-1-05"), Err(RecordError::InvalidDate(_))));
        assert!(matches!(parse_date("2023-02-29"), Err(RecordError::InvalidDate(_))));
        assert!(matches!(parse_date("20240105"), Err(RecordError::InvalidDate(_))));
        assert!(matches!(parse_date(""), Err(RecordError::InvalidDate(_))));
    }

    #[test]
    fn date_type_round_trips_through_text() {
        for t in DateType::ALL {
            assert_eq!(t.as_str().parse::<DateType>().unwrap(), t);
        }
        assert!(matches!(
            "other".parse::<DateType>(),
            Err(RecordError::UnknownDateType(_))
        ));
    }

    #[test]
    fn working_first_ranks_working_before_holiday() {
        let o = TypeOrder::WorkingFirst;
        assert!(o.rank(DateType::Working) < o.rank(DateType::Event));
        assert!(o.rank(DateType::Event) < o.rank(DateType::EventAnnual));
        assert!(o.rank(DateType::EventAnnual) < o.rank(DateType::Holiday));
    }

    #[test]
    fn holiday_first_reverses_ranks() {
        let o = TypeOrder::HolidayFirst;
        assert!(o.rank(DateType::Holiday) < o.rank(DateType::Working));
    }

    #[test]
    fn next_year_handles_leap_day() {
        assert_eq!(next_year(d("2024-02-29")), d("2025-02-28"));
        assert_eq!(next_year(d("2024-12-25")), d("2025-12-25"));
    }

    #[test]
    fn absorb_fills_only_empty_fields() {
        let mut lead = Record::new(d("2024-05-01"), DateType::Holiday).with_reason("May Day");
        let trail = Record::new(d("2024-05-01"), DateType::Holiday)
            .with_reason("Labour Day")
            .with_source("date.nager.at")
            .with_tag("bank");
        lead.absorb(&trail);
        assert_eq!(lead.reason, "May Day");
        assert_eq!(lead.source, "date.nager.at");
        assert_eq!(lead.tag, "bank");
    }

    #[test]
    fn serde_uses_camel_case_and_skips_empty_labels() {
        let r = Record::new(d("2024-12-25"), DateType::EventAnnual).with_reason("Xmas");
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"date": "2024-12-25", "dateType": "event-annual", "reason": "Xmas"})
        );
    }

    #[test]
    fn serde_treats_null_labels_as_empty() {
        let r: Record = serde_json::from_value(serde_json::json!({
            "date": "2024-01-01", "dateType": "holiday", "reason": null, "tag": null
        }))
        .unwrap();
        assert!(r.reason.is_empty());
        assert!(r.is_manual());
    }

    #[test]
    fn serde_rejects_malformed_date() {
        let res: Result<Record, _> =
            serde_json::from_value(serde_json::json!({"date": "2024-13-01", "dateType": "holiday"}));
        assert!(res.is_err());
    }
}
