//! Persisted state: one JSON document per location.

use anyhow::{Context, Result};
use dw_core::{Record, TypeOrder, WorkWeek};
use dw_provider::ApiConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::migrate::{migrate, Migration};

/// Everything that survives a restart.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StateSnapshot {
    pub work_week: WorkWeek,
    pub date_list: Vec<Record>,
    pub api: ApiConfig,
    /// Same-date tie-break the list was normalized under.
    pub type_order: TypeOrder,
}

/// A snapshot plus what loading had to do to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Loaded {
    pub snapshot: StateSnapshot,
    pub migrations: Vec<Migration>,
    /// Nothing was stored yet; `snapshot` is the default state.
    pub created: bool,
}

impl Loaded {
    pub fn fresh() -> Self {
        Self {
            snapshot: StateSnapshot::default(),
            migrations: Vec::new(),
            created: true,
        }
    }

    /// The stored copy differs from `snapshot` and should be re-saved.
    pub fn is_dirty(&self) -> bool {
        self.created || !self.migrations.is_empty()
    }
}

impl StateSnapshot {
    /// Parse a stored document, upgrading legacy layouts first.
    pub fn from_json_str(raw: &str) -> Result<Loaded> {
        let mut doc: Value = serde_json::from_str(raw).context("state is not valid json")?;
        let migrations = migrate(&mut doc);
        let snapshot: StateSnapshot =
            serde_json::from_value(doc).context("state does not match the snapshot schema")?;
        Ok(Loaded {
            snapshot,
            migrations,
            created: false,
        })
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("state serialize failed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dw_core::{parse_date, DateType};

    #[test]
    fn empty_document_gives_defaults() {
        let loaded = StateSnapshot::from_json_str("{}").unwrap();
        assert_eq!(loaded.snapshot, StateSnapshot::default());
        assert!(!loaded.is_dirty());
    }

    #[test]
    fn legacy_document_loads_and_is_dirty() {
        let raw = r#"{
            "workWeek": {"day0": false, "day1": true, "day2": true, "day3": true,
                         "day4": true, "day5": true, "day6": false},
            "dateList": [
                {"date": "2024-12-25", "dateType": 0, "reason": "Christmas", "rulesTag": "xmas"},
                {"date": "2099-01-01"},
                {"date": "2030-02-02", "reason": "Offsite"}
            ],
            "api": {"provider": "date.nager.at", "country": "DE", "region": "DE-BY",
                    "lastRetrieved": "", "status": "ok"}
        }"#;
        let loaded = StateSnapshot::from_json_str(raw).unwrap();
        assert!(loaded.is_dirty());

        let s = &loaded.snapshot;
        assert_eq!(s.work_week, WorkWeek::default());
        assert_eq!(s.date_list[0].date_type, DateType::Holiday);
        assert_eq!(s.date_list[0].tag, "xmas");
        assert_eq!(s.date_list.len(), 2);
        assert_eq!(s.date_list[1].date_type, DateType::Event);
        assert_eq!(s.date_list[1].reason, "Offsite");
        assert!(loaded.migrations.contains(&Migration::PlaceholderDropped { index: 1 }));
        assert_eq!(s.api.last_retrieved, None);
        assert_eq!(s.type_order, TypeOrder::WorkingFirst);
    }

    #[test]
    fn malformed_date_is_rejected() {
        let raw = r#"{"dateList": [{"date": "2024-13-01", "dateType": "holiday"}]}"#;
        assert!(StateSnapshot::from_json_str(raw).is_err());
    }

    #[test]
    fn unknown_date_type_is_rejected() {
        let raw = r#"{"dateList": [{"date": "2024-01-01", "dateType": "birthday"}]}"#;
        assert!(StateSnapshot::from_json_str(raw).is_err());
    }

    #[test]
    fn saved_form_reloads_clean() {
        let mut s = StateSnapshot::default();
        s.date_list.push(Record::holiday(
            parse_date("2024-05-01").unwrap(),
            "May Day",
            "date.nager.at",
        ));
        s.type_order = TypeOrder::HolidayFirst;

        let raw = s.to_json_pretty().unwrap();
        assert!(raw.contains("\"typeOrder\": \"holiday-first\""));
        let loaded = StateSnapshot::from_json_str(&raw).unwrap();
        assert!(!loaded.is_dirty());
        assert_eq!(loaded.snapshot, s);
    }
}
