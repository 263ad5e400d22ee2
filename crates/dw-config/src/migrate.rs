//! In-place upgrades of older snapshot layouts.
//!
//! Runs on the raw JSON document before typed deserialization. Every rewrite
//! is reported so the caller can re-save the upgraded snapshot.

use serde_json::{Map, Value};

/// Default flags used when a legacy `{day0..day6}` object lacks a day.
const DEFAULT_WORK_WEEK: [bool; 7] = [false, true, true, true, true, true, false];

/// Date of the untyped sample row older layouts shipped in `dateList`.
const PLACEHOLDER_DATE: &str = "2099-01-01";

/// One rewrite applied to a loaded document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Migration {
    /// `workWeek` stored as `{day0: bool, .., day6: bool}`.
    WorkWeekObject,
    /// `dateType` stored as 0 (holiday), 1 (other) or 2 (working).
    NumericDateType { index: usize, code: i64 },
    /// `dateType` stored as the retired `"other"` kind.
    OtherDateType { index: usize },
    /// `dateType` absent.
    MissingDateType { index: usize },
    /// Untyped sample row dated 2099-01-01, removed. `index` is its
    /// position in the list as loaded.
    PlaceholderDropped { index: usize },
    /// Tag stored under its old `rulesTag` name.
    RulesTag { index: usize },
    /// `lastRetrieved` stored as an empty string or a full timestamp.
    LastRetrieved,
}

/// Upgrade `doc` in place. Returns what was changed.
pub fn migrate(doc: &mut Value) -> Vec<Migration> {
    let mut applied = Vec::new();
    let Some(root) = doc.as_object_mut() else {
        return applied;
    };

    if let Some(ww) = root.get_mut("workWeek") {
        if let Some(days) = ww.as_object() {
            *ww = work_week_array(days);
            applied.push(Migration::WorkWeekObject);
        }
    }

    if let Some(list) = root.get_mut("dateList").and_then(Value::as_array_mut) {
        let mut index = 0;
        list.retain(|item| {
            let keep = !is_placeholder(item);
            if !keep {
                applied.push(Migration::PlaceholderDropped { index });
            }
            index += 1;
            keep
        });
        for (index, item) in list.iter_mut().enumerate() {
            if let Some(rec) = item.as_object_mut() {
                migrate_record(index, rec, &mut applied);
            }
        }
    }

    if let Some(api) = root.get_mut("api").and_then(Value::as_object_mut) {
        if let Some(Value::String(last)) = api.get("lastRetrieved") {
            let fixed = match last.trim() {
                "" => Some(Value::Null),
                s if s.len() > 10 => s.get(..10).map(|d| Value::String(d.to_string())),
                _ => None,
            };
            if let Some(v) = fixed {
                api.insert("lastRetrieved".to_string(), v);
                applied.push(Migration::LastRetrieved);
            }
        }
    }

    applied
}

fn work_week_array(days: &Map<String, Value>) -> Value {
    let flags: Vec<Value> = (0..7)
        .map(|i| {
            let flag = days
                .get(&format!("day{i}"))
                .and_then(Value::as_bool)
                .unwrap_or(DEFAULT_WORK_WEEK[i]);
            Value::Bool(flag)
        })
        .collect();
    Value::Array(flags)
}

fn is_placeholder(item: &Value) -> bool {
    let untyped = matches!(item.get("dateType"), None | Some(Value::Null));
    untyped && item.get("date").and_then(Value::as_str) == Some(PLACEHOLDER_DATE)
}

fn migrate_record(index: usize, rec: &mut Map<String, Value>, applied: &mut Vec<Migration>) {
    let replacement = match rec.get("dateType") {
        None | Some(Value::Null) => {
            applied.push(Migration::MissingDateType { index });
            Some("event")
        }
        Some(Value::Number(n)) => {
            let code = n.as_i64().unwrap_or(-1);
            let kind = match code {
                0 => Some("holiday"),
                1 => Some("event"),
                2 => Some("working"),
                // Unknown codes are left for deserialization to reject.
                _ => None,
            };
            if kind.is_some() {
                applied.push(Migration::NumericDateType { index, code });
            }
            kind
        }
        Some(Value::String(s)) if s == "other" => {
            applied.push(Migration::OtherDateType { index });
            Some("event")
        }
        Some(_) => None,
    };
    if let Some(kind) = replacement {
        rec.insert("dateType".to_string(), Value::String(kind.to_string()));
    }

    if let Some(old) = rec.remove("rulesTag") {
        let has_tag = rec
            .get("tag")
            .and_then(Value::as_str)
            .is_some_and(|t| !t.is_empty());
        if !has_tag {
            rec.insert("tag".to_string(), old);
        }
        applied.push(Migration::RulesTag { index });
    }
}
