//! "What is true about today" query.
//!
//! Pure function of a canonical list, the work week and the current date.
//! Never mutates the list; callers normalize first.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::record::{DateType, Record, MANUAL_SOURCE};
use crate::work_week::{weekday_index, weekday_name, WorkWeek};

/// Externally visible facts for one date.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodayFacts {
    pub is_holiday: bool,
    pub is_working_day: bool,
    /// Empty when no record for today carries a reason.
    pub reason: String,
    pub tag: String,
    /// Provenance of the facts; [`MANUAL_SOURCE`] for hand-entered records.
    pub source: String,
}

impl TodayFacts {
    /// Reason to display: the record's own, or the weekday name.
    pub fn reason_or_weekday(&self, weekday: usize) -> String {
        if self.reason.is_empty() {
            weekday_name(weekday).to_string()
        } else {
            self.reason.clone()
        }
    }
}

/// Compute today's facts.
///
/// `list` must be canonical for `today`: any record dated today is then at
/// the head, and same-dated records follow the configured type order.
pub fn todays_facts(
    list: &[Record],
    work_week: &WorkWeek,
    today: NaiveDate,
    weekday: usize,
) -> TodayFacts {
    let head = match list.first() {
        Some(r) if r.date == today => r,
        _ => {
            return TodayFacts {
                is_working_day: work_week.is_working(weekday),
                ..TodayFacts::default()
            };
        }
    };

    let is_holiday = head.date_type == DateType::Holiday;
    let is_working_day = !is_holiday
        && (head.date_type == DateType::Working || work_week.is_working(weekday));

    let mut reason: &str = "";
    let mut tag: &str = "";
    let mut source: &str = "";
    for r in list.iter().take_while(|r| r.date == today) {
        if reason.is_empty() {
            reason = r.reason.as_str();
        }
        if tag.is_empty() {
            tag = r.tag.as_str();
        }
        if source.is_empty() {
            source = r.source.as_str();
        }
    }
    if source.is_empty() && !(reason.is_empty() && tag.is_empty()) {
        source = MANUAL_SOURCE;
    }

    TodayFacts {
        is_holiday,
        is_working_day,
        reason: reason.to_string(),
        tag: tag.to_string(),
        source: source.to_string(),
    }
}

/// [`todays_facts`] with the weekday derived from `today` and the weekday
/// name substituted for a missing reason.
pub fn facts_for(list: &[Record], work_week: &WorkWeek, today: NaiveDate) -> TodayFacts {
    let weekday = weekday_index(today);
    let mut facts = todays_facts(list, work_week, today, weekday);
    facts.reason = facts.reason_or_weekday(weekday);
    facts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::parse_date;

    fn d(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    // 2024-01-10 is a Wednesday, 2024-01-13 a Saturday.
    const WED: usize = 3;
    const SAT: usize = 6;

    #[test]
    fn no_record_today_falls_back_to_work_week() {
        let list = vec![Record::new(d("2024-01-11"), DateType::Holiday)];
        let facts = todays_facts(&list, &WorkWeek::default(), d("2024-01-10"), WED);
        assert!(!facts.is_holiday);
        assert!(facts.is_working_day);
        assert_eq!(facts.reason, "");
        assert_eq!(facts.source, "");
    }

    #[test]
    fn holiday_today_is_not_a_working_day() {
        let list = vec![Record::holiday(d("2024-01-10"), "Founders Day", "date.nager.at")];
        let facts = todays_facts(&list, &WorkWeek::default(), d("2024-01-10"), WED);
        assert!(facts.is_holiday);
        assert!(!facts.is_working_day);
        assert_eq!(facts.reason, "Founders Day");
        assert_eq!(facts.source, "date.nager.at");
    }

    #[test]
    fn working_override_on_weekend() {
        let list = vec![Record::new(d("2024-01-13"), DateType::Working).with_reason("Make-up day")];
        let facts = todays_facts(&list, &WorkWeek::default(), d("2024-01-13"), SAT);
        assert!(!facts.is_holiday);
        assert!(facts.is_working_day);
        assert_eq!(facts.source, MANUAL_SOURCE);
    }

    #[test]
    fn event_follows_work_week() {
        let list = vec![Record::new(d("2024-01-13"), DateType::Event).with_tag("party")];
        let facts = todays_facts(&list, &WorkWeek::default(), d("2024-01-13"), SAT);
        assert!(!facts.is_working_day);
        assert_eq!(facts.tag, "party");
        assert_eq!(facts.source, MANUAL_SOURCE);
    }

    #[test]
    fn labels_are_first_non_empty_per_field() {
        let list = vec![
            Record::new(d("2024-01-10"), DateType::Working).with_tag("office"),
            Record::holiday(d("2024-01-10"), "Founders Day", "calendarific.com"),
            Record::new(d("2024-01-11"), DateType::Event).with_reason("tomorrow"),
        ];
        let facts = todays_facts(&list, &WorkWeek::default(), d("2024-01-10"), WED);
        assert!(!facts.is_holiday);
        assert!(facts.is_working_day);
        assert_eq!(facts.reason, "Founders Day");
        assert_eq!(facts.tag, "office");
        assert_eq!(facts.source, "calendarific.com");
    }

    #[test]
    fn bare_record_leaves_source_empty() {
        let list = vec![Record::new(d("2024-01-10"), DateType::Event)];
        let facts = todays_facts(&list, &WorkWeek::default(), d("2024-01-10"), WED);
        assert_eq!(facts.source, "");
    }

    #[test]
    fn facts_for_substitutes_weekday_name() {
        let facts = facts_for(&[], &WorkWeek::default(), d("2024-01-10"));
        assert_eq!(facts.reason, "Wednesday");
        assert!(facts.is_working_day);
    }

    #[test]
    fn query_does_not_mutate_list() {
        let list = vec![Record::holiday(d("2024-01-10"), "X", "p")];
        let before = list.clone();
        let _ = todays_facts(&list, &WorkWeek::default(), d("2024-01-10"), WED);
        assert_eq!(list, before);
    }
}
