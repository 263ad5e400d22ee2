//! dw-core
//!
//! Special-days data model and the two pure passes over it:
//! - `normalizer`: canonical ordering, expiry, annual rollover, dedupe
//! - `today`: the "what is true about today" query
//!
//! Deterministic, pure logic. No IO, no wall-clock. Callers provide `today`.

pub mod normalizer;
pub mod record;
pub mod today;
pub mod work_week;

pub use normalizer::{is_canonical, normalize, normalize_with, sort_records};
pub use record::{
    next_year, parse_date, DateType, Record, RecordError, TypeOrder, DATE_FORMAT, MANUAL_SOURCE,
};
pub use today::{facts_for, todays_facts, TodayFacts};
pub use work_week::{weekday_index, weekday_name, WorkWeek};
