//! Canonical form for a special-days list.
//!
//! [`normalize`] rewrites a list in place so that:
//! - records are ordered by `(date, type rank)`;
//! - nothing is dated before `today` (annual events are rolled forward to
//!   their next occurrence instead of being dropped);
//! - no two records share a `(date, date_type)` slot.
//!
//! It does **not**:
//! - talk to providers (that is `dw-provider`)
//! - decide which provider records win (that is `dw-reconcile`)
//! - persist anything

use chrono::NaiveDate;
use tracing::debug;

use crate::record::{next_year, DateType, Record, TypeOrder};

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Normalize `list` against `today` with the default [`TypeOrder`].
///
/// Returns `true` if the list was modified in any way.
pub fn normalize(list: &mut Vec<Record>, today: NaiveDate) -> bool {
    normalize_with(list, today, TypeOrder::default())
}

/// Normalize `list` against `today` using `order` for same-date tie-breaks.
///
/// Idempotent: a second call with the same arguments returns `false`.
pub fn normalize_with(list: &mut Vec<Record>, today: NaiveDate, order: TypeOrder) -> bool {
    if list.is_empty() {
        return false;
    }

    let mut changed = sort_records(list, order);

    let (expired, rolled) = expire_head(list, today);
    if expired > 0 {
        changed = true;
    }
    if rolled > 0 {
        // Rolled-over clones were appended at the tail.
        sort_records(list, order);
    }

    let merged = merge_duplicates(list);
    if merged > 0 {
        changed = true;
    }

    if changed {
        debug!(
            %today,
            expired,
            rolled,
            merged,
            len = list.len(),
            "date list normalized"
        );
    }
    changed
}

/// `true` if `list` is already in canonical form for `today`.
pub fn is_canonical(list: &[Record], today: NaiveDate, order: TypeOrder) -> bool {
    let ordered = list
        .windows(2)
        .all(|w| order.compare(&w[0], &w[1]).is_lt());
    ordered && list.first().map_or(true, |r| r.date >= today)
}

/// Stable sort by `(date, rank)`. Returns `true` if the order changed.
pub fn sort_records(list: &mut [Record], order: TypeOrder) -> bool {
    let sorted = list
        .windows(2)
        .all(|w| order.compare(&w[0], &w[1]).is_le());
    if sorted {
        return false;
    }
    list.sort_by(|a, b| order.compare(a, b));
    true
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Drop expired records from the head of a sorted list.
///
/// Annual events are re-appended with their year advanced until they are no
/// longer expired. Returns `(expired, rolled)` counts.
fn expire_head(list: &mut Vec<Record>, today: NaiveDate) -> (usize, usize) {
    let stale = list.iter().take_while(|r| r.date < today).count();
    if stale == 0 {
        return (0, 0);
    }

    let mut rolled = 0;
    let removed: Vec<Record> = list.drain(..stale).collect();
    for mut record in removed {
        if record.date_type == DateType::EventAnnual {
            while record.date < today {
                record.date = next_year(record.date);
            }
            list.push(record);
            rolled += 1;
        }
    }
    (stale, rolled)
}

/// Fold adjacent records sharing a slot, scanning from the tail.
///
/// The leading record keeps its non-empty labels; the trailing one only fills
/// gaps. Returns the number of records removed.
fn merge_duplicates(list: &mut Vec<Record>) -> usize {
    let mut merged = 0;
    let mut i = list.len();
    while i > 1 {
        i -= 1;
        if list[i - 1].same_slot(&list[i]) {
            let trailing = list.remove(i);
            list[i - 1].absorb(&trailing);
            merged += 1;
        }
    }
    merged
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
