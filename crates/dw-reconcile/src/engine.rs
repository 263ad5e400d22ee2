use std::cmp::Ordering;
use std::collections::BTreeSet;

use chrono::NaiveDate;
use dw_core::{normalize_with, Record, TypeOrder};
use tracing::{debug, error, warn};

use crate::{HolidayRef, MergeAction, MergeReport, SweepFault};

/// Holidays of `local` in ascending date order, with their list indices.
///
/// Ties keep list order, so duplicate-dated legacy holidays stay adjacent.
pub fn holiday_refs(local: &[Record]) -> Vec<HolidayRef> {
    let mut refs: Vec<HolidayRef> = local
        .iter()
        .enumerate()
        .filter(|(_, r)| r.is_holiday())
        .map(|(index, r)| HolidayRef {
            index,
            date: r.date,
            source: r.source.clone(),
            reason: r.reason.clone(),
        })
        .collect();
    refs.sort_by_key(|r| r.date);
    refs
}

/// Merge provider `candidates` into `local` with the default [`TypeOrder`].
pub fn merge<I>(candidates: I, local: &mut Vec<Record>, today: NaiveDate) -> MergeReport
where
    I: IntoIterator<Item = Record>,
{
    merge_with(candidates, local, today, TypeOrder::default())
}

/// Merge provider `candidates` into `local`.
///
/// - Candidate holidays missing locally are appended.
/// - Provider holidays the candidates no longer contain are deleted.
/// - Hand-entered holidays are never deleted.
/// - Same-dated holidays take the candidate's reason and source.
///
/// `local` is re-normalized whenever anything changed, including after a
/// [`SweepFault`] aborted the sweep part way.
pub fn merge_with<I>(
    candidates: I,
    local: &mut Vec<Record>,
    today: NaiveDate,
    order: TypeOrder,
) -> MergeReport
where
    I: IntoIterator<Item = Record>,
{
    let mut report = MergeReport::default();

    let mut cands: Vec<Record> = Vec::new();
    for r in candidates {
        if r.is_holiday() {
            cands.push(r);
        } else {
            report.discarded += 1;
        }
    }
    if report.discarded > 0 {
        warn!(discarded = report.discarded, "non-holiday candidates ignored");
    }

    normalize_with(&mut cands, today, order);
    if cands.is_empty() {
        debug!(%today, "no candidates to merge");
        return report;
    }

    let fault = sweep(&cands, local, &mut report);
    report.fault = fault;

    if let Some(fault) = &report.fault {
        error!(%fault, committed = report.actions.len(), "merge aborted");
    }
    if report.changed() {
        normalize_with(local, today, order);
    }
    debug!(
        %today,
        inserted = report.inserted(),
        updated = report.updated(),
        deleted = report.deleted(),
        skipped_manual = report.skipped_manual,
        "merge finished"
    );
    report
}

// ---------------------------------------------------------------------------
// Sweep
// ---------------------------------------------------------------------------

/// Two-pointer walk over sorted candidates and local holiday refs.
///
/// Returns `Some(fault)` if the walk had to stop early.
fn sweep(cands: &[Record], local: &mut Vec<Record>, report: &mut MergeReport) -> Option<SweepFault> {
    let mut refs = holiday_refs(local);
    let budget = refs.len() + cands.len();
    let mut restarts = 0;
    let (mut c, mut h) = (0usize, 0usize);
    // Restarts revisit manual holidays; count each one once.
    let mut skipped: BTreeSet<(NaiveDate, String)> = BTreeSet::new();

    let fault = loop {
        let cand = cands.get(c);
        let Some(href) = refs.get(h).cloned() else {
            // No local holidays left: everything remaining is new.
            match cand {
                None => break None,
                Some(cand) => {
                    insert(local, cand, report);
                    c += 1;
                    continue;
                }
            }
        };

        match cand.map(|x| (x, x.date.cmp(&href.date))) {
            Some((cand, Ordering::Less)) => {
                insert(local, cand, report);
                c += 1;
            }
            None | Some((_, Ordering::Greater)) => {
                if href.is_manual() {
                    skipped.insert((href.date, href.reason));
                    h += 1;
                    continue;
                }
                if let Err(fault) = check_index(local, &href) {
                    break Some(fault);
                }
                let removed = local.remove(href.index);
                report.actions.push(MergeAction::Deleted {
                    date: removed.date,
                    reason: removed.reason,
                    source: removed.source,
                });

                restarts += 1;
                if restarts > budget {
                    break Some(SweepFault::NoProgress { restarts, budget });
                }
                // Indices past the deleted one have shifted.
                refs = holiday_refs(local);
                c = 0;
                h = 0;
            }
            Some((cand, Ordering::Equal)) => {
                if let Err(fault) = check_index(local, &href) {
                    break Some(fault);
                }
                let target = &mut local[href.index];
                if target.reason != cand.reason || target.source != cand.source {
                    report.actions.push(MergeAction::Updated {
                        date: target.date,
                        old_reason: std::mem::replace(&mut target.reason, cand.reason.clone()),
                        new_reason: cand.reason.clone(),
                        source: cand.source.clone(),
                    });
                    target.source.clone_from(&cand.source);
                }
                // Duplicate-dated local holidays all match the same candidate.
                let next_same_date = refs.get(h + 1).is_some_and(|n| n.date == href.date);
                h += 1;
                if !next_same_date {
                    c += 1;
                }
            }
        }
    };

    report.skipped_manual = skipped.len();
    fault
}

fn insert(local: &mut Vec<Record>, cand: &Record, report: &mut MergeReport) {
    local.push(cand.clone());
    report.actions.push(MergeAction::Inserted {
        date: cand.date,
        reason: cand.reason.clone(),
        source: cand.source.clone(),
    });
}

fn check_index(local: &[Record], href: &HolidayRef) -> Result<(), SweepFault> {
    match local.get(href.index) {
        Some(r) if r.is_holiday() && r.date == href.date && r.source == href.source => Ok(()),
        _ => Err(SweepFault::StaleIndex {
            index: href.index,
            expected: href.date,
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
