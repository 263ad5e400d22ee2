//! One reconciliation cycle.
//!
//! normalize → (validate config → fetch if due → merge) → today's facts.
//!
//! The cycle never saves; it reports `dirty` and the caller persists.

use std::time::Duration;

use anyhow::Context;
use chrono::{Datelike, NaiveDate};
use dw_config::StateStore;
use dw_core::{facts_for, normalize_with, TodayFacts};
use dw_provider::{
    fetch_candidates, provider_for, ApiConfig, Endpoints, FetchOutcome, HolidayProvider,
    ProviderError,
};
use dw_reconcile::{merge_with, FetchDue, MergeReport, SweepFault};
use serde::{Serialize, Serializer};
use tracing::{debug, info};

use crate::{CycleEvent, ReconcileContext, Reporter};

// ---------------------------------------------------------------------------
// Provider construction seam
// ---------------------------------------------------------------------------

/// Builds the provider for a validated [`ApiConfig`].
pub trait ProviderFactory: Send + Sync {
    fn build(&self, api: &ApiConfig) -> Result<Box<dyn HolidayProvider>, ProviderError>;
}

/// Real HTTP providers.
#[derive(Debug, Clone, Default)]
pub struct HttpProviders {
    pub endpoints: Endpoints,
}

impl ProviderFactory for HttpProviders {
    fn build(&self, api: &ApiConfig) -> Result<Box<dyn HolidayProvider>, ProviderError> {
        provider_for(api, &self.endpoints)
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Merge counts surfaced to callers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MergeCounts {
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
    pub skipped_manual: usize,
    pub discarded: usize,
}

impl From<&MergeReport> for MergeCounts {
    fn from(r: &MergeReport) -> Self {
        Self {
            inserted: r.inserted(),
            updated: r.updated(),
            deleted: r.deleted(),
            skipped_manual: r.skipped_manual,
            discarded: r.discarded,
        }
    }
}

/// Outcome of [`run_cycle`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub today: NaiveDate,
    pub facts: TodayFacts,
    /// The snapshot changed and should be saved.
    pub dirty: bool,
    /// A provider fetch was attempted.
    pub fetched: bool,
    /// Status recorded for the provider this cycle, if any.
    pub status: Option<String>,
    pub merge: Option<MergeCounts>,
    #[serde(serialize_with = "fault_as_string")]
    pub fault: Option<SweepFault>,
}

fn fault_as_string<S: Serializer>(fault: &Option<SweepFault>, ser: S) -> Result<S::Ok, S::Error> {
    match fault {
        Some(f) => ser.collect_str(f),
        None => ser.serialize_none(),
    }
}

// ---------------------------------------------------------------------------
// Cycle
// ---------------------------------------------------------------------------

/// Run one cycle against `ctx` for `today`.
///
/// - Config problems are reported once per distinct config and skip the fetch.
/// - Fetch failures degrade to zero candidates; the watermark still advances.
/// - A [`SweepFault`] is reported as an error event; changes committed before
///   the fault stay, and the next fetch waits for the next day.
pub async fn run_cycle(
    ctx: &mut ReconcileContext,
    today: NaiveDate,
    providers: &dyn ProviderFactory,
    reporter: &dyn Reporter,
) -> CycleReport {
    let order = ctx.snapshot.type_order;
    let mut dirty = normalize_with(&mut ctx.snapshot.date_list, today, order);
    if dirty {
        reporter.report(&CycleEvent::Normalized {
            today,
            len: ctx.snapshot.date_list.len(),
        });
    }

    let mut fetched = false;
    let mut status = None;
    let mut merge = None;
    let mut fault = None;

    let api = ctx.effective_api();
    match api.validate() {
        Err(problem) => {
            let fingerprint = api.fingerprint();
            if ctx.reported_config.as_ref() != Some(&fingerprint) {
                let text = problem.to_string();
                reporter.report(&CycleEvent::ConfigProblem {
                    status: text.clone(),
                });
                if ctx.snapshot.api.status != text {
                    ctx.snapshot.api.status.clone_from(&text);
                    dirty = true;
                }
                ctx.reported_config = Some(fingerprint);
                status = Some(text);
            }
        }
        Ok(_) => {
            ctx.reported_config = None;
            let mut watermark = ctx.watermark();
            match watermark.check(today) {
                FetchDue::AlreadyFetched { last } => {
                    debug!(%today, %last, "provider already queried today");
                }
                due => {
                    info!(%today, provider = %api.provider, ?due, "fetching holidays");
                    let outcome = fetch(providers, &api, today, ctx.fetch_timeout).await;
                    reporter.report(&CycleEvent::Fetched {
                        provider: api.provider.clone(),
                        status: outcome.status.clone(),
                        candidates: outcome.candidates.len(),
                    });

                    let report = merge_with(outcome.candidates, &mut ctx.snapshot.date_list, today, order);
                    if report.changed() {
                        let counts = MergeCounts::from(&report);
                        reporter.report(&CycleEvent::Merged {
                            inserted: counts.inserted,
                            updated: counts.updated,
                            deleted: counts.deleted,
                            skipped_manual: counts.skipped_manual,
                        });
                    }
                    if let Some(f) = &report.fault {
                        reporter.report(&CycleEvent::MergeFault {
                            message: f.to_string(),
                        });
                    }

                    watermark.accept(today);
                    ctx.snapshot.api.last_retrieved = watermark.last();
                    ctx.snapshot.api.status.clone_from(&outcome.status);
                    dirty = true;
                    fetched = true;
                    status = Some(outcome.status);
                    merge = Some(MergeCounts::from(&report));
                    fault = report.fault;
                }
            }
        }
    }

    let facts = facts_for(&ctx.snapshot.date_list, &ctx.snapshot.work_week, today);
    reporter.report(&CycleEvent::Today {
        date: today,
        facts: facts.clone(),
    });
    ctx.last_facts = Some(facts.clone());

    CycleReport {
        today,
        facts,
        dirty,
        fetched,
        status,
        merge,
        fault,
    }
}

async fn fetch(
    providers: &dyn ProviderFactory,
    api: &ApiConfig,
    today: NaiveDate,
    timeout: Duration,
) -> FetchOutcome {
    match providers.build(api) {
        Ok(provider) => fetch_candidates(provider.as_ref(), today.year(), timeout).await,
        Err(e) => FetchOutcome::failed(e),
    }
}

/// [`run_cycle`], then save the snapshot through `store` if it changed.
pub async fn cycle_and_save(
    ctx: &mut ReconcileContext,
    today: NaiveDate,
    providers: &dyn ProviderFactory,
    reporter: &dyn Reporter,
    store: &dyn StateStore,
) -> anyhow::Result<CycleReport> {
    let report = run_cycle(ctx, today, providers, reporter).await;
    if report.dirty {
        store
            .save(&ctx.snapshot)
            .with_context(|| format!("failed to save state to {}", store.describe()))?;
    }
    Ok(report)
}
