use dw_config::{ResolvedSecrets, StateSnapshot, StateStore};
use dw_core::{DateType, Record};
use dw_provider::{ProviderError, CALENDARIFIC, NAGER};
use dw_runtime::*;
use dw_testkit::*;

fn nager_snapshot() -> StateSnapshot {
    let mut snap = StateSnapshot::default();
    snap.api.provider = NAGER.to_string();
    snap.api.country = "DE".to_string();
    snap.api.region = "DE-BY".to_string();
    snap
}

#[tokio::test]
async fn scenario_first_cycle_fetches_merges_and_publishes_today() {
    let provider = ScriptedProvider::new().respond(vec![
        holiday("2024-01-01", "Neujahr", NAGER),
        holiday("2024-01-06", "Heilige Drei Könige", NAGER),
    ]);
    let reporter = RecordingReporter::new();
    let mut ctx = ReconcileContext::new(nager_snapshot());

    let report = run_cycle(&mut ctx, date("2024-01-01"), &provider, &reporter).await;

    assert!(report.fetched);
    assert!(report.dirty);
    assert_eq!(report.status.as_deref(), Some("ok"));
    assert_eq!(report.merge.as_ref().map(|m| m.inserted), Some(2));
    assert!(report.facts.is_holiday);
    assert!(!report.facts.is_working_day);
    assert_eq!(report.facts.reason, "Neujahr");
    assert_eq!(report.facts.source, NAGER);

    assert_eq!(provider.calls(), vec![2024]);
    assert_eq!(ctx.api().last_retrieved, Some(date("2024-01-01")));
    assert_eq!(ctx.api().status, "ok");
    assert!(matches!(
        reporter.events().last(),
        Some(CycleEvent::Today { .. })
    ));
}

#[tokio::test]
async fn scenario_second_cycle_same_day_does_not_fetch() {
    let provider = ScriptedProvider::new().respond(vec![holiday("2024-05-01", "Tag der Arbeit", NAGER)]);
    let reporter = RecordingReporter::new();
    let mut ctx = ReconcileContext::new(nager_snapshot());

    run_cycle(&mut ctx, date("2024-04-30"), &provider, &reporter).await;
    let again = run_cycle(&mut ctx, date("2024-04-30"), &provider, &reporter).await;

    assert!(!again.fetched);
    assert!(!again.dirty);
    assert_eq!(provider.calls().len(), 1);

    let next_day = run_cycle(&mut ctx, date("2024-05-01"), &provider, &reporter).await;
    assert!(next_day.fetched);
    assert_eq!(provider.calls().len(), 2);
    // The exhausted script answers empty, which leaves the list alone.
    assert_eq!(ctx.records().len(), 1);
    assert!(!next_day.facts.is_working_day);
    assert_eq!(next_day.facts.reason, "Tag der Arbeit");
}

#[tokio::test]
async fn scenario_config_problem_is_reported_once_per_config() {
    let provider = ScriptedProvider::new();
    let reporter = RecordingReporter::new();
    let mut snap = nager_snapshot();
    snap.api.region.clear();
    let mut ctx = ReconcileContext::new(snap);

    let first = run_cycle(&mut ctx, date("2024-03-01"), &provider, &reporter).await;
    run_cycle(&mut ctx, date("2024-03-01"), &provider, &reporter).await;
    run_cycle(&mut ctx, date("2024-03-02"), &provider, &reporter).await;

    assert!(!first.fetched);
    assert!(first.dirty);
    assert_eq!(
        reporter.config_problems(),
        vec!["no region configured for date.nager.at".to_string()]
    );
    assert!(provider.calls().is_empty());
    assert_eq!(ctx.api().last_retrieved, None);

    // A different broken config is reported again.
    ctx.snapshot.api.country.clear();
    run_cycle(&mut ctx, date("2024-03-02"), &provider, &reporter).await;
    assert_eq!(reporter.config_problems().len(), 2);
}

#[tokio::test]
async fn scenario_transport_failure_degrades_to_empty_and_advances_watermark() {
    let provider = ScriptedProvider::new().fail(ProviderError::Http {
        status: 503,
        reason: "Service Unavailable".to_string(),
    });
    let reporter = RecordingReporter::new();
    let mut snap = nager_snapshot();
    snap.date_list.push(holiday("2024-12-25", "Weihnachten", NAGER));
    let mut ctx = ReconcileContext::new(snap);

    let report = run_cycle(&mut ctx, date("2024-06-01"), &provider, &reporter).await;

    assert!(report.fetched);
    assert_eq!(
        report.status.as_deref(),
        Some("api response status: 503 - Service Unavailable")
    );
    // Zero candidates leave the local list alone.
    assert_eq!(ctx.records().len(), 1);
    assert_eq!(ctx.api().last_retrieved, Some(date("2024-06-01")));
    assert!(reporter.errors().is_empty());
}

#[tokio::test]
async fn scenario_env_key_reaches_provider_but_not_snapshot() {
    let provider = ScriptedProvider::new();
    let reporter = RecordingReporter::new();
    let mut snap = StateSnapshot::default();
    snap.api.provider = CALENDARIFIC.to_string();
    snap.api.country = "US".to_string();
    let mut ctx = ReconcileContext::new(snap).with_secrets(ResolvedSecrets {
        provider_key: Some("from-env".to_string()),
    });

    let report = run_cycle(&mut ctx, date("2024-07-01"), &provider, &reporter).await;

    assert!(report.fetched);
    assert_eq!(provider.built_for()[0].key, "from-env");
    assert!(ctx.api().key.is_empty());
}

#[tokio::test]
async fn scenario_stale_list_is_normalized_and_annual_event_rolls() {
    let provider = ScriptedProvider::new();
    let reporter = RecordingReporter::new();
    let mut snap = StateSnapshot::default();
    snap.date_list = vec![
        Record::new(date("2023-03-14"), DateType::EventAnnual).with_reason("Pi day"),
        Record::new(date("2024-01-02"), DateType::Event),
    ];
    let mut ctx = ReconcileContext::new(snap);

    let report = run_cycle(&mut ctx, date("2024-03-14"), &provider, &reporter).await;

    assert!(report.dirty);
    assert!(!report.fetched);
    assert_eq!(ctx.records().len(), 1);
    assert_eq!(ctx.records()[0].date, date("2024-03-14"));
    assert_eq!(report.facts.reason, "Pi day");
    assert_eq!(report.facts.source, "manual");
    assert!(matches!(
        reporter.events().first(),
        Some(CycleEvent::Normalized { len: 1, .. })
    ));
}

#[tokio::test]
async fn scenario_manual_holiday_survives_provider_refresh() {
    let provider = ScriptedProvider::new().respond(vec![holiday("2024-10-03", "Tag der Deutschen Einheit", NAGER)]);
    let reporter = RecordingReporter::new();
    let mut snap = nager_snapshot();
    snap.date_list = vec![
        holiday("2024-08-15", "Mariä Himmelfahrt", NAGER),
        holiday("2024-09-20", "Office closed", ""),
    ];
    let mut ctx = ReconcileContext::new(snap);

    let report = run_cycle(&mut ctx, date("2024-08-01"), &provider, &reporter).await;

    let merge = report.merge.unwrap();
    assert_eq!(merge.deleted, 1);
    assert_eq!(merge.inserted, 1);
    assert_eq!(merge.skipped_manual, 1);
    let reasons: Vec<_> = ctx.records().iter().map(|r| r.reason.clone()).collect();
    assert_eq!(reasons, ["Office closed", "Tag der Deutschen Einheit"]);
}

#[tokio::test]
async fn scenario_cycle_and_save_persists_only_when_dirty() {
    let provider = ScriptedProvider::new();
    let reporter = RecordingReporter::new();
    let store = MemoryStore::with_snapshot(StateSnapshot::default());
    let mut snap = StateSnapshot::default();
    snap.api.provider = "none".to_string();
    let mut ctx = ReconcileContext::new(snap);

    // First cycle records the config status.
    cycle_and_save(&mut ctx, date("2024-02-01"), &provider, &reporter, &store)
        .await
        .unwrap();
    assert_eq!(store.saves(), 1);
    assert_eq!(
        store.stored().unwrap().api.status,
        "no provider configured"
    );

    cycle_and_save(&mut ctx, date("2024-02-01"), &provider, &reporter, &store)
        .await
        .unwrap();
    assert_eq!(store.saves(), 1);
    assert!(store.load().unwrap().snapshot.date_list.is_empty());
}

#[tokio::test]
async fn scenario_clock_drives_the_cycle_date() {
    let clock = FixedClock::new(date("2024-01-05"));
    let provider = ScriptedProvider::new();
    let reporter = RecordingReporter::new();
    let mut ctx = ReconcileContext::new(nager_snapshot());

    let first = run_cycle(&mut ctx, clock.today(), &provider, &reporter).await;
    clock.advance_days(1);
    let second = run_cycle(&mut ctx, clock.today(), &provider, &reporter).await;

    assert_eq!(first.today, date("2024-01-05"));
    assert_eq!(second.today, date("2024-01-06"));
    assert!(second.fetched);
    // 2024-01-06 is a Saturday.
    assert!(!second.facts.is_working_day);
    assert_eq!(second.facts.reason, "Saturday");
}
