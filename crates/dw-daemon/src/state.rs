//! Shared runtime state for dw-daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum. The reconciliation
//! context sits behind one async mutex, so cycles triggered by the hourly
//! tick and by `POST /v1/refresh` never overlap.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, NaiveDate, NaiveTime, Timelike, Utc};
use dw_config::StateStore;
use dw_runtime::{
    cycle_and_save, Clock, CycleEvent, CycleReport, Fanout, ProviderFactory, ReconcileContext,
    Reporter, TracingReporter,
};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{error, info};

// ---------------------------------------------------------------------------
// BusMsg: SSE event bus payload
// ---------------------------------------------------------------------------

/// Messages broadcast over the internal event bus and surfaced as SSE events.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BusMsg {
    Heartbeat { ts_millis: i64 },
    Status(StatusSnapshot),
    Cycle { event: CycleEvent },
}

/// Publishes cycle events on the bus.
pub struct BusReporter {
    bus: broadcast::Sender<BusMsg>,
}

impl BusReporter {
    pub fn new(bus: broadcast::Sender<BusMsg>) -> Self {
        Self { bus }
    }
}

impl Reporter for BusReporter {
    fn report(&self, event: &CycleEvent) {
        // No subscribers is not an error.
        let _ = self.bus.send(BusMsg::Cycle {
            event: event.clone(),
        });
    }
}

// ---------------------------------------------------------------------------
// BuildInfo
// ---------------------------------------------------------------------------

/// Static build metadata included in health / status responses.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// StatusSnapshot
// ---------------------------------------------------------------------------

/// Point-in-time snapshot of daemon state, returned by GET /v1/status and
/// carried inside SSE `status` events.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub daemon_uptime_secs: u64,
    /// Where state is persisted.
    pub store: String,
    pub provider: String,
    /// Provider status from the last fetch or config check.
    pub api_status: String,
    pub last_retrieved: Option<NaiveDate>,
    pub records: usize,
    pub cycles: u64,
    pub last_cycle_at: Option<DateTime<Utc>>,
    /// Set when the last cycle failed to persist or the merge faulted.
    pub last_error: Option<String>,
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// Cloneable (Arc) handle shared across all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Broadcast bus for SSE.
    pub bus: broadcast::Sender<BusMsg>,
    /// Static build metadata.
    pub build: BuildInfo,
    /// The location's list, work week and provider config.
    pub ctx: Arc<Mutex<ReconcileContext>>,
    /// Cycle bookkeeping surfaced by GET /v1/status.
    pub status: Arc<RwLock<StatusSnapshot>>,
    pub store: Arc<dyn StateStore>,
    pub clock: Arc<dyn Clock>,
    pub providers: Arc<dyn ProviderFactory>,
}

impl AppState {
    pub fn new(
        ctx: ReconcileContext,
        store: Arc<dyn StateStore>,
        clock: Arc<dyn Clock>,
        providers: Arc<dyn ProviderFactory>,
    ) -> Self {
        let (bus, _rx) = broadcast::channel::<BusMsg>(1024);

        let initial_status = StatusSnapshot {
            daemon_uptime_secs: uptime_secs(),
            store: store.describe(),
            ..StatusSnapshot::default()
        };

        Self {
            bus,
            build: BuildInfo {
                service: "dw-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
            ctx: Arc::new(Mutex::new(ctx)),
            status: Arc::new(RwLock::new(initial_status)),
            store,
            clock,
            providers,
        }
    }

    /// Run one cycle for the clock's today and persist if anything changed.
    ///
    /// `force` clears the fetch watermark first.
    pub async fn run_cycle(&self, force: bool) -> anyhow::Result<CycleReport> {
        let mut ctx = self.ctx.lock().await;
        if force {
            ctx.force_fetch();
        }
        let today = self.clock.today();
        let tracing_reporter = TracingReporter;
        let bus_reporter = BusReporter::new(self.bus.clone());
        let reporter = Fanout(vec![&tracing_reporter as &dyn Reporter, &bus_reporter]);

        let result = cycle_and_save(
            &mut ctx,
            today,
            self.providers.as_ref(),
            &reporter,
            self.store.as_ref(),
        )
        .await;

        let snap = {
            let mut st = self.status.write().await;
            st.daemon_uptime_secs = uptime_secs();
            st.provider.clone_from(&ctx.api().provider);
            st.api_status.clone_from(&ctx.api().status);
            st.last_retrieved = ctx.api().last_retrieved;
            st.records = ctx.records().len();
            st.cycles += 1;
            st.last_cycle_at = Some(Utc::now());
            st.last_error = match &result {
                Ok(report) => report.fault.as_ref().map(ToString::to_string),
                Err(e) => Some(format!("{e:#}")),
            };
            st.clone()
        };
        let _ = self.bus.send(BusMsg::Status(snap));
        result
    }

    /// Current status with uptime refreshed.
    pub async fn status_snapshot(&self) -> StatusSnapshot {
        let mut snap = self.status.read().await.clone();
        snap.daemon_uptime_secs = uptime_secs();
        snap
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Monotonically increasing uptime since first call (process lifetime).
pub fn uptime_secs() -> u64 {
    static START: std::sync::OnceLock<std::time::Instant> = std::sync::OnceLock::new();
    START
        .get_or_init(std::time::Instant::now)
        .elapsed()
        .as_secs()
}

/// Spawn a background task that emits a heartbeat SSE every `interval`.
pub fn spawn_heartbeat(bus: broadcast::Sender<BusMsg>, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let ts = Utc::now().timestamp_millis();
            let _ = bus.send(BusMsg::Heartbeat { ts_millis: ts });
        }
    });
}

/// Time from `now` until one second past the next full hour.
pub fn delay_to_next_hour(now: NaiveTime) -> Duration {
    let into_hour = u64::from(now.minute()) * 60 + u64::from(now.second());
    // nanosecond() exceeds 1e9 only inside a leap second.
    let nanos = u64::from(now.nanosecond()).min(999_999_999);
    Duration::from_secs(3600 - into_hour + 1) - Duration::from_nanos(nanos)
}

/// Spawn the hourly reconciliation tick.
///
/// The first tick fires one second past the next full hour (local time);
/// a failed cycle is logged and the schedule continues.
pub fn spawn_hourly_tick(state: Arc<AppState>) {
    tokio::spawn(async move {
        loop {
            let delay = delay_to_next_hour(Local::now().time());
            tokio::time::sleep(delay).await;
            match state.run_cycle(false).await {
                Ok(report) => info!(
                    today = %report.today,
                    fetched = report.fetched,
                    dirty = report.dirty,
                    "hourly cycle finished"
                ),
                Err(e) => error!(error = %format!("{e:#}"), "hourly cycle failed"),
            }
        }
    });
}
