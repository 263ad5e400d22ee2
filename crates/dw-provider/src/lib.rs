//! dw-provider
//!
//! Holiday provider boundary and the concrete upstream APIs.
//!
//! This crate fetches candidate holiday lists. It does **not** merge them into
//! the local list (that is `dw-reconcile`) and does not persist anything.
//! Failures never cross [`fetch_candidates`]: they become an empty candidate
//! list plus a status string.

mod calendarific;
mod config;
mod error;
mod nager;

use std::time::Duration;

use dw_core::Record;
use tracing::{info, warn};

pub use calendarific::{CalendarificProvider, CALENDARIFIC_BASE_URL};
pub use config::{ApiConfig, ProviderKind, ABSTRACTAPI, CALENDARIFIC, NAGER};
pub use error::ProviderError;
pub use nager::{NagerProvider, NAGER_BASE_URL};

/// Status recorded after a successful fetch.
pub const STATUS_OK: &str = "ok";

// ---------------------------------------------------------------------------
// Provider trait
// ---------------------------------------------------------------------------

/// Upstream holiday provider contract.
///
/// Object safe so callers can hold a `Box<dyn HolidayProvider>`.
#[async_trait::async_trait]
pub trait HolidayProvider: Send + Sync {
    /// Provider id, also used as the `source` of every record it yields.
    fn source_name(&self) -> &'static str;

    /// Holidays for `year` and `year + 1`, in upstream order.
    async fn fetch_holidays(&self, year: i32) -> Result<Vec<Record>, ProviderError>;
}

/// Stand-in for a provider whose service has been withdrawn.
#[derive(Debug, Clone)]
pub struct RetiredProvider {
    name: &'static str,
    notice: &'static str,
}

impl RetiredProvider {
    pub fn abstractapi() -> Self {
        Self {
            name: ABSTRACTAPI,
            notice: "abstractapi no longer supported",
        }
    }
}

#[async_trait::async_trait]
impl HolidayProvider for RetiredProvider {
    fn source_name(&self) -> &'static str {
        self.name
    }

    async fn fetch_holidays(&self, _year: i32) -> Result<Vec<Record>, ProviderError> {
        Err(ProviderError::Retired(self.notice.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

/// Base URLs for the HTTP providers. Overridden in tests.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub nager: String,
    pub calendarific: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            nager: NAGER_BASE_URL.to_string(),
            calendarific: CALENDARIFIC_BASE_URL.to_string(),
        }
    }
}

/// Build the provider an [`ApiConfig`] selects.
///
/// Fails with [`ProviderError::Config`] when the config does not validate.
pub fn provider_for(
    api: &ApiConfig,
    endpoints: &Endpoints,
) -> Result<Box<dyn HolidayProvider>, ProviderError> {
    let provider: Box<dyn HolidayProvider> = match api.validate()? {
        ProviderKind::Nager => Box::new(NagerProvider::new_with_base_url(
            &api.country,
            &api.region,
            endpoints.nager.clone(),
        )),
        ProviderKind::Calendarific => Box::new(CalendarificProvider::new_with_base_url(
            &api.key,
            &api.country,
            endpoints.calendarific.clone(),
        )),
        ProviderKind::AbstractApi => Box::new(RetiredProvider::abstractapi()),
        // validate() rejects these.
        ProviderKind::Disabled | ProviderKind::Unknown(_) => {
            return Err(ProviderError::Config("no provider configured".to_string()))
        }
    };
    Ok(provider)
}

// ---------------------------------------------------------------------------
// Fetch boundary
// ---------------------------------------------------------------------------

/// Candidates of one fetch plus the status to record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    pub candidates: Vec<Record>,
    pub status: String,
    /// The provider error, if any, for callers that want more than the status.
    pub error: Option<ProviderError>,
}

impl FetchOutcome {
    pub fn ok(candidates: Vec<Record>) -> Self {
        Self {
            candidates,
            status: STATUS_OK.to_string(),
            error: None,
        }
    }

    pub fn failed(error: ProviderError) -> Self {
        Self {
            candidates: Vec::new(),
            status: error.to_string(),
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Run one fetch under `timeout`, folding every failure into the outcome.
pub async fn fetch_candidates(
    provider: &dyn HolidayProvider,
    year: i32,
    timeout: Duration,
) -> FetchOutcome {
    let name = provider.source_name();
    match tokio::time::timeout(timeout, provider.fetch_holidays(year)).await {
        Ok(Ok(candidates)) => {
            info!(provider = name, year, count = candidates.len(), "holidays fetched");
            FetchOutcome::ok(candidates)
        }
        Ok(Err(e)) => {
            warn!(provider = name, year, error = %e, "holiday fetch failed");
            FetchOutcome::failed(e)
        }
        Err(_) => {
            let e = ProviderError::Timeout {
                secs: timeout.as_secs(),
            };
            warn!(provider = name, year, error = %e, "holiday fetch timed out");
            FetchOutcome::failed(e)
        }
    }
}

/// Map a non-success HTTP status to [`ProviderError::Http`].
pub(crate) fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    Err(ProviderError::Http {
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or("unknown").to_string(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
