//! Request and response types for all dw-daemon HTTP endpoints.
//!
//! These types are `Serialize + Deserialize` so they can be JSON-encoded
//! by Axum and decoded by tests. No business logic lives here.

use chrono::NaiveDate;
use dw_core::{Record, TodayFacts, TypeOrder};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// /v1/health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// /v1/today
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodayResponse {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub facts: TodayFacts,
}

// ---------------------------------------------------------------------------
// /v1/dates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatesResponse {
    /// Working days as `mon,tue,...`.
    pub work_week: String,
    pub type_order: TypeOrder,
    pub records: Vec<Record>,
}

// ---------------------------------------------------------------------------
// /v1/refresh
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefreshQuery {
    /// Fetch even if the provider was already queried today.
    #[serde(default)]
    pub force: bool,
}

/// Body returned when a cycle could not complete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
