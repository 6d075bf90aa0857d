//! Request and response types for all pdk-daemon HTTP endpoints.
//!
//! No business logic lives here.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pdk_portfolio::PortfolioReport;

use crate::state::PassSummary;

// ---------------------------------------------------------------------------
// /v1/health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// /v1/status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub daemon_uptime_secs: u64,
    /// Configured venue order.
    pub venues: Vec<String>,
    pub push_enabled: bool,
    /// `None` until the first pass completes.
    pub last_pass: Option<PassSummary>,
}

// ---------------------------------------------------------------------------
// /v1/report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportQuery {
    /// Force a fresh pass instead of returning the last one.
    #[serde(default)]
    pub refresh: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportResponse {
    pub pass_id: Uuid,
    pub report: PortfolioReport,
}

// ---------------------------------------------------------------------------
// /v1/report/push
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct PushResponse {
    pub pushed: bool,
    pub pass_id: Uuid,
    pub accounts: usize,
}

/// Body for any refused or failed request.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
