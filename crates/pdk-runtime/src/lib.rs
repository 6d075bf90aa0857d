//! pdk-runtime
//!
//! One aggregation pass: fetch every venue concurrently, normalize, roll up.
//!
//! Failure policy:
//! - A venue whose adapter errors or exceeds the fetch timeout contributes
//!   an empty data set (logged at `warn`). The pass itself never fails.
//! - Report order is configured venue order, whatever order fetches finish in.

use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use futures_util::future::join_all;
use serde::Serialize;
use tracing::{info, warn};

use pdk_config::Settings;
use pdk_portfolio::{
    aggregate_portfolio, aggregate_venue, normalize_account, PortfolioReport, VenueRules,
};
use pdk_schemas::RawAccountRecord;
use pdk_venues::{adapters_from_env, VenueAdapter};

// ---------------------------------------------------------------------------
// Pass outcome
// ---------------------------------------------------------------------------

/// How one venue's fetch went during a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VenueFetch {
    pub venue_id: String,
    pub accounts: usize,
    /// `None` on success; the adapter error or `"timeout"` otherwise.
    pub error: Option<String>,
}

impl VenueFetch {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct PassOutcome {
    pub report: PortfolioReport,
    /// Same order as `report.venues`.
    pub fetches: Vec<VenueFetch>,
    pub completed_at: DateTime<Utc>,
    pub elapsed: Duration,
}

// ---------------------------------------------------------------------------
// Monitor
// ---------------------------------------------------------------------------

struct VenueEntry {
    adapter: Box<dyn VenueAdapter>,
    rules: VenueRules,
}

/// Configured venues plus everything a pass needs besides the network.
pub struct Monitor {
    venues: Vec<VenueEntry>,
    fetch_timeout: Duration,
    timezone: Tz,
}

impl Monitor {
    pub fn new(timezone: Tz, fetch_timeout: Duration) -> Self {
        Self {
            venues: Vec::new(),
            fetch_timeout,
            timezone,
        }
    }

    /// Append a venue. Call order is report order.
    pub fn with_venue(mut self, adapter: Box<dyn VenueAdapter>, rules: VenueRules) -> Self {
        self.venues.push(VenueEntry { adapter, rules });
        self
    }

    /// Adapters for every configured venue, credentials from the environment.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let adapters = adapters_from_env(settings)?;
        let monitor = adapters.into_iter().zip(settings.venues.iter()).fold(
            Self::new(
                settings.report.timezone,
                Duration::from_secs(settings.schedule.fetch_timeout_secs),
            ),
            |m, (adapter, venue)| m.with_venue(adapter, venue.rules.clone()),
        );
        Ok(monitor)
    }

    pub fn venue_ids(&self) -> Vec<String> {
        self.venues
            .iter()
            .map(|v| v.adapter.venue_id().to_string())
            .collect()
    }

    /// Run one pass and return only the report.
    pub async fn run_once(&self) -> PortfolioReport {
        self.run_pass().await.report
    }

    pub async fn run_pass(&self) -> PassOutcome {
        let started = Instant::now();

        let fetched = join_all(self.venues.iter().map(|v| self.fetch_venue(v.adapter.as_ref()))).await;

        let mut aggregates = Vec::with_capacity(self.venues.len());
        let mut fetches = Vec::with_capacity(self.venues.len());
        for (entry, (records, fetch)) in self.venues.iter().zip(fetched) {
            let snapshots = records
                .iter()
                .map(|r| normalize_account(r, &entry.rules))
                .collect();
            aggregates.push(aggregate_venue(
                entry.adapter.venue_id(),
                entry.adapter.display_name(),
                snapshots,
            ));
            fetches.push(fetch);
        }

        let report = aggregate_portfolio(aggregates, self.timezone);
        let elapsed = started.elapsed();
        info!(
            venues = report.venues.len(),
            accounts = report.account_count(),
            positions = report.position_count(),
            failed = fetches.iter().filter(|f| !f.is_ok()).count(),
            elapsed_ms = elapsed.as_millis() as u64,
            "aggregation pass complete"
        );

        PassOutcome {
            report,
            fetches,
            completed_at: Utc::now(),
            elapsed,
        }
    }

    async fn fetch_venue(&self, adapter: &dyn VenueAdapter) -> (Vec<RawAccountRecord>, VenueFetch) {
        let venue_id = adapter.venue_id().to_string();
        let result = tokio::time::timeout(self.fetch_timeout, adapter.fetch_accounts()).await;

        let (records, error) = match result {
            Ok(Ok(records)) => (records, None),
            Ok(Err(e)) => {
                warn!(venue = %venue_id, error = %e, "venue fetch failed, contributing empty data set");
                (Vec::new(), Some(e.to_string()))
            }
            Err(_) => {
                warn!(
                    venue = %venue_id,
                    timeout_secs = self.fetch_timeout.as_secs_f64(),
                    "venue fetch timed out, contributing empty data set"
                );
                (Vec::new(), Some("timeout".to_string()))
            }
        };

        let fetch = VenueFetch {
            venue_id,
            accounts: records.len(),
            error,
        };
        (records, fetch)
    }
}
