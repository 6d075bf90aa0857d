//! Report model.
//!
//! Plain values built once per aggregation pass. Every derived number is
//! computed at construction so renderers never recompute anything.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::metrics::{account_metrics, AccountMetrics};

/// Sentinel for a value the sources could not provide.
pub const NOT_AVAILABLE: &str = "N/A";

/// One live position in normalized form.
///
/// `exposure_value` carries the same sign as `size`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    /// `<BASE>-PERP`, or `"N/A"` when the venue ticker could not be parsed.
    pub instrument: String,
    /// Signed quantity: positive long, negative short.
    pub size: f64,
    /// Signed notional (size * mark).
    pub exposure_value: f64,
    /// Non-negative; `0.0` when unavailable or reported as zero.
    pub liquidation_price: f64,
}

/// One (sub-)account in normalized form, with its metrics frozen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub equity: f64,
    pub available_balance: f64,
    /// Discovery order from the source; not semantically significant.
    pub positions: Vec<PositionSnapshot>,
    pub open_orders: usize,
    pub fills: usize,
    /// Source timestamp carried on the account summary, if any.
    pub observed_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub metrics: AccountMetrics,
}

impl AccountSnapshot {
    pub fn new(equity: f64, available_balance: f64, positions: Vec<PositionSnapshot>) -> Self {
        let metrics = account_metrics(equity, &positions);
        Self {
            equity,
            available_balance,
            positions,
            open_orders: 0,
            fills: 0,
            observed_at: None,
            metrics,
        }
    }

    /// An account the venue returned nothing for: all metrics zero.
    pub fn empty() -> Self {
        Self::new(0.0, 0.0, Vec::new())
    }

    pub fn with_activity(mut self, open_orders: usize, fills: usize) -> Self {
        self.open_orders = open_orders;
        self.fills = fills;
        self
    }

    pub fn with_observed_at(mut self, observed_at: Option<DateTime<Utc>>) -> Self {
        self.observed_at = observed_at;
        self
    }
}

/// Per-venue roll-up. Totals are plain sums of the account fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueAggregate {
    pub venue_id: String,
    pub display_name: String,
    pub equity_total: f64,
    pub net_exposure_total: f64,
    pub gross_exposure_total: f64,
    /// Adapter enumeration order; drives 1-indexed account numbering.
    pub accounts: Vec<AccountSnapshot>,
}

impl VenueAggregate {
    /// Display label for the account at zero-based `index`, e.g. `GRVT_Acc01`.
    pub fn account_label(&self, index: usize) -> String {
        format!("{}_Acc{:02}", self.display_name, index + 1)
    }

    /// True when no account contributed any data (the fetch-failed signal).
    pub fn is_all_zero(&self) -> bool {
        self.equity_total == 0.0
            && self.net_exposure_total == 0.0
            && self.gross_exposure_total == 0.0
    }
}

/// Root of the report tree handed to renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioReport {
    /// `%Y-%m-%d %H:%M:%S` in the report timezone, or `"N/A"`.
    pub generated_at: String,
    pub total_equity: f64,
    /// Sum of venue net exposures.
    pub total_exposure: f64,
    pub total_gross_exposure: f64,
    /// Configured venue order, independent of fetch completion order.
    pub venues: Vec<VenueAggregate>,
}

impl PortfolioReport {
    pub fn account_count(&self) -> usize {
        self.venues.iter().map(|v| v.accounts.len()).sum()
    }

    pub fn position_count(&self) -> usize {
        self.venues
            .iter()
            .flat_map(|v| v.accounts.iter())
            .map(|a| a.positions.len())
            .sum()
    }
}
