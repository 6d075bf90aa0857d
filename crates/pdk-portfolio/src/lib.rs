//! pdk-portfolio
//!
//! Aggregation & risk-computation core.
//! - Safe numeric conversion (never fails, defaults instead)
//! - Declarative per-venue field mapping (`VenueRules`)
//! - Normalization of raw adapter records into `AccountSnapshot`s
//! - Mark-price derivation from unrealized PnL
//! - Account / venue / portfolio exposure and leverage roll-ups
//! - Pure deterministic logic (no IO, no wall clock, no logging)
//!
//! Input order is preserved end to end: adapter enumeration order becomes
//! account order, configured venue order becomes report order.

mod aggregate;
mod fields;
mod metrics;
mod normalize;
mod numeric;
mod report;
mod rules;

pub use aggregate::{aggregate_portfolio, aggregate_venue};
pub use fields::FieldCandidates;
pub use metrics::{aggregate_account, effective_equity, AccountMetrics};
pub use normalize::{
    derive_mark, normalize_account, normalize_instrument, normalize_liquidation_price,
    normalize_position, DerivedMark,
};
pub use numeric::{round_dp, safe_numeric, safe_numeric_str};
pub use report::{
    AccountSnapshot, PortfolioReport, PositionSnapshot, VenueAggregate, NOT_AVAILABLE,
};
pub use rules::{ExposureRule, PositionRules, TimestampRule, TimestampUnit, VenueRules};

/// Suffix appended to the base asset of every normalized instrument.
pub const PERP_SUFFIX: &str = "-PERP";

/// Decimal places kept on leverage ratios, notionals and liquidation prices.
pub const DISPLAY_DP: u32 = 2;
