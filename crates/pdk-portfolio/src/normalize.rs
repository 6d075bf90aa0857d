//! Raw adapter records -> normalized snapshots.
//!
//! Nothing in this module can fail: every numeric read goes through
//! `safe_numeric`, unparseable tickers become `"N/A"`, and an account whose
//! summary is empty comes out with zero equity and balance.
//!
//! It does **not**:
//! - fetch anything (adapters live in pdk-venues)
//! - roll accounts up into venues (that is `aggregate.rs`)

use pdk_schemas::{RawAccountRecord, RawRecord};

use crate::numeric::{finite_or_zero, round_dp};
use crate::report::{AccountSnapshot, PositionSnapshot, NOT_AVAILABLE};
use crate::rules::{ExposureRule, PositionRules, VenueRules};
use crate::{DISPLAY_DP, PERP_SUFFIX};

/// Mark price and unsigned notional implied by entry price and unrealized PnL.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DerivedMark {
    pub mark_price: f64,
    /// |size| * mark_price
    pub notional: f64,
}

/// Invert the unrealized-PnL formula to recover the mark price.
///
/// long  (S > 0): U = (M - E) * S    =>  M = E + U / S
/// short (S < 0): U = (E - M) * |S|  =>  M = E - U / |S|
///
/// This is the exact algebraic inverse, not an approximation. Returns `None`
/// for `S == 0` (a closed row carries no live exposure).
pub fn derive_mark(entry_price: f64, size: f64, unrealized_pnl: f64) -> Option<DerivedMark> {
    let mark_price = if size > 0.0 {
        entry_price + unrealized_pnl / size
    } else if size < 0.0 {
        entry_price - unrealized_pnl / size.abs()
    } else {
        return None;
    };
    Some(DerivedMark {
        mark_price,
        notional: size.abs() * mark_price,
    })
}

/// `BTC_USDT_Perp` with separator `_` -> `BTC-PERP`.
///
/// A ticker without the separator, or with an empty base, yields `"N/A"`
/// rather than a guess.
pub fn normalize_instrument(raw_ticker: &str, separator: char) -> String {
    match raw_ticker.split_once(separator) {
        Some((base, _)) if !base.trim().is_empty() => format!("{}{}", base.trim(), PERP_SUFFIX),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// Round to cents; zero, negative or missing all normalize to `0.0`.
///
/// A reported `0` is indistinguishable from "no liquidation price" in the
/// output.
pub fn normalize_liquidation_price(raw: f64) -> f64 {
    if raw > 0.0 {
        round_dp(raw, DISPLAY_DP)
    } else {
        0.0
    }
}

/// Normalize one raw position. `None` means the row is dropped.
pub fn normalize_position(record: &RawRecord, rules: &PositionRules) -> Option<PositionSnapshot> {
    let size = rules.size.read_f64(record, 0.0);

    let exposure = match &rules.exposure {
        ExposureRule::Notional { fields } => {
            align_sign(round_dp(fields.read_f64(record, 0.0), DISPLAY_DP), size)
        }
        ExposureRule::MarkPrice { fields } => size * fields.read_f64(record, 0.0),
        ExposureRule::DerivedFromPnl {
            entry_price,
            unrealized_pnl,
        } => {
            let d = derive_mark(
                entry_price.read_f64(record, 0.0),
                size,
                unrealized_pnl.read_f64(record, 0.0),
            )?;
            d.notional.copysign(size)
        }
    };
    // a subnormal size can push the derived mark to infinity
    let exposure_value = finite_or_zero(exposure);

    let instrument = rules
        .instrument
        .read_str(record)
        .map(|t| normalize_instrument(t, rules.ticker_separator))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    Some(PositionSnapshot {
        instrument,
        size,
        exposure_value,
        liquidation_price: normalize_liquidation_price(
            rules.liquidation_price.read_f64(record, 0.0),
        ),
    })
}

/// Normalize one adapter record into an account snapshot.
pub fn normalize_account(raw: &RawAccountRecord, rules: &VenueRules) -> AccountSnapshot {
    let (equity, available_balance) = if raw.has_summary() {
        (
            rules.equity.read_f64(&raw.summary, 0.0),
            rules.available_balance.read_f64(&raw.summary, 0.0),
        )
    } else {
        (0.0, 0.0)
    };

    let observed_at = rules
        .timestamp
        .as_ref()
        .and_then(|t| t.read(&raw.summary));

    let positions = raw
        .positions
        .iter()
        .filter_map(|p| normalize_position(p, &rules.position))
        .collect();

    AccountSnapshot::new(equity, available_balance, positions)
        .with_activity(raw.open_orders.len(), raw.fills.len())
        .with_observed_at(observed_at)
}

// Venue notionals may be reported unsigned; direction comes from size.
fn align_sign(notional: f64, size: f64) -> f64 {
    if size == 0.0 {
        notional
    } else {
        notional.abs().copysign(size)
    }
}
