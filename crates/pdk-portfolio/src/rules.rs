//! Declarative per-venue field mapping.
//!
//! A `VenueRules` value is the only venue-specific knowledge the
//! normalization layer has. Adding a venue means adding a rules table
//! (in code or YAML); the aggregator never changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use pdk_schemas::RawRecord;

use crate::fields::FieldCandidates;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VenueRules {
    pub equity: FieldCandidates,
    pub available_balance: FieldCandidates,
    /// Source timestamp on the account summary, if the venue reports one.
    #[serde(default)]
    pub timestamp: Option<TimestampRule>,
    pub position: PositionRules,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PositionRules {
    pub size: FieldCandidates,
    pub instrument: FieldCandidates,
    /// Separator between base asset and the rest of the venue ticker.
    pub ticker_separator: char,
    pub liquidation_price: FieldCandidates,
    pub exposure: ExposureRule,
}

/// How a position's signed notional is obtained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum ExposureRule {
    /// Venue reports notional directly. Rounded to cents, sign taken from size.
    Notional { fields: FieldCandidates },
    /// Venue reports a mark price; exposure = size * mark.
    MarkPrice { fields: FieldCandidates },
    /// Venue reports neither; mark is derived from entry price and
    /// unrealized PnL. Zero-size rows are dropped.
    DerivedFromPnl {
        entry_price: FieldCandidates,
        unrealized_pnl: FieldCandidates,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampUnit {
    Nanos,
    Millis,
    Seconds,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimestampRule {
    pub fields: FieldCandidates,
    pub unit: TimestampUnit,
}

impl TimestampRule {
    /// Epoch timestamp from the record, or `None` when absent, non-positive
    /// or unparseable.
    pub fn read(&self, record: &RawRecord) -> Option<DateTime<Utc>> {
        let raw = epoch_integer(self.fields.lookup(record)?)?;
        if raw <= 0 {
            return None;
        }
        match self.unit {
            TimestampUnit::Nanos => DateTime::from_timestamp(
                raw.div_euclid(1_000_000_000),
                raw.rem_euclid(1_000_000_000) as u32,
            ),
            TimestampUnit::Millis => DateTime::from_timestamp_millis(raw),
            TimestampUnit::Seconds => DateTime::from_timestamp(raw, 0),
        }
    }
}

// Nanosecond epochs exceed f64 integer precision, so integers are read as i64
// first and floats only as a fallback.
fn epoch_integer(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let t = s.trim();
            t.parse::<i64>()
                .ok()
                .or_else(|| t.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
        }
        _ => None,
    }
}

impl VenueRules {
    /// GRVT: snake_case with camelCase fallbacks, native notional,
    /// `event_time` in nanoseconds, tickers like `BTC_USDT_Perp`.
    pub fn grvt() -> Self {
        Self {
            equity: FieldCandidates::from(&["total_equity", "totalEquity"][..]),
            available_balance: FieldCandidates::from(
                &["available_balance", "availableBalance"][..],
            ),
            timestamp: Some(TimestampRule {
                fields: FieldCandidates::from(&["event_time", "eventTime"][..]),
                unit: TimestampUnit::Nanos,
            }),
            position: PositionRules {
                size: FieldCandidates::from(&["size"][..]),
                instrument: FieldCandidates::from(&["instrument"][..]),
                ticker_separator: '_',
                liquidation_price: FieldCandidates::from(
                    &["est_liquidation_price", "estLiquidationPrice"][..],
                ),
                exposure: ExposureRule::Notional {
                    fields: FieldCandidates::from(&["notional", "notional_value"][..]),
                },
            },
        }
    }

    /// Paradex: no notional or mark on positions, markets like `ETH-USD-PERP`.
    pub fn paradex() -> Self {
        Self {
            equity: FieldCandidates::from(&["account_value"][..]),
            available_balance: FieldCandidates::from(&["free_collateral"][..]),
            timestamp: None,
            position: PositionRules {
                size: FieldCandidates::from(&["size"][..]),
                instrument: FieldCandidates::from(&["market"][..]),
                ticker_separator: '-',
                liquidation_price: FieldCandidates::from(&["liquidation_price"][..]),
                exposure: ExposureRule::DerivedFromPnl {
                    entry_price: FieldCandidates::from(&["average_entry_price"][..]),
                    unrealized_pnl: FieldCandidates::from(&["unrealized_pnl"][..]),
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rec(v: Value) -> RawRecord {
        pdk_schemas::as_record(v).unwrap()
    }

    #[test]
    fn grvt_event_time_nanos_parses_exactly() {
        let rule = VenueRules::grvt().timestamp.unwrap();
        let ts = rule
            .read(&rec(json!({"event_time": "1700000000123456789"})))
            .unwrap();
        assert_eq!(ts.timestamp(), 1_700_000_000);
        assert_eq!(ts.timestamp_subsec_nanos(), 123_456_789);
    }

    #[test]
    fn millis_and_seconds_units() {
        let ms = TimestampRule {
            fields: FieldCandidates::from(&["t"][..]),
            unit: TimestampUnit::Millis,
        };
        assert_eq!(
            ms.read(&rec(json!({"t": 1_700_000_000_500i64}))).unwrap().timestamp(),
            1_700_000_000
        );

        let s = TimestampRule {
            fields: FieldCandidates::from(&["t"][..]),
            unit: TimestampUnit::Seconds,
        };
        assert_eq!(
            s.read(&rec(json!({"t": "1700000000"}))).unwrap().timestamp(),
            1_700_000_000
        );
    }

    #[test]
    fn bad_timestamps_are_none() {
        let rule = VenueRules::grvt().timestamp.unwrap();
        assert!(rule.read(&rec(json!({}))).is_none());
        assert!(rule.read(&rec(json!({"event_time": "soon"}))).is_none());
        assert!(rule.read(&rec(json!({"event_time": "0"}))).is_none());
        assert!(rule.read(&rec(json!({"event_time": -5}))).is_none());
    }

    #[test]
    fn rules_round_trip_through_yaml_shaped_json() {
        let v = serde_json::to_value(VenueRules::paradex()).unwrap();
        assert_eq!(v["position"]["exposure"]["kind"], "derived_from_pnl");
        assert_eq!(v["position"]["ticker_separator"], "-");
        let back: VenueRules = serde_json::from_value(v).unwrap();
        assert_eq!(back, VenueRules::paradex());
    }
}
