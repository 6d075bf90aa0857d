//! Scenario: missing or malformed venue values never fail normalization.
//!
//! Invariants:
//! 1. `None`, `""` and `"N/A"` return the configured default.
//! 2. A record built entirely of junk normalizes to a zero account.
//! 3. Tickers without a separator normalize to `"N/A"`.

use pdk_portfolio::{normalize_account, safe_numeric, safe_numeric_str, VenueRules};
use pdk_schemas::{as_record, RawAccountRecord};
use serde_json::{json, Value};

#[test]
fn scenario_sentinels_return_default() {
    for default in [0.0, -1.0, 42.5] {
        assert_eq!(safe_numeric(None, default), default);
        assert_eq!(safe_numeric(Some(&Value::Null), default), default);
        assert_eq!(safe_numeric(Some(&json!("")), default), default);
        assert_eq!(safe_numeric(Some(&json!("N/A")), default), default);
        assert_eq!(safe_numeric(Some(&json!("garbage")), default), default);
        assert_eq!(safe_numeric_str("", default), default);
        assert_eq!(safe_numeric_str("N/A", default), default);
    }
    assert_eq!(safe_numeric(Some(&json!("12.5")), 0.0), 12.5);
    assert_eq!(safe_numeric(Some(&json!(7)), 0.0), 7.0);
}

#[test]
fn scenario_junk_account_degrades_to_zero() {
    let raw = RawAccountRecord {
        summary: as_record(json!({
            "total_equity": "N/A",
            "available_balance": null,
            "event_time": "later"
        }))
        .unwrap(),
        positions: vec![as_record(json!({
            "instrument": "BTC",
            "size": "",
            "notional": "N/A",
            "est_liquidation_price": "0"
        }))
        .unwrap()],
        open_orders: Vec::new(),
        fills: Vec::new(),
    };

    let acc = normalize_account(&raw, &VenueRules::grvt());
    assert_eq!(acc.equity, 0.0);
    assert_eq!(acc.available_balance, 0.0);
    assert!(acc.observed_at.is_none());
    assert_eq!(acc.positions.len(), 1);

    let p = &acc.positions[0];
    assert_eq!(p.instrument, "N/A");
    assert_eq!(p.size, 0.0);
    assert_eq!(p.exposure_value, 0.0);
    assert_eq!(p.liquidation_price, 0.0);
    assert_eq!(acc.metrics.gross_leverage, 0.0);
}

#[test]
fn scenario_camel_case_fallbacks_are_read() {
    let raw = RawAccountRecord {
        summary: as_record(json!({
            "totalEquity": "2500.5",
            "availableBalance": "1000",
            "eventTime": 1_700_000_000_000_000_000i64
        }))
        .unwrap(),
        ..RawAccountRecord::default()
    };
    let acc = normalize_account(&raw, &VenueRules::grvt());
    assert_eq!(acc.equity, 2500.5);
    assert_eq!(acc.available_balance, 1000.0);
    assert_eq!(acc.observed_at.map(|t| t.timestamp()), Some(1_700_000_000));
}
