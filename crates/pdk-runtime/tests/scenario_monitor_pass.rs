//! Scenario: a full aggregation pass over in-process adapters.
//!
//! Invariants:
//! 1. Report venue order equals configured order, not completion order.
//! 2. An erroring venue appears with zero totals and a recorded error.
//! 3. A venue slower than the fetch timeout appears with zero totals.
//! 4. Unreachable accounts still appear, with zero metrics.
//! 5. Venue rules drive normalization per venue.

use std::time::Duration;

use serde_json::json;

use pdk_portfolio::VenueRules;
use pdk_runtime::Monitor;
use pdk_schemas::{as_record, RawAccountRecord};
use pdk_venues::{AdapterError, VenueAdapter};

struct StubAdapter {
    id: &'static str,
    name: &'static str,
    delay: Duration,
    result: Result<Vec<RawAccountRecord>, AdapterError>,
}

#[async_trait::async_trait]
impl VenueAdapter for StubAdapter {
    fn venue_id(&self) -> &str {
        self.id
    }

    fn display_name(&self) -> &str {
        self.name
    }

    async fn fetch_accounts(&self) -> Result<Vec<RawAccountRecord>, AdapterError> {
        tokio::time::sleep(self.delay).await;
        self.result.clone()
    }
}

fn grvt_account(equity: &str, positions: serde_json::Value) -> RawAccountRecord {
    RawAccountRecord {
        summary: as_record(json!({
            "total_equity": equity,
            "available_balance": "0",
            "event_time": "1700000000000000000"
        }))
        .unwrap(),
        positions: pdk_schemas::as_records(positions),
        ..RawAccountRecord::default()
    }
}

fn paradex_account(value: &str) -> RawAccountRecord {
    RawAccountRecord {
        summary: as_record(json!({ "account_value": value, "free_collateral": "0" })).unwrap(),
        positions: pdk_schemas::as_records(json!([{
            "market": "SOL-USD-PERP",
            "size": "-10",
            "average_entry_price": "150",
            "unrealized_pnl": "100"
        }])),
        ..RawAccountRecord::default()
    }
}

fn stub(
    id: &'static str,
    name: &'static str,
    delay_ms: u64,
    result: Result<Vec<RawAccountRecord>, AdapterError>,
) -> Box<dyn VenueAdapter> {
    Box::new(StubAdapter {
        id,
        name,
        delay: Duration::from_millis(delay_ms),
        result,
    })
}

#[tokio::test]
async fn scenario_order_is_configured_not_completion() {
    let monitor = Monitor::new(chrono_tz::Asia::Shanghai, Duration::from_secs(5))
        .with_venue(
            stub(
                "grvt",
                "GRVT",
                80,
                Ok(vec![grvt_account(
                    "1000",
                    json!([
                        { "instrument": "BTC_USDT_Perp", "size": "1", "notional": "500" },
                        { "instrument": "ETH_USDT_Perp", "size": "-1", "notional": "200" }
                    ]),
                )]),
            ),
            VenueRules::grvt(),
        )
        .with_venue(
            stub("paradex", "Paradex", 0, Ok(vec![paradex_account("1400")])),
            VenueRules::paradex(),
        );
    assert_eq!(monitor.venue_ids(), ["grvt", "paradex"]);

    let outcome = monitor.run_pass().await;
    let r = &outcome.report;
    assert_eq!(r.venues[0].venue_id, "grvt");
    assert_eq!(r.venues[1].venue_id, "paradex");

    let grvt = &r.venues[0].accounts[0];
    assert_eq!(grvt.metrics.net_exposure, 300.0);
    assert_eq!(grvt.metrics.gross_exposure, 700.0);
    assert_eq!(grvt.metrics.net_leverage, 0.3);
    assert_eq!(grvt.metrics.gross_leverage, 0.7);

    // short 10 @ entry 150, pnl +100 => mark 140, notional 1400
    let paradex = &r.venues[1].accounts[0];
    assert_eq!(paradex.positions[0].instrument, "SOL-PERP");
    assert_eq!(paradex.positions[0].exposure_value, -1400.0);
    assert_eq!(paradex.metrics.gross_leverage, 1.0);

    assert_eq!(r.total_equity, 2400.0);
    assert_eq!(r.total_exposure, 300.0 - 1400.0);
    assert_eq!(r.generated_at, "2023-11-15 06:13:20");
    assert!(outcome.fetches.iter().all(|f| f.is_ok()));
}

#[tokio::test]
async fn scenario_failed_and_slow_venues_degrade_to_empty() {
    let monitor = Monitor::new(chrono_tz::Asia::Shanghai, Duration::from_millis(100))
        .with_venue(
            stub(
                "grvt",
                "GRVT",
                0,
                Err(AdapterError::Transport("connection refused".to_string())),
            ),
            VenueRules::grvt(),
        )
        .with_venue(
            stub("paradex", "Paradex", 2_000, Ok(vec![paradex_account("999")])),
            VenueRules::paradex(),
        )
        .with_venue(
            stub(
                "grvt-2",
                "GRVT2",
                0,
                Ok(vec![RawAccountRecord::unreachable(), grvt_account("10", json!([]))]),
            ),
            VenueRules::grvt(),
        );

    let outcome = monitor.run_pass().await;
    let r = &outcome.report;
    assert_eq!(r.venues.len(), 3);

    assert!(r.venues[0].is_all_zero());
    assert!(r.venues[0].accounts.is_empty());
    assert!(outcome.fetches[0]
        .error
        .as_deref()
        .unwrap()
        .contains("connection refused"));

    assert!(r.venues[1].is_all_zero());
    assert_eq!(outcome.fetches[1].error.as_deref(), Some("timeout"));

    assert_eq!(r.venues[2].accounts.len(), 2);
    assert_eq!(r.venues[2].accounts[0].equity, 0.0);
    assert_eq!(r.venues[2].equity_total, 10.0);
    assert_eq!(r.total_equity, 10.0);
}

#[tokio::test]
async fn scenario_no_venues_is_empty_report() {
    let monitor = Monitor::new(chrono_tz::Asia::Shanghai, Duration::from_secs(1));
    let report = monitor.run_once().await;
    assert!(report.venues.is_empty());
    assert_eq!(report.generated_at, "N/A");
}
