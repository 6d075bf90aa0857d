//! Scenario: Paradex adapter against a mock venue.
//!
//! Invariants:
//! 1. Every call carries `Authorization: Bearer <jwt>`.
//! 2. Summary lists take the first element; `results` envelopes unwrap.
//! 3. Fills request the configured limit.
//! 4. A rejected JWT still yields one (empty) record per account.
//! 5. `build_adapter` dispatches on venue kind.

use std::time::Duration;

use httpmock::prelude::*;
use serde_json::json;

use pdk_config::secrets::{AccountCredentials, AccountSecret};
use pdk_config::{VenueKind, VenueSettings};
use pdk_venues::{build_adapter, ParadexAdapter, VenueAdapter};

fn venue(server: &MockServer) -> VenueSettings {
    let mut v = VenueSettings::builtin(VenueKind::Paradex);
    v.base_url = server.base_url();
    v
}

fn creds(index: u32, jwt: &str) -> AccountCredentials {
    AccountCredentials {
        index,
        secret: AccountSecret::Paradex {
            jwt: jwt.to_string(),
        },
    }
}

#[tokio::test]
async fn scenario_full_account_fetch() {
    let server = MockServer::start_async().await;
    let summary = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/account/summary")
                .header("authorization", "Bearer jwt-1");
            then.status(200).json_body(json!([
                { "account_value": "2500", "free_collateral": "900" },
                { "account_value": "1" }
            ]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/positions")
                .header("authorization", "Bearer jwt-1");
            then.status(200).json_body(json!({
                "results": [
                    { "market": "BTC-USD-PERP", "size": "0.1", "average_entry_price": "60000", "unrealized_pnl": "100" },
                    { "market": "ETH-USD-PERP", "size": "0", "average_entry_price": "3000", "unrealized_pnl": "0" }
                ]
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/orders");
            then.status(200)
                .json_body(json!({ "results": [{ "id": "o1" }] }));
        })
        .await;
    let fills = server
        .mock_async(|when, then| {
            when.method(GET).path("/fills").query_param("limit", "500");
            then.status(200).json_body(json!([{ "id": "f1" }]));
        })
        .await;

    let adapter =
        ParadexAdapter::new(venue(&server), vec![creds(1, "jwt-1")], Duration::from_secs(5))
            .unwrap();
    let records = adapter.fetch_accounts().await.unwrap();

    assert_eq!(records.len(), 1);
    let rec = &records[0];
    assert_eq!(rec.summary["account_value"], "2500");
    // Raw records are untouched; zero-size rows are dropped during normalization.
    assert_eq!(rec.positions.len(), 2);
    assert_eq!(rec.open_orders.len(), 1);
    assert_eq!(rec.fills.len(), 1);

    summary.assert_async().await;
    fills.assert_async().await;
}

#[tokio::test]
async fn scenario_open_orders_404_is_empty() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/orders");
            then.status(404);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/account/summary");
            then.status(200).json_body(json!({ "account_value": "10" }));
        })
        .await;

    let adapter =
        ParadexAdapter::new(venue(&server), vec![creds(1, "jwt-1")], Duration::from_secs(5))
            .unwrap();
    let rec = adapter.fetch_accounts().await.unwrap().remove(0);
    assert_eq!(rec.summary["account_value"], "10");
    assert!(rec.open_orders.is_empty());
}

#[tokio::test]
async fn scenario_rejected_jwt_keeps_account_visible() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|_when, then| {
            then.status(401).body("unauthorized");
        })
        .await;

    let adapter = ParadexAdapter::new(
        venue(&server),
        vec![creds(1, "expired"), creds(2, "also-expired")],
        Duration::from_secs(5),
    )
    .unwrap();
    let records = adapter.fetch_accounts().await.unwrap();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| !r.has_summary() && r.positions.is_empty()));
}

#[tokio::test]
async fn scenario_build_adapter_dispatches_on_kind() {
    let server = MockServer::start_async().await;
    let mut grvt = VenueSettings::builtin(VenueKind::Grvt);
    grvt.id = "grvt-main".to_string();
    let paradex = venue(&server);

    let a = build_adapter(&grvt, Vec::new(), Duration::from_secs(1)).unwrap();
    let b = build_adapter(&paradex, vec![creds(1, "jwt")], Duration::from_secs(1)).unwrap();
    assert_eq!(a.venue_id(), "grvt-main");
    assert_eq!(a.display_name(), "GRVT");
    assert_eq!(b.venue_id(), "paradex");
    assert_eq!(b.display_name(), "Paradex");
}
