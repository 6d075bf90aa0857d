//! Scenario: Telegram client against a mock Bot API.
//!
//! Invariants:
//! 1. Reports go to the configured chat as HTML with a caption.
//! 2. `ok: false` responses surface as TELEGRAM_API_ERROR.
//! 3. Errors never contain the bot token.
//! 4. getUpdates decodes messages; pending updates can be skipped.

use std::time::Duration;

use httpmock::prelude::*;
use serde_json::json;

use pdk_config::secrets::TelegramCredentials;
use pdk_notify::{command_from_update, BotCommand, PushKind, ReportSink, TelegramClient};
use pdk_portfolio::{aggregate_portfolio, aggregate_venue, AccountSnapshot};

const TOKEN: &str = "123456:TEST-TOKEN";

fn client(server: &MockServer) -> TelegramClient {
    TelegramClient::new(
        &server.base_url(),
        TelegramCredentials {
            bot_token: TOKEN.to_string(),
            chat_id: 4242,
        },
        Duration::from_secs(5),
    )
    .unwrap()
}

fn report() -> pdk_portfolio::PortfolioReport {
    aggregate_portfolio(
        vec![aggregate_venue(
            "grvt",
            "GRVT",
            vec![AccountSnapshot::new(1500.0, 0.0, Vec::new())],
        )],
        chrono_tz::Asia::Shanghai,
    )
}

#[tokio::test]
async fn scenario_deliver_sends_html_report() {
    let server = MockServer::start_async().await;
    let send = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(format!("/bot{TOKEN}/sendMessage"))
                .json_body_partial(r#"{"chat_id": 4242, "parse_mode": "HTML"}"#)
                .body_contains("auto push")
                .body_contains("$1,500");
            then.status(200)
                .json_body(json!({ "ok": true, "result": { "message_id": 1 } }));
        })
        .await;

    let tg = client(&server);
    tg.deliver(&report(), PushKind::Scheduled).await.unwrap();
    send.assert_async().await;
}

#[tokio::test]
async fn scenario_api_error_is_reported_without_token() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(format!("/bot{TOKEN}/sendMessage"));
            then.status(400).json_body(json!({
                "ok": false,
                "error_code": 400,
                "description": "Bad Request: chat not found"
            }));
        })
        .await;

    let err = client(&server)
        .send_text(1, "hello")
        .await
        .unwrap_err()
        .to_string();
    assert!(err.contains("TELEGRAM_API_ERROR"), "got: {err}");
    assert!(err.contains("chat not found"), "got: {err}");
    assert!(!err.contains(TOKEN), "token leaked: {err}");
}

#[tokio::test]
async fn scenario_transport_error_hides_token() {
    // Nothing listens on port 9 (discard); connection is refused.
    let tg = TelegramClient::new(
        "http://127.0.0.1:9",
        TelegramCredentials {
            bot_token: TOKEN.to_string(),
            chat_id: 1,
        },
        Duration::from_secs(2),
    )
    .unwrap();
    let err = format!("{:#}", tg.send_text(1, "x").await.unwrap_err());
    assert!(err.contains("TELEGRAM_TRANSPORT"), "got: {err}");
    assert!(!err.contains(TOKEN), "token leaked: {err}");
}

#[tokio::test]
async fn scenario_get_updates_and_commands() {
    let server = MockServer::start_async().await;
    let updates = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(format!("/bot{TOKEN}/getUpdates"))
                .json_body_partial(r#"{"offset": 10, "timeout": 1}"#);
            then.status(200).json_body(json!({
                "ok": true,
                "result": [
                    { "update_id": 10, "message": { "chat": { "id": 4242 }, "text": "/summary" } },
                    { "update_id": 11, "message": { "chat": { "id": 999 }, "text": "/now" } },
                    { "update_id": 12, "edited_message": { "chat": { "id": 4242 } } }
                ]
            }));
        })
        .await;

    let tg = client(&server);
    let got = tg.get_updates(Some(10), 1).await.unwrap();
    updates.assert_async().await;

    assert_eq!(got.len(), 3);
    let cmds: Vec<_> = got
        .iter()
        .map(|u| command_from_update(u, tg.chat_id()))
        .collect();
    assert_eq!(cmds, [Some(BotCommand::Summary), None, None]);
}

#[tokio::test]
async fn scenario_drop_pending_updates_returns_next_offset() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path(format!("/bot{TOKEN}/getUpdates"))
                .json_body_partial(r#"{"offset": -1}"#);
            then.status(200).json_body(json!({
                "ok": true,
                "result": [{ "update_id": 77 }]
            }));
        })
        .await;

    assert_eq!(client(&server).drop_pending_updates().await.unwrap(), Some(78));
}
