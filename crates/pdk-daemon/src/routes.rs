//! Axum router and all HTTP handlers for pdk-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers. Tests compose the bare router directly.

use std::{convert::Infallible, sync::Arc};

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures_util::{Stream, StreamExt};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::info;

use pdk_notify::{render_text, PushKind};

use crate::{
    api_types::{
        ErrorResponse, HealthResponse, PushResponse, ReportQuery, ReportResponse, StatusResponse,
    },
    state::{uptime_secs, AppState, BusMsg},
};

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the complete application router wired to the given shared state.
///
/// Middleware layers (CORS, tracing) are **not** applied here.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/status", get(status_handler))
        .route("/v1/report", get(report))
        .route("/v1/report/text", get(report_text))
        .route("/v1/report/push", post(report_push))
        .route("/v1/stream", get(stream))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service,
            version: st.build.version,
        }),
    )
}

// ---------------------------------------------------------------------------
// GET /v1/status
// ---------------------------------------------------------------------------

pub(crate) async fn status_handler(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    let last_pass = st.last_pass.read().await.as_ref().map(|r| r.summary());
    (
        StatusCode::OK,
        Json(StatusResponse {
            daemon_uptime_secs: uptime_secs(),
            venues: st.monitor.venue_ids(),
            push_enabled: st.sink.is_some(),
            last_pass,
        }),
    )
}

// ---------------------------------------------------------------------------
// GET /v1/report, GET /v1/report/text
// ---------------------------------------------------------------------------

pub(crate) async fn report(
    State(st): State<Arc<AppState>>,
    Query(q): Query<ReportQuery>,
) -> impl IntoResponse {
    let record = if q.refresh {
        st.run_pass().await
    } else {
        st.latest_or_run().await
    };
    (
        StatusCode::OK,
        Json(ReportResponse {
            pass_id: record.pass_id,
            report: record.outcome.report,
        }),
    )
}

pub(crate) async fn report_text(
    State(st): State<Arc<AppState>>,
    Query(q): Query<ReportQuery>,
) -> impl IntoResponse {
    let record = if q.refresh {
        st.run_pass().await
    } else {
        st.latest_or_run().await
    };
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        render_text(record.report()),
    )
}

// ---------------------------------------------------------------------------
// POST /v1/report/push
// ---------------------------------------------------------------------------

/// Run a pass and deliver it as a manual push.
///
/// 503 when no sink is configured, 502 when the sink rejects delivery.
pub(crate) async fn report_push(State(st): State<Arc<AppState>>) -> Response {
    if st.sink.is_none() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: "PUSH_DISABLED: no report sink configured".to_string(),
            }),
        )
            .into_response();
    }

    info!("report/push");
    match st.run_and_push(PushKind::Manual).await {
        Ok(record) => (
            StatusCode::OK,
            Json(PushResponse {
                pushed: true,
                pass_id: record.pass_id,
                accounts: record.report().account_count(),
            }),
        )
            .into_response(),
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse {
                error: format!("{e:#}"),
            }),
        )
            .into_response(),
    }
}

// ---------------------------------------------------------------------------
// GET /v1/stream  (SSE)
// ---------------------------------------------------------------------------

pub(crate) async fn stream(State(st): State<Arc<AppState>>) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert("Cache-Control", HeaderValue::from_static("no-cache"));
    headers.insert("Connection", HeaderValue::from_static("keep-alive"));

    let rx = st.bus.subscribe();
    let events = broadcast_to_sse(rx);

    (headers, Sse::new(events).keep_alive(KeepAlive::new())).into_response()
}

fn broadcast_to_sse(
    rx: broadcast::Receiver<BusMsg>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    BroadcastStream::new(rx).filter_map(|msg| async move {
        match msg {
            Ok(m) => {
                let event_name = match &m {
                    BusMsg::Heartbeat { .. } => "heartbeat",
                    BusMsg::PassCompleted(_) => "pass",
                    BusMsg::Pushed { .. } => "push",
                    BusMsg::LogLine { .. } => "log",
                };
                let data = serde_json::to_string(&m).ok()?;
                Some(Ok(Event::default().event(event_name).data(data)))
            }
            Err(_) => None, // lagged / closed
        }
    })
}
