//! Shared runtime state for pdk-daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum. The scheduler and the
//! bot loop hold the same `Arc`, so every pass, whoever triggers it, lands in
//! `last_pass` and on the bus.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{error, info};
use uuid::Uuid;

use pdk_notify::{PushKind, ReportSink};
use pdk_portfolio::PortfolioReport;
use pdk_runtime::{Monitor, PassOutcome, VenueFetch};

// ---------------------------------------------------------------------------
// BusMsg: SSE event bus payload
// ---------------------------------------------------------------------------

/// Messages broadcast over the internal event bus and surfaced as SSE events.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BusMsg {
    Heartbeat { ts_millis: i64 },
    PassCompleted(PassSummary),
    Pushed { pass_id: Uuid, kind: &'static str, ok: bool },
    LogLine { level: String, msg: String },
}

// ---------------------------------------------------------------------------
// BuildInfo
// ---------------------------------------------------------------------------

/// Static build metadata included in health / status responses.
#[derive(Clone, Debug, Serialize)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// Pass records
// ---------------------------------------------------------------------------

/// A completed pass as the daemon remembers it.
#[derive(Clone, Debug)]
pub struct PassRecord {
    pub pass_id: Uuid,
    pub outcome: PassOutcome,
}

impl PassRecord {
    pub fn report(&self) -> &PortfolioReport {
        &self.outcome.report
    }

    pub fn summary(&self) -> PassSummary {
        let report = &self.outcome.report;
        PassSummary {
            pass_id: self.pass_id,
            completed_at: self.outcome.completed_at,
            elapsed_ms: self.outcome.elapsed.as_millis() as u64,
            generated_at: report.generated_at.clone(),
            total_equity: report.total_equity,
            total_exposure: report.total_exposure,
            accounts: report.account_count(),
            positions: report.position_count(),
            fetches: self.outcome.fetches.clone(),
        }
    }
}

/// Headline numbers of one pass, carried in `/v1/status` and SSE events.
#[derive(Clone, Debug, Serialize)]
pub struct PassSummary {
    pub pass_id: Uuid,
    pub completed_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub generated_at: String,
    pub total_equity: f64,
    pub total_exposure: f64,
    pub accounts: usize,
    pub positions: usize,
    pub fetches: Vec<VenueFetch>,
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

pub struct AppState {
    /// Broadcast bus for SSE.
    pub bus: broadcast::Sender<BusMsg>,
    /// Static build metadata.
    pub build: BuildInfo,
    pub monitor: Monitor,
    /// Where pushes go. `None` when delivery is disabled.
    pub sink: Option<Arc<dyn ReportSink>>,
    pub last_pass: RwLock<Option<PassRecord>>,
    // One pass at a time across scheduler, bot and HTTP.
    pass_gate: Mutex<()>,
}

impl AppState {
    pub fn new(monitor: Monitor, sink: Option<Arc<dyn ReportSink>>) -> Self {
        let (bus, _rx) = broadcast::channel::<BusMsg>(1024);
        Self {
            bus,
            build: BuildInfo {
                service: "pdk-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
            monitor,
            sink,
            last_pass: RwLock::new(None),
            pass_gate: Mutex::new(()),
        }
    }

    /// Run one aggregation pass, remember it and announce it on the bus.
    pub async fn run_pass(&self) -> PassRecord {
        let _guard = self.pass_gate.lock().await;

        let record = PassRecord {
            pass_id: Uuid::new_v4(),
            outcome: self.monitor.run_pass().await,
        };
        *self.last_pass.write().await = Some(record.clone());

        let _ = self.bus.send(BusMsg::PassCompleted(record.summary()));
        record
    }

    /// Last completed pass, or a fresh one if none has run yet.
    pub async fn latest_or_run(&self) -> PassRecord {
        if let Some(record) = self.last_pass.read().await.clone() {
            return record;
        }
        self.run_pass().await
    }

    /// Run a pass and deliver it through the sink.
    ///
    /// The pass is recorded even when delivery fails.
    pub async fn run_and_push(&self, kind: PushKind) -> Result<PassRecord> {
        let sink = self
            .sink
            .clone()
            .ok_or_else(|| anyhow!("PUSH_DISABLED: no report sink configured"))?;

        let record = self.run_pass().await;
        let delivered = sink.deliver(record.report(), kind).await;

        let _ = self.bus.send(BusMsg::Pushed {
            pass_id: record.pass_id,
            kind: kind.as_str(),
            ok: delivered.is_ok(),
        });

        match delivered {
            Ok(()) => {
                info!(pass_id = %record.pass_id, kind = kind.as_str(), "report pushed");
                Ok(record)
            }
            Err(e) => {
                error!(
                    pass_id = %record.pass_id,
                    kind = kind.as_str(),
                    error = %e,
                    "report push failed"
                );
                let _ = self.bus.send(BusMsg::LogLine {
                    level: "ERROR".to_string(),
                    msg: format!("{} push failed", kind.as_str()),
                });
                Err(e)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Monotonically increasing uptime since first call (process lifetime).
pub fn uptime_secs() -> u64 {
    static START: std::sync::OnceLock<std::time::Instant> = std::sync::OnceLock::new();
    START
        .get_or_init(std::time::Instant::now)
        .elapsed()
        .as_secs()
}

/// Spawn a background task that emits a heartbeat SSE every `interval`.
pub fn spawn_heartbeat(bus: broadcast::Sender<BusMsg>, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let ts = Utc::now().timestamp_millis();
            let _ = bus.send(BusMsg::Heartbeat { ts_millis: ts });
        }
    });
}
