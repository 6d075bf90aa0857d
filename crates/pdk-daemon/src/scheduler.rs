//! Timer-driven pushes.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{info, warn};

use pdk_notify::PushKind;

use crate::state::AppState;

/// Push a report every `interval`, starting immediately when `push_on_boot`.
///
/// A failed push is logged and the schedule carries on. Ticks missed while a
/// pass runs long are delayed, not bunched.
pub fn spawn_scheduler(
    state: Arc<AppState>,
    interval: Duration,
    push_on_boot: bool,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let start = if push_on_boot {
            Instant::now()
        } else {
            Instant::now() + interval
        };
        let mut ticker = interval_at(start, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            interval_secs = interval.as_secs(),
            push_on_boot, "scheduler started"
        );
        loop {
            ticker.tick().await;
            if let Err(e) = state.run_and_push(PushKind::Scheduled).await {
                warn!(error = %e, "scheduled push failed; retrying next tick");
            }
        }
    })
}
