//! Telegram command loop.
//!
//! Long-polls `getUpdates` and answers `/start`, `/summary` and `/now` from
//! the configured chat. Messages from any other chat are ignored. Updates
//! queued while the daemon was down are skipped on boot.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use pdk_notify::{command_from_update, BotCommand, PushKind, TelegramClient, HELP_TEXT};

use crate::state::AppState;

pub const GENERATING_TEXT: &str = "Generating the latest summary, please wait...";

const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(5);

pub fn spawn_command_loop(
    state: Arc<AppState>,
    client: Arc<TelegramClient>,
    poll_timeout_secs: u64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut offset = match client.drop_pending_updates().await {
            Ok(next) => next,
            Err(e) => {
                warn!(error = %e, "could not skip pending telegram updates");
                None
            }
        };
        info!(chat_id = client.chat_id(), "telegram command loop started");

        loop {
            let updates = match client.get_updates(offset, poll_timeout_secs).await {
                Ok(u) => u,
                Err(e) => {
                    warn!(error = %e, "telegram poll failed");
                    tokio::time::sleep(POLL_ERROR_BACKOFF).await;
                    continue;
                }
            };

            for update in updates {
                offset = Some(update.update_id + 1);
                let Some(cmd) = command_from_update(&update, client.chat_id()) else {
                    continue;
                };
                if let Err(e) = handle_command(&state, &client, cmd).await {
                    warn!(command = ?cmd, error = %e, "telegram command failed");
                }
            }
        }
    })
}

/// Answer one command in the configured chat.
pub async fn handle_command(
    state: &AppState,
    client: &TelegramClient,
    cmd: BotCommand,
) -> Result<()> {
    let chat = client.chat_id();
    info!(command = ?cmd, "telegram command");

    if !cmd.needs_report() {
        return client.send_text(chat, HELP_TEXT).await;
    }

    client.send_text(chat, GENERATING_TEXT).await?;
    let record = state.run_pass().await;
    client
        .send_report_to(chat, record.report(), PushKind::Manual)
        .await
}
