//! pdk-notify
//!
//! Downstream of the report: text rendering and delivery.
//! - [`render_text`]: monospaced report text
//! - [`TelegramClient`]: `sendMessage` delivery and `getUpdates` polling
//! - [`ReportSink`]: the seam the scheduler pushes through

use anyhow::Result;

use pdk_portfolio::PortfolioReport;

mod command;
mod render;
mod telegram;

pub use command::{command_from_update, BotCommand, HELP_TEXT};
pub use render::{format_leverage, format_usd, render_text};
pub use telegram::{escape_html, report_messages, Chat, Message, TelegramClient, Update};

/// Why a report is being delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushKind {
    Scheduled,
    Manual,
}

impl PushKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PushKind::Scheduled => "scheduled",
            PushKind::Manual => "manual",
        }
    }

    pub fn caption(&self) -> &'static str {
        match self {
            PushKind::Scheduled => "Perp DEX account & risk summary (auto push)",
            PushKind::Manual => "Perp DEX account & risk summary (manual trigger)",
        }
    }
}

/// Somewhere a finished report can be pushed.
#[async_trait::async_trait]
pub trait ReportSink: Send + Sync {
    async fn deliver(&self, report: &PortfolioReport, kind: PushKind) -> Result<()>;
}
