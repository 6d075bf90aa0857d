//! Telegram Bot API client: report delivery and command polling.
//!
//! The bot token is part of every request URL, so transport errors are
//! stripped of their URL before they reach a log line or error chain.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

use pdk_config::secrets::TelegramCredentials;
use pdk_portfolio::PortfolioReport;

use crate::render::render_text;
use crate::{PushKind, ReportSink};

/// Telegram rejects messages longer than this (in UTF-16 units; ASCII here).
const MAX_MESSAGE_LEN: usize = 4096;
// Headroom for caption markup and the `<pre>` wrapper.
const CHUNK_BUDGET: usize = MAX_MESSAGE_LEN - 200;

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    parse_mode: &'a str,
    disable_web_page_preview: bool,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Message {
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Chat {
    pub id: i64,
}

pub struct TelegramClient {
    http: reqwest::Client,
    api_base: String,
    creds: TelegramCredentials,
}

impl TelegramClient {
    pub fn new(api_base: &str, creds: TelegramCredentials, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build telegram http client")?;
        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            creds,
        })
    }

    /// Chat that receives pushes and is allowed to send commands.
    pub fn chat_id(&self) -> i64 {
        self.creds.chat_id
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.creds.bot_token, method)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: &impl Serialize,
        timeout: Option<Duration>,
    ) -> Result<T> {
        let mut req = self.http.post(self.method_url(method)).json(body);
        if let Some(t) = timeout {
            req = req.timeout(t);
        }
        let resp = req
            .send()
            .await
            .map_err(|e| anyhow!("TELEGRAM_TRANSPORT method={method}: {}", e.without_url()))?;

        let status = resp.status();
        let parsed: ApiResponse<T> = resp
            .json()
            .await
            .map_err(|e| anyhow!("TELEGRAM_DECODE method={method} status={status}: {}", e.without_url()))?;

        if !parsed.ok {
            bail!(
                "TELEGRAM_API_ERROR method={method} code={} {}",
                parsed.error_code.unwrap_or(i64::from(status.as_u16())),
                parsed.description.unwrap_or_default()
            );
        }
        parsed
            .result
            .ok_or_else(|| anyhow!("TELEGRAM_DECODE method={method}: missing result"))
    }

    /// Send raw HTML text to `chat_id`.
    pub async fn send_html(&self, chat_id: i64, html: &str) -> Result<()> {
        let req = SendMessageRequest {
            chat_id,
            text: html,
            parse_mode: "HTML",
            disable_web_page_preview: true,
        };
        self.call::<serde_json::Value>("sendMessage", &req, None)
            .await
            .map(|_| ())
    }

    /// Send plain text (escaped) to `chat_id`.
    pub async fn send_text(&self, chat_id: i64, text: &str) -> Result<()> {
        self.send_html(chat_id, &escape_html(text)).await
    }

    /// Render and send a report to `chat_id`, split across messages if needed.
    pub async fn send_report_to(
        &self,
        chat_id: i64,
        report: &PortfolioReport,
        kind: PushKind,
    ) -> Result<()> {
        let messages = report_messages(&render_text(report), kind.caption());
        let n = messages.len();
        for html in &messages {
            if let Err(e) = self.send_html(chat_id, html).await {
                error!(error = %e, "telegram report delivery failed");
                return Err(e);
            }
        }
        info!(chat_id, messages = n, kind = kind.as_str(), "telegram report sent");
        Ok(())
    }

    /// Long-poll for updates after `offset`.
    pub async fn get_updates(&self, offset: Option<i64>, poll_timeout_secs: u64) -> Result<Vec<Update>> {
        let mut body = json!({
            "timeout": poll_timeout_secs,
            "allowed_updates": ["message"],
        });
        if let Some(offset) = offset {
            body["offset"] = json!(offset);
        }
        // The HTTP timeout must outlast the server-side long poll.
        let http_timeout = Duration::from_secs(poll_timeout_secs + 10);
        self.call("getUpdates", &body, Some(http_timeout)).await
    }

    /// Skip everything queued while the bot was down. Returns the offset to
    /// poll from next.
    pub async fn drop_pending_updates(&self) -> Result<Option<i64>> {
        let body = json!({ "offset": -1, "timeout": 0 });
        let last: Vec<Update> = self.call("getUpdates", &body, None).await?;
        Ok(last.last().map(|u| u.update_id + 1))
    }
}

#[async_trait::async_trait]
impl ReportSink for TelegramClient {
    async fn deliver(&self, report: &PortfolioReport, kind: PushKind) -> Result<()> {
        self.send_report_to(self.creds.chat_id, report, kind).await
    }
}

/// Escape the three characters Telegram's HTML parse mode reserves.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Caption in bold, report in `<pre>` blocks, split on line boundaries so
/// every message stays under the Telegram size limit.
pub fn report_messages(text: &str, caption: &str) -> Vec<String> {
    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();
    for escaped in text.lines().flat_map(escaped_pieces) {
        if !current.is_empty() && current.len() + escaped.len() + 1 > CHUNK_BUDGET {
            chunks.push(std::mem::take(&mut current));
        }
        current.push_str(&escaped);
        current.push('\n');
    }
    if !current.is_empty() || chunks.is_empty() {
        chunks.push(current);
    }

    chunks
        .into_iter()
        .enumerate()
        .map(|(i, body)| {
            let body = body.trim_end();
            if i == 0 {
                format!("<b>{}</b>\n<pre>{}</pre>", escape_html(caption), body)
            } else {
                format!("<pre>{body}</pre>")
            }
        })
        .collect()
}

// One line, escaped, cut into pieces that each fit a chunk. Cuts fall between
// characters, never inside an entity.
fn escaped_pieces(line: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();
    let mut buf = [0u8; 4];
    for c in line.chars() {
        let escaped = escape_html(c.encode_utf8(&mut buf));
        if piece.len() + escaped.len() >= CHUNK_BUDGET {
            pieces.push(std::mem::take(&mut piece));
        }
        piece.push_str(&escaped);
    }
    pieces.push(piece);
    pieces
}
