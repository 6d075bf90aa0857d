//! Typed settings read from the merged config document.
//!
//! Every section is optional. A missing section takes its defaults; a present
//! section only needs the keys it overrides.

use anyhow::{bail, Context, Result};
use chrono_tz::Tz;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use pdk_portfolio::VenueRules;

use crate::deep_merge;

pub const DEFAULT_TIMEZONE: &str = "Asia/Shanghai";

#[derive(Debug, Clone)]
pub struct Settings {
    pub report: ReportSettings,
    pub schedule: ScheduleSettings,
    pub telegram: TelegramSettings,
    pub daemon: DaemonSettings,
    /// Configured order; the report lists venues in this order.
    pub venues: Vec<VenueSettings>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportSettings {
    /// Zone `generated_at` is rendered in.
    pub timezone: Tz,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::Asia::Shanghai,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScheduleSettings {
    pub interval_secs: u64,
    pub push_on_boot: bool,
    /// Bound on every venue HTTP call and on each whole venue fetch.
    pub fetch_timeout_secs: u64,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            interval_secs: 1800,
            push_on_boot: true,
            fetch_timeout_secs: 30,
        }
    }
}

/// Telegram delivery. Holds env var NAMES, never the token itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TelegramSettings {
    pub enabled: bool,
    pub api_base: String,
    pub bot_token_env: String,
    pub chat_id_env: String,
    /// Long-poll timeout handed to `getUpdates`.
    pub poll_timeout_secs: u64,
}

impl Default for TelegramSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            api_base: "https://api.telegram.org".to_string(),
            bot_token_env: "TELEGRAM_BOT_TOKEN".to_string(),
            chat_id_env: "TELEGRAM_CHAT_ID".to_string(),
            poll_timeout_secs: 25,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DaemonSettings {
    pub bind_addr: String,
}

impl Default for DaemonSettings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8899".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VenueKind {
    Grvt,
    Paradex,
}

impl VenueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VenueKind::Grvt => "grvt",
            VenueKind::Paradex => "paradex",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "grvt" => Ok(VenueKind::Grvt),
            "paradex" => Ok(VenueKind::Paradex),
            other => bail!("VENUE_UNKNOWN_KIND: '{other}'; expected one of: grvt | paradex"),
        }
    }

    /// Built-in field mapping for this venue.
    pub fn default_rules(&self) -> VenueRules {
        match self {
            VenueKind::Grvt => VenueRules::grvt(),
            VenueKind::Paradex => VenueRules::paradex(),
        }
    }
}

/// Endpoint paths, relative to `base_url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VenueEndpoints {
    pub summary: String,
    pub positions: String,
    pub open_orders: String,
    pub fills: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VenueSettings {
    pub id: String,
    pub kind: VenueKind,
    /// Used in account labels, e.g. `GRVT_Acc01`.
    pub display_name: String,
    /// Credential env var prefix, e.g. `GRVT` for `GRVT_API_KEY_1`.
    pub env_prefix: String,
    pub base_url: String,
    /// Session login URL. Only GRVT logs in.
    pub auth_url: Option<String>,
    pub endpoints: VenueEndpoints,
    pub fills_limit: u32,
    pub rules: VenueRules,
}

impl VenueSettings {
    pub fn builtin(kind: VenueKind) -> Self {
        match kind {
            VenueKind::Grvt => Self {
                id: "grvt".to_string(),
                kind,
                display_name: "GRVT".to_string(),
                env_prefix: "GRVT".to_string(),
                base_url: "https://trades.grvt.io".to_string(),
                auth_url: Some("https://edge.grvt.io/auth/api_key/login".to_string()),
                endpoints: VenueEndpoints {
                    summary: "full/v1/account_summary".to_string(),
                    positions: "full/v1/positions".to_string(),
                    open_orders: "full/v1/open_orders".to_string(),
                    fills: "full/v1/fill_history".to_string(),
                },
                fills_limit: 500,
                rules: kind.default_rules(),
            },
            VenueKind::Paradex => Self {
                id: "paradex".to_string(),
                kind,
                display_name: "Paradex".to_string(),
                env_prefix: "PARADEX".to_string(),
                base_url: "https://api.prod.paradex.trade/v1".to_string(),
                auth_url: None,
                endpoints: VenueEndpoints {
                    summary: "account/summary".to_string(),
                    positions: "positions".to_string(),
                    open_orders: "orders".to_string(),
                    fills: "fills".to_string(),
                },
                fills_limit: 500,
                rules: kind.default_rules(),
            },
        }
    }

    /// `base_url` joined with a relative endpoint path.
    pub fn endpoint_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawReport {
    timezone: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawVenue {
    kind: String,
    id: Option<String>,
    display_name: Option<String>,
    env_prefix: Option<String>,
    base_url: Option<String>,
    auth_url: Option<String>,
    fills_limit: Option<u32>,
    /// Partial overrides, merged over the built-in paths.
    endpoints: Option<Value>,
    /// Partial overrides, merged over the built-in rules.
    rules: Option<Value>,
}

impl Settings {
    /// Read typed settings from a merged config document.
    ///
    /// Absent `venues` means both built-in venues, GRVT first.
    pub fn from_config_json(config: &Value) -> Result<Self> {
        let raw_report: RawReport = section(config, "/report")?;
        let tz_name = raw_report
            .timezone
            .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
        let timezone: Tz = tz_name
            .parse()
            .map_err(|_| anyhow::anyhow!("CONFIG_INVALID /report/timezone: unknown zone '{tz_name}'"))?;

        let schedule: ScheduleSettings = section(config, "/schedule")?;
        if schedule.interval_secs == 0 {
            bail!("CONFIG_INVALID /schedule/interval_secs: must be > 0");
        }
        if schedule.fetch_timeout_secs == 0 {
            bail!("CONFIG_INVALID /schedule/fetch_timeout_secs: must be > 0");
        }

        let telegram: TelegramSettings = section(config, "/telegram")?;
        let daemon: DaemonSettings = section(config, "/daemon")?;

        let venues = match config.pointer("/venues") {
            None | Some(Value::Null) => vec![
                VenueSettings::builtin(VenueKind::Grvt),
                VenueSettings::builtin(VenueKind::Paradex),
            ],
            Some(v) => {
                let raw: Vec<RawVenue> = serde_json::from_value(v.clone())
                    .context("CONFIG_INVALID /venues: expected a list of venue entries")?;
                let mut out: Vec<VenueSettings> = Vec::with_capacity(raw.len());
                for (i, rv) in raw.into_iter().enumerate() {
                    let venue = venue_from_raw(rv).with_context(|| format!("/venues/{i}"))?;
                    if out.iter().any(|o| o.id == venue.id) {
                        bail!("CONFIG_DUPLICATE_VENUE: id '{}' configured twice", venue.id);
                    }
                    out.push(venue);
                }
                out
            }
        };

        Ok(Settings {
            report: ReportSettings { timezone },
            schedule,
            telegram,
            daemon,
            venues,
        })
    }
}

fn section<T: DeserializeOwned + Default>(config: &Value, pointer: &str) -> Result<T> {
    match config.pointer(pointer) {
        None | Some(Value::Null) => Ok(T::default()),
        Some(v) => serde_json::from_value(v.clone())
            .with_context(|| format!("CONFIG_INVALID section {pointer}")),
    }
}

fn venue_from_raw(raw: RawVenue) -> Result<VenueSettings> {
    let kind = VenueKind::parse(&raw.kind)?;
    let mut v = VenueSettings::builtin(kind);

    if let Some(id) = raw.id {
        v.id = id;
    }
    if let Some(name) = raw.display_name {
        v.display_name = name;
    }
    if let Some(prefix) = raw.env_prefix {
        v.env_prefix = prefix;
    }
    if let Some(url) = raw.base_url {
        v.base_url = url;
    }
    if raw.auth_url.is_some() {
        v.auth_url = raw.auth_url;
    }
    if let Some(limit) = raw.fills_limit {
        v.fills_limit = limit;
    }
    if let Some(overrides) = raw.endpoints {
        v.endpoints = merge_over(&v.endpoints, overrides).context("CONFIG_INVALID endpoints")?;
    }
    if let Some(overrides) = raw.rules {
        v.rules = merge_rules(&v.rules, overrides).context("CONFIG_INVALID rules")?;
    }

    if v.id.trim().is_empty() {
        bail!("CONFIG_INVALID id: must not be empty");
    }
    if kind == VenueKind::Grvt && v.auth_url.is_none() {
        bail!("CONFIG_INVALID auth_url: required for grvt venues");
    }
    Ok(v)
}

fn merge_over<T: Serialize + DeserializeOwned>(base: &T, overrides: Value) -> Result<T> {
    let base = serde_json::to_value(base)?;
    Ok(serde_json::from_value(deep_merge(base, overrides))?)
}

/// Like [`merge_over`], except an exposure override that names a `kind`
/// replaces the built-in exposure rule instead of merging into it.
fn merge_rules(base: &VenueRules, overrides: Value) -> Result<VenueRules> {
    let mut base = serde_json::to_value(base)?;
    if let Some(exposure) = overrides.pointer("/position/exposure") {
        if exposure.get("kind").is_some() {
            if let Some(slot) = base.pointer_mut("/position/exposure") {
                *slot = exposure.clone();
            }
        }
    }
    Ok(serde_json::from_value(deep_merge(base, overrides))?)
}
