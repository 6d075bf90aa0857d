//! Runtime credential resolution.
//!
//! # Contract
//! - Config YAML stores only env var NAMES and prefixes, never values.
//! - Binaries resolve credentials once at startup and pass them into
//!   constructors; nothing else reads `std::env`.
//! - `Debug` impls on every secret-carrying struct **redact** values.
//! - Error messages name the env var, never its value.
//!
//! # Account discovery
//! Venue accounts are numbered env vars under the venue's `env_prefix`:
//! - GRVT: `<PREFIX>_API_KEY_<n>`, with optional `<PREFIX>_SUB_ACCOUNT_ID_<n>`
//! - Paradex: `<PREFIX>_JWT_<n>`
//!
//! Accounts are ordered by `n` numerically, so `_10` sorts after `_2`.

use anyhow::{bail, Result};
use std::collections::{BTreeMap, BTreeSet};

use crate::{TelegramSettings, VenueKind};

// ---------------------------------------------------------------------------
// Venue accounts
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, Eq)]
pub enum AccountSecret {
    Grvt {
        api_key: String,
        /// Empty when `<PREFIX>_SUB_ACCOUNT_ID_<n>` is unset.
        sub_account_id: String,
    },
    Paradex {
        jwt: String,
    },
}

impl std::fmt::Debug for AccountSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountSecret::Grvt { sub_account_id, .. } => f
                .debug_struct("Grvt")
                .field("api_key", &"<REDACTED>")
                .field("sub_account_id", sub_account_id)
                .finish(),
            AccountSecret::Paradex { .. } => f
                .debug_struct("Paradex")
                .field("jwt", &"<REDACTED>")
                .finish(),
        }
    }
}

/// One discovered account. `index` is the `<n>` suffix of its env vars.
#[derive(Clone, PartialEq, Eq)]
pub struct AccountCredentials {
    pub index: u32,
    pub secret: AccountSecret,
}

impl std::fmt::Debug for AccountCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut d = f.debug_struct("AccountCredentials");
        d.field("index", &self.index);
        match &self.secret {
            AccountSecret::Grvt { sub_account_id, .. } => d
                .field("api_key", &"<REDACTED>")
                .field("sub_account_id", sub_account_id),
            AccountSecret::Paradex { .. } => d.field("jwt", &"<REDACTED>"),
        };
        d.finish()
    }
}

/// Discover accounts for `kind` from an iterator of `(name, value)` env pairs.
///
/// Blank values count as unset. A GRVT index with a sub-account id but no
/// API key is skipped.
pub fn discover_accounts<I, K, V>(kind: VenueKind, prefix: &str, vars: I) -> Vec<AccountCredentials>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let prefix = format!("{}_", prefix.trim().trim_end_matches('_'));
    let suffixes: &[&str] = match kind {
        VenueKind::Grvt => &["API_KEY", "SUB_ACCOUNT_ID"],
        VenueKind::Paradex => &["JWT"],
    };

    // (suffix, n) -> value
    let mut found: BTreeMap<(&str, u32), String> = BTreeMap::new();
    let mut indices: BTreeSet<u32> = BTreeSet::new();

    for (k, v) in vars {
        let Some(rest) = k.as_ref().strip_prefix(&prefix) else {
            continue;
        };
        let Some((field, n)) = rest.rsplit_once('_') else {
            continue;
        };
        let Some(suffix) = suffixes.iter().find(|s| **s == field) else {
            continue;
        };
        let Ok(n) = n.parse::<u32>() else {
            continue;
        };
        let value = v.as_ref().trim();
        if value.is_empty() {
            continue;
        }
        found.insert((*suffix, n), value.to_string());
        indices.insert(n);
    }

    indices
        .into_iter()
        .filter_map(|n| {
            let secret = match kind {
                VenueKind::Grvt => AccountSecret::Grvt {
                    api_key: found.get(&("API_KEY", n))?.clone(),
                    sub_account_id: found
                        .get(&("SUB_ACCOUNT_ID", n))
                        .cloned()
                        .unwrap_or_default(),
                },
                VenueKind::Paradex => AccountSecret::Paradex {
                    jwt: found.get(&("JWT", n))?.clone(),
                },
            };
            Some(AccountCredentials { index: n, secret })
        })
        .collect()
}

/// [`discover_accounts`] over the process environment.
pub fn discover_accounts_from_env(kind: VenueKind, prefix: &str) -> Vec<AccountCredentials> {
    discover_accounts(kind, prefix, std::env::vars())
}

// ---------------------------------------------------------------------------
// Telegram
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, Eq)]
pub struct TelegramCredentials {
    pub bot_token: String,
    pub chat_id: i64,
}

impl std::fmt::Debug for TelegramCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramCredentials")
            .field("bot_token", &"<REDACTED>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

/// Resolve Telegram credentials through `lookup` (env var name -> value).
///
/// # Errors
/// `SECRETS_MISSING` naming the unset var, or `TELEGRAM_CHAT_ID_INVALID` when
/// the chat id is not a non-zero integer.
pub fn resolve_telegram_with<F>(settings: &TelegramSettings, lookup: F) -> Result<TelegramCredentials>
where
    F: Fn(&str) -> Option<String>,
{
    let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    let Some(bot_token) = read(&settings.bot_token_env) else {
        bail!(
            "SECRETS_MISSING: required env var '{}' (telegram bot token) is not set or empty",
            settings.bot_token_env
        );
    };
    let Some(raw_chat) = read(&settings.chat_id_env) else {
        bail!(
            "SECRETS_MISSING: required env var '{}' (telegram chat id) is not set or empty",
            settings.chat_id_env
        );
    };

    let chat_id = match raw_chat.trim().parse::<i64>() {
        Ok(id) if id != 0 => id,
        _ => bail!(
            "TELEGRAM_CHAT_ID_INVALID: env var '{}' must be a non-zero integer",
            settings.chat_id_env
        ),
    };

    Ok(TelegramCredentials {
        bot_token: bot_token.trim().to_string(),
        chat_id,
    })
}

/// [`resolve_telegram_with`] over the process environment.
pub fn resolve_telegram(settings: &TelegramSettings) -> Result<TelegramCredentials> {
    resolve_telegram_with(settings, |name| std::env::var(name).ok())
}
