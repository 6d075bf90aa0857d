//! GRVT adapter.
//!
//! Each account logs in with its API key; the login response carries a
//! `gravity` session cookie and an `X-Grvt-Account-Id` header that every
//! later call must echo. Data endpoints are `POST` with `sub_account_id` in
//! the body and answer inside a `{"result": ...}` envelope.

use std::time::Duration;

use anyhow::Result;
use futures_util::future::join_all;
use reqwest::header::SET_COOKIE;
use serde_json::{json, Value};
use tracing::{debug, warn};

use pdk_config::secrets::{AccountCredentials, AccountSecret};
use pdk_config::VenueSettings;
use pdk_schemas::{as_record, as_records, RawAccountRecord};

use crate::http::{build_client, or_empty, read_json, unwrap_envelope};
use crate::{AdapterError, VenueAdapter};

const SESSION_COOKIE: &str = "gravity";
const ACCOUNT_ID_HEADER: &str = "X-Grvt-Account-Id";

struct GrvtAccount {
    index: u32,
    api_key: String,
    sub_account_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct GrvtSession {
    cookie: String,
    account_id: String,
}

pub struct GrvtAdapter {
    venue: VenueSettings,
    accounts: Vec<GrvtAccount>,
    http: reqwest::Client,
}

impl GrvtAdapter {
    /// Non-GRVT credentials are ignored.
    pub fn new(
        venue: VenueSettings,
        credentials: Vec<AccountCredentials>,
        timeout: Duration,
    ) -> Result<Self> {
        let accounts = credentials
            .into_iter()
            .filter_map(|c| match c.secret {
                AccountSecret::Grvt {
                    api_key,
                    sub_account_id,
                } => Some(GrvtAccount {
                    index: c.index,
                    api_key,
                    sub_account_id,
                }),
                AccountSecret::Paradex { .. } => None,
            })
            .collect();

        Ok(Self {
            venue,
            accounts,
            http: build_client(timeout)?,
        })
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    async fn login(&self, api_key: &str) -> Result<GrvtSession, AdapterError> {
        let Some(auth_url) = self.venue.auth_url.as_deref() else {
            return Err(AdapterError::Auth("no auth_url configured".to_string()));
        };

        let resp = self
            .http
            .post(auth_url)
            .json(&json!({ "api_key": api_key }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AdapterError::Auth(format!("login status={}", status.as_u16())));
        }

        let cookie = resp
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(|v| session_cookie_value(v, SESSION_COOKIE));
        let account_id = resp
            .headers()
            .get(ACCOUNT_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        match (cookie, account_id) {
            (Some(cookie), Some(account_id)) => Ok(GrvtSession { cookie, account_id }),
            _ => Err(AdapterError::Auth(
                "login response missing session cookie or account id".to_string(),
            )),
        }
    }

    async fn post(
        &self,
        session: &GrvtSession,
        path: &str,
        body: Value,
    ) -> Result<Value, AdapterError> {
        let resp = self
            .http
            .post(self.venue.endpoint_url(path))
            .header("Cookie", format!("{SESSION_COOKIE}={}", session.cookie))
            .header(ACCOUNT_ID_HEADER, &session.account_id)
            .json(&body)
            .send()
            .await?;
        Ok(unwrap_envelope(read_json(resp).await?, "result"))
    }

    async fn fetch_account(&self, account: &GrvtAccount) -> RawAccountRecord {
        let venue = self.venue.id.as_str();
        let session = match self.login(&account.api_key).await {
            Ok(s) => s,
            Err(e) => {
                warn!(venue, account = account.index, error = %e, "login failed, account reported empty");
                return RawAccountRecord::unreachable();
            }
        };

        let sub = json!({ "sub_account_id": account.sub_account_id });
        let ep = &self.venue.endpoints;

        let summary = self
            .post(&session, &ep.summary, sub.clone())
            .await
            .map(|v| as_record(v).unwrap_or_default());
        let positions = self
            .post(&session, &ep.positions, sub.clone())
            .await
            .map(as_records);
        let open_orders = match self.post(&session, &ep.open_orders, sub).await {
            Err(AdapterError::Api { status: 404, .. }) => Ok(Vec::new()),
            other => other.map(as_records),
        };
        let fills = self
            .post(
                &session,
                &ep.fills,
                json!({
                    "sub_account_id": account.sub_account_id,
                    "limit": self.venue.fills_limit,
                }),
            )
            .await
            .map(as_records);

        let record = RawAccountRecord {
            summary: or_empty(summary, venue, account.index, "summary"),
            positions: or_empty(positions, venue, account.index, "positions"),
            open_orders: or_empty(open_orders, venue, account.index, "open_orders"),
            fills: or_empty(fills, venue, account.index, "fills"),
        };
        debug!(
            venue,
            account = account.index,
            positions = record.positions.len(),
            "account fetched"
        );
        record
    }
}

#[async_trait::async_trait]
impl VenueAdapter for GrvtAdapter {
    fn venue_id(&self) -> &str {
        &self.venue.id
    }

    fn display_name(&self) -> &str {
        &self.venue.display_name
    }

    async fn fetch_accounts(&self) -> Result<Vec<RawAccountRecord>, AdapterError> {
        Ok(join_all(self.accounts.iter().map(|a| self.fetch_account(a))).await)
    }
}

/// Value of cookie `name` from one `Set-Cookie` header line.
fn session_cookie_value(header: &str, name: &str) -> Option<String> {
    let pair = header.split(';').next()?;
    let (k, v) = pair.split_once('=')?;
    (k.trim() == name && !v.trim().is_empty()).then(|| v.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_parsing() {
        assert_eq!(
            session_cookie_value("gravity=abc123; Path=/; HttpOnly", "gravity").as_deref(),
            Some("abc123")
        );
        assert_eq!(session_cookie_value("other=x; Path=/", "gravity"), None);
        assert_eq!(session_cookie_value("gravity=; Path=/", "gravity"), None);
    }
}
