//! Paradex adapter.
//!
//! Stateless: every call carries the account's JWT as a bearer token.
//! The summary endpoint may answer with an object or a list of summaries
//! (first one wins); list endpoints may be bare arrays or `{"results": [...]}`.

use std::time::Duration;

use anyhow::Result;
use futures_util::future::join_all;
use serde_json::Value;
use tracing::debug;

use pdk_config::secrets::{AccountCredentials, AccountSecret};
use pdk_config::VenueSettings;
use pdk_schemas::{as_record, as_records, RawAccountRecord, RawRecord};

use crate::http::{build_client, or_empty, read_json, unwrap_envelope};
use crate::{AdapterError, VenueAdapter};

struct ParadexAccount {
    index: u32,
    jwt: String,
}

pub struct ParadexAdapter {
    venue: VenueSettings,
    accounts: Vec<ParadexAccount>,
    http: reqwest::Client,
}

impl ParadexAdapter {
    /// Non-Paradex credentials are ignored.
    pub fn new(
        venue: VenueSettings,
        credentials: Vec<AccountCredentials>,
        timeout: Duration,
    ) -> Result<Self> {
        let accounts = credentials
            .into_iter()
            .filter_map(|c| match c.secret {
                AccountSecret::Paradex { jwt } => Some(ParadexAccount {
                    index: c.index,
                    jwt,
                }),
                AccountSecret::Grvt { .. } => None,
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

    async fn get(
        &self,
        account: &ParadexAccount,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Value, AdapterError> {
        let resp = self
            .http
            .get(self.venue.endpoint_url(path))
            .bearer_auth(&account.jwt)
            .header("Accept", "application/json")
            .query(query)
            .send()
            .await?;
        match read_json(resp).await {
            Err(AdapterError::Api {
                status: 401 | 403, ..
            }) => Err(AdapterError::Auth("jwt rejected".to_string())),
            other => other,
        }
    }

    async fn fetch_account(&self, account: &ParadexAccount) -> RawAccountRecord {
        let venue = self.venue.id.as_str();
        let ep = &self.venue.endpoints;

        let summary = self.get(account, &ep.summary, &[]).await.map(first_summary);
        let positions = self
            .get(account, &ep.positions, &[])
            .await
            .map(list_results);
        let open_orders = match self.get(account, &ep.open_orders, &[]).await {
            Err(AdapterError::Api { status: 404, .. }) => Ok(Vec::new()),
            other => other.map(list_results),
        };
        let fills = self
            .get(
                account,
                &ep.fills,
                &[("limit", self.venue.fills_limit.to_string())],
            )
            .await
            .map(list_results);

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
impl VenueAdapter for ParadexAdapter {
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

fn first_summary(v: Value) -> RawRecord {
    match v {
        Value::Array(items) => items.into_iter().next().and_then(as_record),
        other => as_record(other),
    }
    .unwrap_or_default()
}

fn list_results(v: Value) -> Vec<RawRecord> {
    as_records(unwrap_envelope(v, "results"))
}
