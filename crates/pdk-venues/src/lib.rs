//! pdk-venues
//!
//! Exchange adapters behind [`VenueAdapter`]. Each adapter fetches every
//! configured account of one venue and returns raw, venue-native records.
//! No field interpretation happens here.

use std::time::Duration;

use anyhow::Result;
use tracing::info;

use pdk_config::secrets::{discover_accounts_from_env, AccountCredentials};
use pdk_config::{Settings, VenueKind, VenueSettings};

mod adapter;
mod grvt;
mod http;
mod paradex;

pub use adapter::{AdapterError, VenueAdapter};
pub use grvt::GrvtAdapter;
pub use paradex::ParadexAdapter;

/// Build the adapter for one configured venue.
pub fn build_adapter(
    venue: &VenueSettings,
    credentials: Vec<AccountCredentials>,
    timeout: Duration,
) -> Result<Box<dyn VenueAdapter>> {
    let adapter: Box<dyn VenueAdapter> = match venue.kind {
        VenueKind::Grvt => Box::new(GrvtAdapter::new(venue.clone(), credentials, timeout)?),
        VenueKind::Paradex => Box::new(ParadexAdapter::new(venue.clone(), credentials, timeout)?),
    };
    Ok(adapter)
}

/// Adapters for every configured venue, in configured order, with accounts
/// discovered from the process environment.
///
/// A venue with no accounts still gets an adapter; it reports zero accounts.
pub fn adapters_from_env(settings: &Settings) -> Result<Vec<Box<dyn VenueAdapter>>> {
    let timeout = Duration::from_secs(settings.schedule.fetch_timeout_secs);
    settings
        .venues
        .iter()
        .map(|venue| {
            let credentials = discover_accounts_from_env(venue.kind, &venue.env_prefix);
            info!(venue = %venue.id, accounts = credentials.len(), "venue accounts discovered");
            build_adapter(venue, credentials, timeout)
        })
        .collect()
}
