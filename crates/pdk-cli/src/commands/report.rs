use std::time::Duration;

use anyhow::{bail, Result};
use serde::Serialize;

use pdk_config::secrets;
use pdk_notify::{render_text, PushKind, ReportSink, TelegramClient};
use pdk_portfolio::PortfolioReport;
use pdk_runtime::{Monitor, VenueFetch};

use super::load_settings;

#[derive(Serialize)]
struct ReportJson<'a> {
    report: &'a PortfolioReport,
    fetches: &'a [VenueFetch],
}

pub async fn run_report(config_paths: &[String], json: bool) -> Result<()> {
    let settings = load_settings(config_paths)?;
    let monitor = Monitor::from_settings(&settings)?;
    let outcome = monitor.run_pass().await;

    if json {
        let out = ReportJson {
            report: &outcome.report,
            fetches: &outcome.fetches,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print!("{}", render_text(&outcome.report));
        for f in outcome.fetches.iter().filter(|f| !f.is_ok()) {
            eprintln!(
                "venue_fetch_failed venue={} error={}",
                f.venue_id,
                f.error.as_deref().unwrap_or_default()
            );
        }
    }
    Ok(())
}

pub async fn run_push(config_paths: &[String]) -> Result<()> {
    let settings = load_settings(config_paths)?;
    if !settings.telegram.enabled {
        bail!("PUSH_DISABLED: telegram.enabled is false");
    }
    let creds = secrets::resolve_telegram(&settings.telegram)?;
    let client = TelegramClient::new(
        &settings.telegram.api_base,
        creds,
        Duration::from_secs(settings.schedule.fetch_timeout_secs),
    )?;

    let monitor = Monitor::from_settings(&settings)?;
    let report = monitor.run_once().await;
    client.deliver(&report, PushKind::Manual).await?;

    println!(
        "pushed=true accounts={} positions={}",
        report.account_count(),
        report.position_count()
    );
    Ok(())
}
