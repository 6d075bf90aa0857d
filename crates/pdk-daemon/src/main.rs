//! pdk-daemon entry point.
//!
//! Thin on purpose: load config, build the monitor and the Telegram client,
//! start the scheduler and the command loop, then serve the control plane.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use pdk_config::{load_layered_yaml, report_unused_keys, secrets, UnusedKeyPolicy};
use pdk_daemon::{bot, routes, scheduler, state};
use pdk_notify::{ReportSink, TelegramClient};
use pdk_runtime::Monitor;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, warn, Level};

const DEFAULT_CONFIG_PATH: &str = "config/base.yaml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Silent if the file does not exist; production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let paths = config_paths_from_env();
    let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
    let loaded = load_layered_yaml(&path_refs)?;
    let unused = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)?;
    if !unused.is_clean() {
        warn!(unused = ?unused.unused_leaf_pointers, "config has unused keys");
    }
    let settings = loaded.settings()?;
    info!(config_hash = %loaded.config_hash, paths = ?paths, "config loaded");

    let monitor = Monitor::from_settings(&settings)?;

    let telegram = if settings.telegram.enabled {
        let creds = secrets::resolve_telegram(&settings.telegram)?;
        Some(Arc::new(TelegramClient::new(
            &settings.telegram.api_base,
            creds,
            Duration::from_secs(settings.schedule.fetch_timeout_secs),
        )?))
    } else {
        warn!("telegram disabled; reports are only served over HTTP");
        None
    };

    let sink = telegram.clone().map(|t| t as Arc<dyn ReportSink>);
    let shared = Arc::new(state::AppState::new(monitor, sink));

    state::spawn_heartbeat(shared.bus.clone(), Duration::from_secs(1));

    if let Some(client) = telegram {
        scheduler::spawn_scheduler(
            Arc::clone(&shared),
            Duration::from_secs(settings.schedule.interval_secs),
            settings.schedule.push_on_boot,
        );
        bot::spawn_command_loop(
            Arc::clone(&shared),
            client,
            settings.telegram.poll_timeout_secs,
        );
    }

    let app = routes::build_router(Arc::clone(&shared))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_localhost_only());

    let addr: SocketAddr = match bind_addr_from_env() {
        Some(a) => a,
        None => settings
            .daemon
            .bind_addr
            .parse()
            .with_context(|| {
                format!("CONFIG_INVALID: daemon.bind_addr '{}'", settings.daemon.bind_addr)
            })?,
    };
    info!("pdk-daemon listening on http://{}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server crashed")?;

    info!("pdk-daemon stopped");
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

/// `PDK_CONFIG` is a comma-separated list of YAML layers, base first.
fn config_paths_from_env() -> Vec<String> {
    match std::env::var("PDK_CONFIG") {
        Ok(v) if !v.trim().is_empty() => v
            .split(',')
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect(),
        _ => vec![DEFAULT_CONFIG_PATH.to_string()],
    }
}

fn bind_addr_from_env() -> Option<SocketAddr> {
    std::env::var("PDK_DAEMON_ADDR").ok()?.parse().ok()
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

/// CORS: allow only localhost origins.
fn cors_localhost_only() -> CorsLayer {
    let allowed_origins = [
        "http://localhost",
        "http://127.0.0.1",
        "http://localhost:3000",
        "http://127.0.0.1:3000",
        "http://localhost:5173",
        "http://127.0.0.1:5173",
    ];

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(tower_http::cors::Any)
}
