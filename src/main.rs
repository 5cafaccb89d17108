//! Location Gateway Server
//!
//! Main entry point for the location resolution HTTP service.

use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use location_gateway::{
    config::StartupMode, open_store, server, spawn_refresh_loop, EngineSettings, GatewayConfig,
    ResolutionEngine,
};

/// Default configuration path
const DEFAULT_CONFIG_PATH: &str = "config/location_gateway.yaml";

/// Default server address
const DEFAULT_ADDR: &str = "0.0.0.0:8085";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "location_gateway=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting location gateway");

    // Load configuration
    let config_path = std::env::var("LOCATION_GATEWAY_CONFIG")
        .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    tracing::info!(path = %config_path, "Loading configuration");

    let config = GatewayConfig::from_file(&config_path)
        .with_context(|| format!("failed to load {}", config_path))?;

    tracing::info!(
        languages = ?config.languages,
        refresh_interval = config.refresh.interval_secs,
        district_rules = config.district_alias_rules.len(),
        "Configuration loaded"
    );

    let store = open_store(&config.store)
        .await
        .context("failed to open gazetteer store")?;
    let settings = EngineSettings::from_config(&config)?;
    let engine = Arc::new(ResolutionEngine::new(store, settings));

    // Initial load based on startup mode
    match config.refresh.startup_mode {
        StartupMode::Sync => {
            tracing::info!("Performing synchronous initial load");
            let stats = engine
                .refresh()
                .await
                .context("initial snapshot load failed")?;
            tracing::info!(snapshot_version = stats.version, "Initial load complete, ready");
        }
        StartupMode::Async => {
            tracing::info!("Starting asynchronous initial load");
            let initial = engine.clone();
            tokio::spawn(async move {
                if let Err(e) = initial.refresh().await {
                    tracing::error!(error = %e, "Initial async load failed");
                } else {
                    tracing::info!("Initial async load complete");
                }
            });
        }
    }

    // Start background refresh loop
    spawn_refresh_loop(
        engine.clone(),
        Duration::from_secs(config.refresh.interval_secs),
    );

    let addr =
        std::env::var("LOCATION_GATEWAY_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!(%addr, "Starting HTTP server");

    axum::serve(listener, server::router(engine)).await?;

    Ok(())
}
