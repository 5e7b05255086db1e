// =============================================================================
// stock-lens — Main Entry Point
// =============================================================================
//
// Backend for the stock lookup dashboard: resolves a company, fetches daily
// KRX prices, attaches indicators and serves everything as JSON / CSV.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod api;
mod app_state;
mod clock;
mod dashboard;
mod date_range;
mod error;
mod export;
mod indicators;
mod market_data;
mod runtime_config;
mod symbols;
mod types;

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::clock::SystemClock;
use crate::market_data::{KrxListingClient, ListingSource, NaverChartClient, StaticListing};
use crate::runtime_config::DashboardConfig;
use crate::symbols::{ListingCache, SymbolResolver};

const CONFIG_PATH: &str = "dashboard_config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("stock-lens starting up");

    let mut config = DashboardConfig::load(CONFIG_PATH).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        DashboardConfig::default()
    });
    config.apply_env_overrides();

    // ── 2. Upstream clients ──────────────────────────────────────────────
    let timeout = config.request_timeout();

    let listing: Arc<dyn ListingSource> = match &config.listing_file {
        Some(path) => Arc::new(StaticListing::from_file(path)?),
        None => Arc::new(KrxListingClient::new(config.listing_url.clone(), timeout)?),
    };
    let prices = Arc::new(NaverChartClient::new(config.price_source_url.clone(), timeout)?);

    info!(
        price_source = %config.price_source_url,
        listing = config.listing_file.as_deref().unwrap_or(&config.listing_url),
        listing_ttl_secs = config.listing_ttl_secs,
        "upstream sources configured"
    );

    // ── 3. Shared state ──────────────────────────────────────────────────
    let clock = Arc::new(SystemClock);
    let resolver = SymbolResolver::new(ListingCache::new(listing, clock.clone(), config.listing_ttl()));
    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState::new(config, resolver, prices, clock));

    // ── 4. Serve until Ctrl+C ────────────────────────────────────────────
    let app = api::rest::router(state.clone());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind API server on {bind_addr}"))?;
    info!(addr = %bind_addr, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for shutdown signal");
            }
            warn!("Shutdown signal received — stopping gracefully");
        })
        .await
        .context("API server failed")?;

    info!(queries_served = state.queries_served(), "stock-lens shut down complete.");
    Ok(())
}
