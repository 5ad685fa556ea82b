// ==============================================================================
// main.rs - Variant Result API Entry Point
// ==============================================================================
// Description: Axum web server for the /result variant resource
// Author: Matt Barham
// Created: 2026-10-17
// Modified: 2026-10-17
// Version: 1.0.0
// ==============================================================================

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use variant_result_api::{build_router, AppConfig, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables before clap reads its env fallbacks
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "variant_result_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false).compact())
        .init();

    let config = AppConfig::parse();
    info!("Starting Variant Result API v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Store: {:?} (source: {:?})",
        config.store_path, config.source_path
    );

    let addr = config.listen_addr();
    let state = AppState::new(config);
    if !state.store().is_available() {
        info!("No variant data present yet; /result will fail until a source file exists");
    }

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Variant Result API listening on {}", addr);

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}
