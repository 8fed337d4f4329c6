// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Streakboard API Server
//!
//! Scores activities for community fitness events and serves their
//! leaderboards and completion status.

use anyhow::Context;
use std::sync::Arc;
use streakboard::{
    config::Config,
    db::MemoryStore,
    services::{IngestRateLimiter, LogNotifier, ScoringEngine},
    AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from environment
    let config = Config::from_env().context("Failed to load configuration")?;

    // Initialize structured JSON logging
    init_logging(&config.log_filter)?;
    tracing::info!(port = config.port, "Starting Streakboard API");

    let engine = ScoringEngine::new(Arc::new(MemoryStore::new()), Arc::new(LogNotifier));
    let rate_limiter =
        IngestRateLimiter::new(config.ingest_rate_limit, config.ingest_rate_window_secs);
    tracing::info!(
        limit = config.ingest_rate_limit,
        window_secs = config.ingest_rate_window_secs,
        "Ingestion rate limiter initialized"
    );

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        engine,
        rate_limiter,
    });

    // Build router
    let app = streakboard::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging(default_filter: &str) -> anyhow::Result<()> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    // RUST_LOG wins over the configured default
    let filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => tracing_subscriber::EnvFilter::try_new(default_filter)?,
    };

    tracing_subscriber::registry().with(filter).with(format).init();
    Ok(())
}
