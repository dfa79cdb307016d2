// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity Recorder service
//!
//! Records live GPS workouts fed by the platform shell and uploads the
//! finished track to the activity API.

use activity_recorder::{
    config::Config,
    services::{ActivityApiClient, LocationFeed, RecorderHandle},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        api = %config.api_base_url,
        "Starting Activity Recorder"
    );

    let location_feed = LocationFeed::default();
    let api = ActivityApiClient::new(&config.api_base_url, &config.api_token)?;

    let recorder = RecorderHandle::spawn(
        config.recorder_settings(),
        config.owner_id,
        Arc::new(location_feed.clone()),
        Arc::new(api),
    );

    let state = Arc::new(AppState {
        config: config.clone(),
        recorder: recorder.clone(),
        location_feed,
    });

    let app = activity_recorder::routes::create_router(state);

    // The shell runs on the same device
    let addr = format!("127.0.0.1:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    recorder.shutdown().await;
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Initialize structured JSON logging.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("activity_recorder=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
