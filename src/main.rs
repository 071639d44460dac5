// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Postcraft local API server
//!
//! Runs on loopback next to the editor shell: formats posts for LinkedIn,
//! throttles AI suggestions and keeps the user's LinkedIn tokens fresh.

use postcraft::{config::Config, db::LocalStore, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Postcraft API");

    let db = match &config.store_path {
        Some(path) => {
            tracing::info!(path = %path, "Opening local store");
            LocalStore::open(path)
                .await
                .expect("Failed to open local store")
        }
        None => {
            tracing::warn!("STORE_PATH not set, tokens and preferences will not survive restart");
            LocalStore::in_memory()
        }
    };

    let state = Arc::new(
        AppState::new(config.clone(), db).expect("Failed to build HTTP clients"),
    );

    // Build router
    let app = postcraft::routes::create_router(state);

    // Loopback only: the API holds the user's LinkedIn credentials
    let addr = format!("127.0.0.1:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("postcraft=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
