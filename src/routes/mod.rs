// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.

pub mod api;
pub mod auth;

use crate::middleware::require_local_token;
use crate::AppState;
use axum::extract::State;
use axum::http::{header, HeaderValue, Method};
use axum::{middleware, routing::get, Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({ "status": "ok", "open_sessions": state.sessions.len() }))
}

/// The editor shell itself, or any page served from this machine.
fn is_editor_origin(ui_url: &str, origin: &str) -> bool {
    if origin == ui_url {
        return true;
    }
    let Some(host) = origin.strip_prefix("http://") else {
        return false;
    };
    let host = host.split(':').next().unwrap_or_default();
    host == "localhost" || host == "127.0.0.1"
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    let ui_url = state.config.ui_url.clone();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            origin
                .to_str()
                .is_ok_and(|origin| is_editor_origin(&ui_url, origin))
        }))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    // Editor shell routes need the local token; OAuth redirects come from the browser
    let protected = api::routes().route_layer(middleware::from_fn_with_state(
        state.clone(),
        require_local_token,
    ));

    Router::new()
        .route("/health", get(health_check))
        .merge(auth::routes())
        .merge(protected)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
