// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! LinkedIn OAuth routes.
//!
//! The editor shell opens `/auth/linkedin` in the system browser; LinkedIn
//! redirects back to `/auth/linkedin/callback`, which stores the tokens and
//! sends the browser back to the shell.

use axum::{
    extract::{Query, State},
    response::Redirect,
    routing::get,
    Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{AppError, Result};
use crate::AppState;

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

/// How long a signed `state` stays valid.
const STATE_MAX_AGE_MS: u128 = 10 * 60 * 1000;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/linkedin", get(auth_start))
        .route("/auth/linkedin/callback", get(auth_callback))
}

/// Query parameters for starting OAuth flow.
#[derive(Deserialize)]
pub struct AuthStartParams {
    /// Shell URL to return to after OAuth completes.
    /// If not provided, uses the configured UI URL.
    #[serde(default)]
    redirect_uri: Option<String>,
}

fn now_millis() -> Result<u128> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
        .as_millis())
}

/// Sign "ui_url|timestamp_hex" and base64 the result for the URL.
fn sign_state(ui_url: &str, timestamp_ms: u128, secret: &[u8]) -> Result<String> {
    let payload = format!("{}|{:x}", ui_url, timestamp_ms);

    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(payload.as_bytes());
    let signature = mac.finalize().into_bytes();

    let signed = format!("{}|{}", payload, hex::encode(signature));
    Ok(URL_SAFE_NO_PAD.encode(signed.as_bytes()))
}

/// Verify HMAC signature and age, and decode the UI URL from `state`.
fn verify_and_decode_state(state: &str, secret: &[u8], now_ms: u128) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(state).ok()?;
    let state_str = String::from_utf8(bytes).ok()?;

    // Format is "ui_url|timestamp_hex|signature_hex"; the URL itself has no '|'
    let mut parts = state_str.rsplitn(3, '|');
    let signature_hex = parts.next()?;
    let timestamp_hex = parts.next()?;
    let ui_url = parts.next()?;

    let payload = format!("{}|{}", ui_url, timestamp_hex);
    let signature = hex::decode(signature_hex).ok()?;

    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(payload.as_bytes());
    if mac.verify_slice(&signature).is_err() {
        tracing::error!("OAuth state signature mismatch! Potential tampering.");
        return None;
    }

    let issued_ms = u128::from_str_radix(timestamp_hex, 16).ok()?;
    if now_ms.saturating_sub(issued_ms) > STATE_MAX_AGE_MS {
        tracing::warn!("OAuth state expired");
        return None;
    }

    Some(ui_url.to_string())
}

/// Start OAuth flow - redirect to LinkedIn authorization.
async fn auth_start(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AuthStartParams>,
) -> Result<Redirect> {
    let ui_url = params
        .redirect_uri
        .unwrap_or_else(|| state.config.ui_url.clone());
    if ui_url.contains('|') {
        return Err(AppError::BadRequest("Invalid redirect_uri".to_string()));
    }

    let oauth_state = sign_state(&ui_url, now_millis()?, &state.config.oauth_state_key)?;
    let auth_url = state
        .linkedin_service
        .client()
        .authorize_url(&oauth_state);

    tracing::info!(ui_url = %ui_url, "Starting OAuth flow, redirecting to LinkedIn");

    Ok(Redirect::temporary(&auth_url))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    state: String,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback - exchange code for tokens, store them, return to the shell.
async fn auth_callback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
) -> Result<Redirect> {
    let ui_url = verify_and_decode_state(&params.state, &state.config.oauth_state_key, now_millis()?)
        .ok_or_else(|| AppError::BadRequest("Invalid OAuth state".to_string()))?;

    // Check for OAuth errors (user cancelled, app not approved, ...)
    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from LinkedIn");
        let redirect = format!("{}?error={}", ui_url, urlencoding::encode(&error));
        return Ok(Redirect::temporary(&redirect));
    }

    let code = params
        .code
        .ok_or_else(|| AppError::BadRequest("Missing authorization code".to_string()))?;

    tracing::info!("Exchanging authorization code for tokens");
    let oauth_result = state.linkedin_service.handle_oauth_callback(&code).await?;

    tracing::info!(
        linkedin_id = %oauth_result.linkedin_id,
        name = %oauth_result.name,
        "OAuth successful, user and tokens stored"
    );

    let redirect_url = format!(
        "{}/callback?linkedin_id={}",
        ui_url,
        urlencoding::encode(&oauth_result.linkedin_id)
    );
    Ok(Redirect::temporary(&redirect_url))
}
