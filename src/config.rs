// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Loaded once at startup; a `.env` file in the working directory is honored
//! for local development.

use std::env;
use std::time::Duration;

/// Default OpenAI-compatible endpoint for completions.
pub const DEFAULT_COMPLETION_BASE_URL: &str = "https://api.openai.com/v1";

/// Default completion model.
pub const DEFAULT_COMPLETION_MODEL: &str = "gpt-4o-mini";

/// LinkedIn OAuth host (authorize + token endpoints).
pub const LINKEDIN_OAUTH_BASE_URL: &str = "https://www.linkedin.com";

/// LinkedIn REST API host.
pub const LINKEDIN_API_BASE_URL: &str = "https://api.linkedin.com";

/// Upper bound on any single outbound HTTP request.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- LinkedIn OAuth ---
    /// LinkedIn OAuth client ID (public)
    pub linkedin_client_id: String,
    /// LinkedIn OAuth client secret
    pub linkedin_client_secret: String,
    /// Redirect URI registered with the LinkedIn app
    pub linkedin_redirect_uri: String,
    /// Override for the OAuth host (tests point this at a local server)
    pub linkedin_oauth_base_url: String,
    /// Override for the REST API host
    pub linkedin_api_base_url: String,

    // --- Completion provider ---
    pub completion_api_key: String,
    pub completion_base_url: String,
    pub completion_model: String,
    /// Timeout for every LinkedIn and completion request
    pub http_timeout: Duration,

    // --- Local API ---
    /// Editor shell URL, used for CORS and post-OAuth redirects
    pub ui_url: String,
    /// Loopback port
    pub port: u16,
    /// Shared secret the editor shell sends as a bearer token
    pub local_api_token: String,
    /// HMAC key for signing the OAuth `state` parameter
    pub oauth_state_key: Vec<u8>,
    /// JSON snapshot of the local store
    pub store_path: Option<String>,

    // --- Suggestion throttling ---
    pub suggestion: SuggestionConfig,
}

/// Timing and gating knobs for the suggestion pipeline.
#[derive(Debug, Clone)]
pub struct SuggestionConfig {
    /// Quiet period after the last keystroke before an automatic trigger fires.
    pub debounce: Duration,
    /// Cooldown after an automatic suggestion completes.
    pub auto_cooldown: Duration,
    /// Cooldown after the user dismisses a suggestion.
    pub dismiss_cooldown: Duration,
    /// Minimum trimmed draft length for automatic triggers.
    pub min_auto_chars: usize,
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(1500),
            auto_cooldown: Duration::from_secs(30),
            dismiss_cooldown: Duration::from_secs(10),
            min_auto_chars: 10,
        }
    }
}

impl Config {
    /// Config for tests only.
    pub fn test_default() -> Self {
        Self {
            linkedin_client_id: "test_client_id".to_string(),
            linkedin_client_secret: "test_secret".to_string(),
            linkedin_redirect_uri: "http://localhost:8787/auth/linkedin/callback".to_string(),
            linkedin_oauth_base_url: LINKEDIN_OAUTH_BASE_URL.to_string(),
            linkedin_api_base_url: LINKEDIN_API_BASE_URL.to_string(),
            completion_api_key: "test_api_key".to_string(),
            completion_base_url: DEFAULT_COMPLETION_BASE_URL.to_string(),
            completion_model: DEFAULT_COMPLETION_MODEL.to_string(),
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            ui_url: "http://localhost:5173".to_string(),
            port: 8787,
            local_api_token: "test_local_token".to_string(),
            oauth_state_key: b"test_state_key_32_bytes_minimum!".to_vec(),
            store_path: None,
            suggestion: SuggestionConfig::default(),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let defaults = SuggestionConfig::default();
        let suggestion = SuggestionConfig {
            debounce: env_duration_ms("SUGGESTION_DEBOUNCE_MS").unwrap_or(defaults.debounce),
            auto_cooldown: env_duration_secs("SUGGESTION_COOLDOWN_SECS")
                .unwrap_or(defaults.auto_cooldown),
            dismiss_cooldown: env_duration_secs("SUGGESTION_DISMISS_COOLDOWN_SECS")
                .unwrap_or(defaults.dismiss_cooldown),
            min_auto_chars: defaults.min_auto_chars,
        };

        let local_api_token = required("LOCAL_API_TOKEN")?;

        Ok(Self {
            linkedin_client_id: required("LINKEDIN_CLIENT_ID")?,
            linkedin_client_secret: required("LINKEDIN_CLIENT_SECRET")?,
            linkedin_redirect_uri: env::var("LINKEDIN_REDIRECT_URI").unwrap_or_else(|_| {
                "http://localhost:8787/auth/linkedin/callback".to_string()
            }),
            linkedin_oauth_base_url: env::var("LINKEDIN_OAUTH_BASE_URL")
                .unwrap_or_else(|_| LINKEDIN_OAUTH_BASE_URL.to_string()),
            linkedin_api_base_url: env::var("LINKEDIN_API_BASE_URL")
                .unwrap_or_else(|_| LINKEDIN_API_BASE_URL.to_string()),
            completion_api_key: required("OPENAI_API_KEY")?,
            completion_base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_COMPLETION_BASE_URL.to_string()),
            completion_model: env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| DEFAULT_COMPLETION_MODEL.to_string()),
            http_timeout: env_duration_secs("HTTP_TIMEOUT_SECS").unwrap_or(DEFAULT_HTTP_TIMEOUT),
            ui_url: env::var("UI_URL").unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8787".to_string())
                .parse()
                .unwrap_or(8787),
            // Falls back to the local API token so a single secret is enough for dev.
            oauth_state_key: env::var("OAUTH_STATE_KEY")
                .map(|v| v.trim().to_string())
                .unwrap_or_else(|_| local_api_token.clone())
                .into_bytes(),
            local_api_token,
            store_path: env::var("STORE_PATH").ok(),
            suggestion,
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .map(|v| v.trim().to_string())
        .map_err(|_| ConfigError::Missing(name))
}

fn env_duration_ms(name: &str) -> Option<Duration> {
    env::var(name)
        .ok()?
        .parse()
        .ok()
        .map(Duration::from_millis)
}

fn env_duration_secs(name: &str) -> Option<Duration> {
    env::var(name).ok()?.parse().ok().map(Duration::from_secs)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
