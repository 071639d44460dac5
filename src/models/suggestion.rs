//! Suggestion request options and results.

use super::preferences::{UserPreferences, DEFAULT_TONE};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

pub const DEFAULT_MAX_TOKENS: u32 = 150;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Caller-supplied overrides. Every recognized option is listed here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "ui/src/lib/generated/")
)]
pub struct SuggestionOptions {
    #[serde(default)]
    #[validate(range(min = 1, max = 4096))]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 2.0))]
    pub temperature: Option<f32>,
    #[serde(default)]
    #[validate(length(min = 1, max = 64))]
    pub tone: Option<String>,
}

/// Generation parameters after resolving options against preferences.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub max_tokens: u32,
    pub temperature: f32,
    pub tone: String,
}

impl GenerationParams {
    /// Resolve once at call time: explicit option, then the preference
    /// (tone only), then the fixed default.
    pub fn resolve(options: &SuggestionOptions, prefs: Option<&UserPreferences>) -> Self {
        let tone = options
            .tone
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| prefs.map(|p| p.tone.as_str()).filter(|t| !t.trim().is_empty()))
            .unwrap_or(DEFAULT_TONE)
            .to_string();

        Self {
            max_tokens: options.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            temperature: options.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            tone,
        }
    }
}

/// A rewrite produced by the completion provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "ui/src/lib/generated/")
)]
pub struct Suggestion {
    pub text: String,
    pub tone: String,
    pub generated_at: String,
}
