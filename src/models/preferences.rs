//! Per-user content preferences used to enrich suggestion prompts.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub const DEFAULT_TONE: &str = "professional";
pub const DEFAULT_INDUSTRY: &str = "General";
pub const DEFAULT_CONTENT_FOCUS: &str = "Thought Leadership";
pub const DEFAULT_THEME: &str = "light";

/// Snapshot of a user's preferences. Absent fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "ui/src/lib/generated/")
)]
pub struct UserPreferences {
    pub tone: String,
    pub industry: String,
    pub content_focus: String,
    pub topics: Vec<String>,
    pub theme: String,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            tone: DEFAULT_TONE.to_string(),
            industry: DEFAULT_INDUSTRY.to_string(),
            content_focus: DEFAULT_CONTENT_FOCUS.to_string(),
            topics: Vec::new(),
            theme: DEFAULT_THEME.to_string(),
        }
    }
}
