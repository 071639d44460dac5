//! User model for storage and API.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// User profile stored locally after the first OAuth exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// LinkedIn member ID (OpenID `sub`, also used as the record key)
    pub linkedin_id: String,
    /// Display name
    pub name: String,
    /// Email address (may be None if not shared)
    pub email: Option<String>,
    /// Profile picture URL
    pub picture: Option<String>,
    /// When user first connected
    pub created_at: String,
    /// Last sign-in timestamp
    pub last_active: String,
}

/// User's LinkedIn OAuth tokens.
///
/// `token_created_at + expires_in_seconds` is the only source of truth for
/// freshness; nothing caches an "is valid" flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserToken {
    pub linkedin_id: String,
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime as reported by LinkedIn
    pub expires_in_seconds: i64,
    /// When the access token was issued (epoch milliseconds on the wire)
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub token_created_at: DateTime<Utc>,
}

impl UserToken {
    /// Instant after which the access token must be refreshed, or `None`
    /// when the stored lifetime is out of range.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let lifetime = Duration::try_seconds(self.expires_in_seconds)?;
        self.token_created_at.checked_add_signed(lifetime)
    }

    /// Whether the access token is still usable at `now`. An out-of-range
    /// lifetime counts as expired.
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|expiry| now < expiry)
    }
}
