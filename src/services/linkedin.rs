// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! LinkedIn API client for OAuth and posting.
//!
//! Handles:
//! - Authorization-code exchange and token refresh
//! - Member profile lookup (OpenID userinfo)
//! - Creating posts from formatted editor content

use crate::config::Config;
use crate::db::LocalStore;
use crate::error::AppError;
use crate::models::{RichTextDocument, UserProfile, UserToken};
use crate::services::formatter::{self, LINKEDIN_MAX_POST_CHARS};
use crate::services::token::TokenManager;
use anyhow::Context;
use chrono::Utc;
use serde::Deserialize;

/// OAuth scopes requested at sign-in.
pub const OAUTH_SCOPES: &str = "openid profile email w_member_social";

/// LinkedIn API client.
#[derive(Clone)]
pub struct LinkedInClient {
    http: reqwest::Client,
    oauth_base_url: String,
    api_base_url: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl LinkedInClient {
    /// Create a new LinkedIn client with OAuth credentials.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .context("failed building LinkedIn HTTP client")?;

        Ok(Self {
            http,
            oauth_base_url: config.linkedin_oauth_base_url.trim_end_matches('/').to_string(),
            api_base_url: config.linkedin_api_base_url.trim_end_matches('/').to_string(),
            client_id: config.linkedin_client_id.clone(),
            client_secret: config.linkedin_client_secret.clone(),
            redirect_uri: config.linkedin_redirect_uri.clone(),
        })
    }

    fn token_url(&self) -> String {
        format!("{}/oauth/v2/accessToken", self.oauth_base_url)
    }

    /// Browser URL that starts the OAuth consent flow.
    pub fn authorize_url(&self, state: &str) -> String {
        format!(
            "{}/oauth/v2/authorization?\
             response_type=code&\
             client_id={}&\
             redirect_uri={}&\
             scope={}&\
             state={}",
            self.oauth_base_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(OAUTH_SCOPES),
            urlencoding::encode(state)
        )
    }

    /// Refresh an expired access token.
    pub async fn refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenRefreshResponse, AppError> {
        let response = self
            .http
            .post(self.token_url())
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::LinkedInApi(format!("Token refresh request failed: {}", e)))?;

        self.check_response_json(response).await
    }

    /// Exchange an authorization code for tokens.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenRefreshResponse, AppError> {
        let response = self
            .http
            .post(self.token_url())
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::LinkedInApi(format!("Token exchange failed: {}", e)))?;

        self.check_response_json(response).await
    }

    /// Get the authenticated member's OpenID profile.
    pub async fn get_userinfo(&self, access_token: &str) -> Result<LinkedInUserInfo, AppError> {
        let response = self
            .http
            .get(format!("{}/v2/userinfo", self.api_base_url))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::LinkedInApi(e.to_string()))?;

        self.check_response_json(response).await
    }

    /// Publish a text post for `linkedin_id`. Returns the post URN.
    pub async fn create_post(
        &self,
        access_token: &str,
        linkedin_id: &str,
        text: &str,
    ) -> Result<String, AppError> {
        let body = serde_json::json!({
            "author": format!("urn:li:person:{}", linkedin_id),
            "lifecycleState": "PUBLISHED",
            "specificContent": {
                "com.linkedin.ugc.ShareContent": {
                    "shareCommentary": { "text": text },
                    "shareMediaCategory": "NONE"
                }
            },
            "visibility": {
                "com.linkedin.ugc.MemberNetworkVisibility": "PUBLIC"
            }
        });

        let response = self
            .http
            .post(format!("{}/v2/ugcPosts", self.api_base_url))
            .bearer_auth(access_token)
            .header("X-Restli-Protocol-Version", "2.0.0")
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::LinkedInApi(e.to_string()))?;

        let header_id = response
            .headers()
            .get("x-restli-id")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        // 201 responses may carry the id only in the header, with an empty body.
        let body = self.check_response(response).await?.text().await.unwrap_or_default();
        let created: CreatedPost = serde_json::from_str(&body).unwrap_or_default();
        header_id
            .or(created.id)
            .ok_or_else(|| AppError::LinkedInApi("Post created without an id".to_string()))
    }

    /// Check response status and return error if not successful.
    async fn check_response(
        &self,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, AppError> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status.as_u16() == 429 {
            tracing::warn!("LinkedIn rate limit hit (429)");
        }

        // Unauthorized - token expired or revoked
        if status.as_u16() == 401 {
            return Err(AppError::LinkedInApi(
                AppError::LINKEDIN_TOKEN_ERROR.to_string(),
            ));
        }

        Err(AppError::LinkedInApi(format!("HTTP {}: {}", status, body)))
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        self.check_response(response)
            .await?
            .json()
            .await
            .map_err(|e| AppError::LinkedInApi(format!("JSON parse error: {}", e)))
    }
}

/// Token endpoint response (refresh and code exchange share the shape).
#[derive(Debug, Clone, Deserialize)]
pub struct TokenRefreshResponse {
    pub access_token: String,
    pub expires_in: i64,
    /// Only present for apps with programmatic refresh enabled; may rotate.
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub refresh_token_expires_in: Option<i64>,
}

/// OpenID Connect userinfo response.
#[derive(Debug, Clone, Deserialize)]
pub struct LinkedInUserInfo {
    pub sub: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CreatedPost {
    #[serde(default)]
    id: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// LinkedInService - High-level service with token management
// ─────────────────────────────────────────────────────────────────────────────

/// High-level LinkedIn service: every authenticated call goes through the
/// token manager.
#[derive(Clone)]
pub struct LinkedInService {
    client: LinkedInClient,
    tokens: TokenManager,
    store: LocalStore,
}

/// Result of handling OAuth callback.
#[derive(Debug, Clone)]
pub struct OAuthResult {
    pub linkedin_id: String,
    pub name: String,
}

impl LinkedInService {
    pub fn new(client: LinkedInClient, tokens: TokenManager, store: LocalStore) -> Self {
        Self {
            client,
            tokens,
            store,
        }
    }

    pub fn client(&self) -> &LinkedInClient {
        &self.client
    }

    /// Handle OAuth callback: exchange code for tokens, store user and tokens.
    pub async fn handle_oauth_callback(&self, code: &str) -> Result<OAuthResult, AppError> {
        let issued_at = Utc::now();
        let token_response = self.client.exchange_code(code).await?;
        let info = self.client.get_userinfo(&token_response.access_token).await?;

        let now = issued_at.to_rfc3339();
        let created_at = match self.store.get_user(&info.sub).await? {
            Some(existing) => existing.created_at,
            None => now.clone(),
        };
        let name = info.name.clone().unwrap_or_default();

        let user = UserProfile {
            linkedin_id: info.sub.clone(),
            name: name.clone(),
            email: info.email,
            picture: info.picture,
            created_at,
            last_active: now,
        };

        if let Err(e) = self.store.upsert_user(&user).await {
            tracing::warn!(error = %e, "Failed to store user profile, continuing anyway");
        }

        let token = UserToken {
            linkedin_id: info.sub.clone(),
            access_token: token_response.access_token,
            refresh_token: token_response.refresh_token.unwrap_or_default(),
            expires_in_seconds: token_response.expires_in,
            token_created_at: issued_at,
        };
        self.tokens.store_initial_token(&token).await?;

        tracing::info!(
            linkedin_id = %info.sub,
            has_refresh_token = !token.refresh_token.is_empty(),
            "OAuth callback handled, user and tokens stored"
        );

        Ok(OAuthResult {
            linkedin_id: info.sub,
            name,
        })
    }

    /// Format an editor document and publish it.
    pub async fn share_post(
        &self,
        linkedin_id: &str,
        doc: &RichTextDocument,
    ) -> Result<String, AppError> {
        let text = formatter::format(doc);
        if text.as_str().is_empty() {
            return Err(AppError::BadRequest("Post is empty".to_string()));
        }
        if !formatter::fits_post_limit(&text) {
            return Err(AppError::BadRequest(format!(
                "Post is {} characters, LinkedIn allows {}",
                text.char_count(),
                LINKEDIN_MAX_POST_CHARS
            )));
        }

        let access_token = self.tokens.get_valid_access_token(linkedin_id).await?;
        let urn = self
            .client
            .create_post(&access_token, linkedin_id, text.as_str())
            .await
            .map_err(|e| {
                // A token LinkedIn rejected before its expiry was revoked
                if e.is_linkedin_token_error() {
                    AppError::ReauthRequired(e.to_string())
                } else {
                    e
                }
            })?;

        tracing::info!(linkedin_id, post = %urn, chars = text.char_count(), "Post published");
        Ok(urn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorize_url_encodes_parameters() {
        let config = Config::test_default();
        let client = LinkedInClient::new(&config).unwrap();
        let url = client.authorize_url("abc|def");

        assert!(url.starts_with("https://www.linkedin.com/oauth/v2/authorization?"));
        assert!(url.contains("client_id=test_client_id"));
        assert!(url.contains(
            "redirect_uri=http%3A%2F%2Flocalhost%3A8787%2Fauth%2Flinkedin%2Fcallback"
        ));
        assert!(url.contains("scope=openid%20profile%20email%20w_member_social"));
        assert!(url.contains("state=abc%7Cdef"));
    }

    #[test]
    fn test_refresh_response_without_refresh_token() {
        let resp: TokenRefreshResponse =
            serde_json::from_str(r#"{"access_token":"a","expires_in":5184000}"#).unwrap();
        assert_eq!(resp.expires_in, 5_184_000);
        assert!(resp.refresh_token.is_none());
    }
}
