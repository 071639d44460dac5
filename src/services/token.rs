// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! LinkedIn access-token lifecycle.
//!
//! The stored `token_created_at + expires_in_seconds` decides freshness on
//! every call. Refreshes are single-flight per user: the first caller to see
//! an expired token starts a shared refresh future and everyone arriving
//! while it runs awaits that same future. LinkedIn refresh tokens can be
//! single-use, so a duplicate refresh would fail.

use crate::db::LocalStore;
use crate::error::TokenError;
use crate::models::UserToken;
use crate::services::linkedin::LinkedInClient;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use std::sync::Arc;

type RefreshFuture = Shared<BoxFuture<'static, Result<String, TokenError>>>;

/// Shared map of in-flight refreshes, keyed by LinkedIn ID.
pub type InFlightRefreshes = Arc<DashMap<String, RefreshFuture>>;

/// Owns token freshness for every signed-in user.
#[derive(Clone)]
pub struct TokenManager {
    client: LinkedInClient,
    store: LocalStore,
    in_flight: InFlightRefreshes,
}

impl TokenManager {
    pub fn new(client: LinkedInClient, store: LocalStore) -> Self {
        Self {
            client,
            store,
            in_flight: Arc::new(DashMap::new()),
        }
    }

    /// Get a currently valid access token, refreshing only when expired.
    pub async fn get_valid_access_token(&self, linkedin_id: &str) -> Result<String, TokenError> {
        let token = self.load(linkedin_id).await?;

        if token.is_fresh_at(Utc::now()) {
            return Ok(token.access_token);
        }

        self.join_refresh(linkedin_id).await
    }

    /// Persist the token from the first authorization-code exchange.
    pub async fn store_initial_token(&self, token: &UserToken) -> Result<(), TokenError> {
        self.store
            .set_tokens(token)
            .await
            .map_err(|e| TokenError::Store(e.to_string()))
    }

    /// Number of refreshes currently in flight.
    pub fn refreshes_in_flight(&self) -> usize {
        self.in_flight.len()
    }

    async fn load(&self, linkedin_id: &str) -> Result<UserToken, TokenError> {
        self.store
            .get_tokens(linkedin_id)
            .await
            .map_err(|e| TokenError::Store(e.to_string()))?
            .ok_or_else(|| TokenError::UserNotFound(linkedin_id.to_string()))
    }

    /// Attach to the running refresh for this user, or start one.
    fn join_refresh(&self, linkedin_id: &str) -> RefreshFuture {
        match self.in_flight.entry(linkedin_id.to_string()) {
            Entry::Occupied(entry) => {
                tracing::debug!(linkedin_id, "Joining in-flight token refresh");
                entry.get().clone()
            }
            Entry::Vacant(entry) => {
                let this = self.clone();
                let key = linkedin_id.to_string();
                let refresh = async move {
                    let result = this.refresh(&key).await;
                    this.in_flight.remove(&key);
                    result
                }
                .boxed()
                .shared();
                entry.insert(refresh.clone());
                refresh
            }
        }
    }

    async fn refresh(&self, linkedin_id: &str) -> Result<String, TokenError> {
        // Re-read: a refresh that finished after our caller loaded the record
        // has already replaced it.
        let current = self.load(linkedin_id).await?;
        let issued_at = Utc::now();
        if current.is_fresh_at(issued_at) {
            return Ok(current.access_token);
        }

        if current.refresh_token.is_empty() {
            return Err(TokenError::RefreshFailed(
                "no refresh token stored".to_string(),
            ));
        }

        tracing::info!(linkedin_id, "Access token expired, refreshing");

        let response = self
            .client
            .refresh_token(&current.refresh_token)
            .await
            .map_err(|e| {
                tracing::warn!(linkedin_id, error = %e, "LinkedIn token refresh failed");
                TokenError::RefreshFailed(e.to_string())
            })?;

        let updated = UserToken {
            linkedin_id: current.linkedin_id.clone(),
            access_token: response.access_token,
            refresh_token: response
                .refresh_token
                .filter(|t| !t.is_empty())
                .unwrap_or(current.refresh_token),
            expires_in_seconds: response.expires_in,
            token_created_at: issued_at,
        };

        let stored = self
            .store
            .update_tokens(&updated)
            .await
            .map_err(|e| TokenError::Store(e.to_string()))?;
        if !stored {
            tracing::info!(linkedin_id, "Tokens removed during refresh, discarding result");
            return Err(TokenError::UserNotFound(linkedin_id.to_string()));
        }

        tracing::info!(
            linkedin_id,
            expires_in = updated.expires_in_seconds,
            "Token refreshed and stored"
        );
        Ok(updated.access_token)
    }
}
