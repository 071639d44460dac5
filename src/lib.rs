// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Postcraft: local backend for a LinkedIn post editor
//!
//! This crate provides the loopback API the editor shell talks to:
//! AI rewrite suggestions with throttling, conversion of the editor's rich
//! text into LinkedIn-compatible Unicode text, and LinkedIn OAuth token
//! management for posting.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use dashmap::DashMap;
use db::LocalStore;
use services::{
    CompletionClient, LinkedInClient, LinkedInService, SessionEntry, SuggestionOrchestrator,
    TokenManager,
};
use std::sync::atomic::{AtomicU64, Ordering};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: LocalStore,
    pub linkedin_service: LinkedInService,
    pub orchestrator: SuggestionOrchestrator,
    /// Open editor sessions, keyed by session ID.
    pub sessions: DashMap<String, SessionEntry>,
    session_counter: AtomicU64,
}

impl AppState {
    /// Wire up services from configuration and an opened store.
    pub fn new(config: Config, db: LocalStore) -> anyhow::Result<Self> {
        let client = LinkedInClient::new(&config)?;
        let tokens = TokenManager::new(client.clone(), db.clone());
        let linkedin_service = LinkedInService::new(client, tokens, db.clone());
        let orchestrator = SuggestionOrchestrator::new(
            CompletionClient::new(&config)?,
            db.clone(),
            config.suggestion.clone(),
        );

        Ok(Self {
            config,
            db,
            linkedin_service,
            orchestrator,
            sessions: DashMap::new(),
            session_counter: AtomicU64::new(0),
        })
    }

    /// Allocate a process-unique session ID.
    pub fn next_session_id(&self) -> String {
        let n = self.session_counter.fetch_add(1, Ordering::Relaxed);
        format!("{:x}-{}", chrono::Utc::now().timestamp_millis(), n)
    }
}
