// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local store with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile storage)
//! - Tokens (LinkedIn OAuth tokens)
//! - Preferences (prompt enrichment)
//!
//! Records live in memory and, when a snapshot path is configured, are
//! written to a JSON file after every mutation so tokens survive restarts.

use crate::error::AppError;
use crate::models::{UserPreferences, UserProfile, UserToken};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// On-disk snapshot layout.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    users: HashMap<String, UserProfile>,
    #[serde(default)]
    tokens: HashMap<String, UserToken>,
    #[serde(default)]
    preferences: HashMap<String, UserPreferences>,
}

/// Local database handle. Cheap to clone; clones share the same records.
#[derive(Clone, Default)]
pub struct LocalStore {
    users: Arc<DashMap<String, UserProfile>>,
    tokens: Arc<DashMap<String, UserToken>>,
    preferences: Arc<DashMap<String, UserPreferences>>,
    snapshot_path: Option<Arc<PathBuf>>,
    /// Serializes snapshot writes.
    write_lock: Arc<Mutex<()>>,
}

impl LocalStore {
    /// Create an in-memory store (nothing is written to disk).
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open a store backed by a JSON snapshot, loading it if it exists.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self, AppError> {
        let path = path.as_ref().to_path_buf();

        let snapshot = match tokio::fs::read_to_string(&path).await {
            Ok(json) => serde_json::from_str::<Snapshot>(&json).map_err(|e| {
                AppError::Database(format!("Corrupt store snapshot {}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Snapshot::default(),
            Err(e) => {
                return Err(AppError::Database(format!(
                    "Failed to read store snapshot {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        tracing::info!(
            path = %path.display(),
            users = snapshot.users.len(),
            tokens = snapshot.tokens.len(),
            "Opened local store"
        );

        Ok(Self {
            users: Arc::new(snapshot.users.into_iter().collect()),
            tokens: Arc::new(snapshot.tokens.into_iter().collect()),
            preferences: Arc::new(snapshot.preferences.into_iter().collect()),
            snapshot_path: Some(Arc::new(path)),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Write the current records to the snapshot file, if configured.
    async fn persist(&self) -> Result<(), AppError> {
        let Some(path) = self.snapshot_path.as_deref() else {
            return Ok(());
        };

        let _guard = self.write_lock.lock().await;

        let snapshot = Snapshot {
            users: clone_map(&self.users),
            tokens: clone_map(&self.tokens),
            preferences: clone_map(&self.preferences),
        };
        let json = serde_json::to_vec_pretty(&snapshot)
            .map_err(|e| AppError::Database(format!("Failed to serialize store: {}", e)))?;

        // Write-then-rename so a crash never leaves a truncated snapshot.
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| AppError::Database(format!("Failed to write {}: {}", tmp.display(), e)))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| AppError::Database(format!("Failed to replace snapshot: {}", e)))?;

        Ok(())
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by LinkedIn ID.
    pub async fn get_user(&self, linkedin_id: &str) -> Result<Option<UserProfile>, AppError> {
        Ok(self.users.get(linkedin_id).map(|u| u.clone()))
    }

    /// Create or update a user.
    pub async fn upsert_user(&self, user: &UserProfile) -> Result<(), AppError> {
        self.users.insert(user.linkedin_id.clone(), user.clone());
        self.persist().await
    }

    // ─── Token Operations ────────────────────────────────────────

    /// Get the token record for a user.
    pub async fn get_tokens(&self, linkedin_id: &str) -> Result<Option<UserToken>, AppError> {
        Ok(self.tokens.get(linkedin_id).map(|t| t.clone()))
    }

    /// Replace the token record for a user.
    pub async fn set_tokens(&self, token: &UserToken) -> Result<(), AppError> {
        self.tokens.insert(token.linkedin_id.clone(), token.clone());
        self.persist().await
    }

    /// Overwrite an existing token record. Returns `false`, writing nothing,
    /// when the user has no record (for example after a disconnect).
    pub async fn update_tokens(&self, token: &UserToken) -> Result<bool, AppError> {
        match self.tokens.get_mut(&token.linkedin_id) {
            Some(mut existing) => *existing = token.clone(),
            None => return Ok(false),
        }
        self.persist().await?;
        Ok(true)
    }

    /// Remove a user's tokens (sign-out).
    pub async fn delete_tokens(&self, linkedin_id: &str) -> Result<(), AppError> {
        self.tokens.remove(linkedin_id);
        self.persist().await
    }

    // ─── Preference Operations ───────────────────────────────────

    /// Get a user's preferences, if they have saved any.
    pub async fn get_preferences(
        &self,
        user_id: &str,
    ) -> Result<Option<UserPreferences>, AppError> {
        Ok(self.preferences.get(user_id).map(|p| p.clone()))
    }

    /// Replace a user's preferences.
    pub async fn set_preferences(
        &self,
        user_id: &str,
        prefs: &UserPreferences,
    ) -> Result<(), AppError> {
        self.preferences.insert(user_id.to_string(), prefs.clone());
        self.persist().await
    }
}

fn clone_map<V: Clone>(map: &DashMap<String, V>) -> HashMap<String, V> {
    map.iter()
        .map(|entry| (entry.key().clone(), entry.value().clone()))
        .collect()
}
