// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for the editor shell.

use crate::error::{AppError, Result};
use crate::models::{RichTextDocument, Suggestion, SuggestionOptions, UserPreferences};
use crate::services::{formatter, EditorSession, SessionEntry, SessionEvent, Trigger};
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// API routes (require the local bearer token).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/format", post(format_document))
        .route("/api/sessions", post(open_session))
        .route("/api/sessions/{id}", delete(close_session))
        .route("/api/sessions/{id}/draft", post(update_draft))
        .route("/api/sessions/{id}/events", get(session_events))
        .route("/api/sessions/{id}/suggestions", post(request_suggestion))
        .route("/api/sessions/{id}/accept", post(accept_suggestion))
        .route("/api/sessions/{id}/reject", post(reject_suggestion))
        .route(
            "/api/preferences/{user_id}",
            get(get_preferences).put(put_preferences),
        )
        .route("/api/posts", post(create_post))
        .route("/api/accounts/{linkedin_id}/tokens", delete(disconnect))
}

/// Generic acknowledgement.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "ui/src/lib/generated/")
)]
pub struct AckResponse {
    pub success: bool,
}

const ACK: AckResponse = AckResponse { success: true };

// ─── Formatting ──────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "ui/src/lib/generated/")
)]
pub struct FormatResponse {
    pub text: String,
    pub char_count: usize,
    pub within_limit: bool,
}

/// Preview what a document will look like on LinkedIn.
async fn format_document(Json(doc): Json<RichTextDocument>) -> Json<FormatResponse> {
    let formatted = formatter::format(&doc);
    let within_limit = formatter::fits_post_limit(&formatted);
    let char_count = formatted.char_count();

    Json(FormatResponse {
        text: formatted.into_string(),
        char_count,
        within_limit,
    })
}

// ─── Editor Sessions ─────────────────────────────────────────

#[derive(Deserialize)]
pub struct OpenSessionRequest {
    pub user_id: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "ui/src/lib/generated/")
)]
pub struct OpenSessionResponse {
    pub session_id: String,
}

/// Look up a session and clone its handle so no map guard is held across
/// an await.
fn session(state: &AppState, id: &str) -> Result<EditorSession> {
    state
        .sessions
        .get(id)
        .map(|entry| entry.session.clone())
        .ok_or_else(|| AppError::NotFound(format!("Session {} not found", id)))
}

async fn open_session(
    State(state): State<Arc<AppState>>,
    Json(body): Json<OpenSessionRequest>,
) -> Result<Json<OpenSessionResponse>> {
    if body.user_id.trim().is_empty() {
        return Err(AppError::BadRequest("user_id is required".to_string()));
    }

    let session_id = state.next_session_id();
    let (session, events) =
        EditorSession::open(session_id.clone(), body.user_id, state.orchestrator.clone());
    state
        .sessions
        .insert(session_id.clone(), SessionEntry::new(session, events));

    tracing::info!(session_id = %session_id, "Editor session opened");
    Ok(Json(OpenSessionResponse { session_id }))
}

async fn close_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<AckResponse>> {
    let (_, entry) = state
        .sessions
        .remove(&id)
        .ok_or_else(|| AppError::NotFound(format!("Session {} not found", id)))?;
    entry.session.close();
    Ok(Json(ACK))
}

#[derive(Deserialize)]
pub struct DraftUpdate {
    pub draft: String,
    #[serde(default)]
    pub modal_open: bool,
}

/// Keystroke notification; an automatic suggestion may follow after the
/// quiet period and is delivered through `/events`.
async fn update_draft(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<DraftUpdate>,
) -> Result<Json<AckResponse>> {
    let session = session(&state, &id)?;
    session.set_modal_open(body.modal_open);
    session.on_draft_changed(body.draft);
    Ok(Json(ACK))
}

#[derive(Serialize)]
pub struct EventsResponse {
    pub events: Vec<SessionEvent>,
}

async fn session_events(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<EventsResponse>> {
    let entry = state
        .sessions
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("Session {} not found", id)))?;
    Ok(Json(EventsResponse {
        events: entry.drain_events(),
    }))
}

#[derive(Deserialize)]
pub struct SuggestionBody {
    /// Must match the session owner when given.
    #[serde(default)]
    pub user_id: Option<String>,
    pub draft: String,
    #[serde(default)]
    pub manual: bool,
    #[serde(default)]
    pub modal_open: bool,
    #[serde(default)]
    pub options: SuggestionOptions,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "ui/src/lib/generated/")
)]
pub struct SuggestionResponse {
    pub suggestion: Option<Suggestion>,
}

/// Run one suggestion request immediately. Suppressed requests and provider
/// failures both answer `{"suggestion": null}`.
async fn request_suggestion(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<SuggestionBody>,
) -> Result<Json<SuggestionResponse>> {
    body.options
        .validate()
        .map_err(|e| AppError::BadRequest(format!("Invalid options: {}", e)))?;

    let session = session(&state, &id)?;
    if let Some(user_id) = &body.user_id {
        if user_id != session.user_id() {
            return Err(AppError::BadRequest(
                "user_id does not match session".to_string(),
            ));
        }
    }

    let trigger = if body.manual {
        Trigger::Manual
    } else {
        Trigger::Automatic
    };
    session.set_modal_open(body.modal_open);
    let suggestion = session.request(body.draft, trigger, body.options).await;

    Ok(Json(SuggestionResponse { suggestion }))
}

async fn accept_suggestion(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<AckResponse>> {
    session(&state, &id)?.accept();
    Ok(Json(ACK))
}

async fn reject_suggestion(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<AckResponse>> {
    session(&state, &id)?.reject();
    Ok(Json(ACK))
}

// ─── Preferences ─────────────────────────────────────────────

/// Saved preferences, or the defaults for a user who never saved any.
async fn get_preferences(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<UserPreferences>> {
    let prefs = state.db.get_preferences(&user_id).await?.unwrap_or_default();
    Ok(Json(prefs))
}

async fn put_preferences(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Json(prefs): Json<UserPreferences>,
) -> Result<Json<UserPreferences>> {
    state.db.set_preferences(&user_id, &prefs).await?;
    tracing::info!(user_id = %user_id, "Preferences updated");
    Ok(Json(prefs))
}

// ─── Publishing ──────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreatePostRequest {
    pub linkedin_id: String,
    pub document: RichTextDocument,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "ui/src/lib/generated/")
)]
pub struct CreatePostResponse {
    pub post_urn: String,
}

async fn create_post(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreatePostRequest>,
) -> Result<Json<CreatePostResponse>> {
    let post_urn = state
        .linkedin_service
        .share_post(&body.linkedin_id, &body.document)
        .await?;
    Ok(Json(CreatePostResponse { post_urn }))
}

/// Forget the stored LinkedIn tokens; the user must sign in again to post.
async fn disconnect(
    State(state): State<Arc<AppState>>,
    Path(linkedin_id): Path<String>,
) -> Result<Json<AckResponse>> {
    state.db.delete_tokens(&linkedin_id).await?;
    tracing::info!(linkedin_id = %linkedin_id, "LinkedIn tokens removed");
    Ok(Json(ACK))
}
