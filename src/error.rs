// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    /// The stored LinkedIn grant can no longer be refreshed; the UI must
    /// send the user through OAuth again.
    #[error("LinkedIn re-authentication required: {0}")]
    ReauthRequired(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("LinkedIn API error: {0}")]
    LinkedInApi(String),

    #[error("Completion provider error: {0}")]
    Completion(String),

    #[error("Storage error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Marker used when LinkedIn rejects an access token.
    pub const LINKEDIN_TOKEN_ERROR: &'static str = "LinkedIn token invalid or revoked";

    /// Whether this error means the LinkedIn token was rejected.
    pub fn is_linkedin_token_error(&self) -> bool {
        match self {
            AppError::ReauthRequired(_) => true,
            AppError::LinkedInApi(msg) => msg == Self::LINKEDIN_TOKEN_ERROR,
            _ => false,
        }
    }
}

/// Errors from [`crate::services::TokenManager`].
///
/// `Clone` because one in-flight refresh result is handed to every caller
/// waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("No token record for LinkedIn user {0}")]
    UserNotFound(String),

    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    #[error("Token store error: {0}")]
    Store(String),
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::UserNotFound(id) => AppError::NotFound(format!("Tokens for user {}", id)),
            TokenError::RefreshFailed(msg) => AppError::ReauthRequired(msg),
            TokenError::Store(msg) => AppError::Database(msg),
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::ReauthRequired(msg) => {
                tracing::warn!(error = %msg, "LinkedIn token refresh failed");
                (StatusCode::UNAUTHORIZED, "reauth_required", None)
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::LinkedInApi(msg) => {
                (StatusCode::BAD_GATEWAY, "linkedin_error", Some(msg.clone()))
            }
            AppError::Completion(msg) => {
                (StatusCode::BAD_GATEWAY, "completion_error", Some(msg.clone()))
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Storage error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
