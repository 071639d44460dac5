// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Loopback API tests.
//!
//! These tests verify that:
//! 1. `/api` routes reject requests without the local token
//! 2. Formatting, preferences, sessions and posting work end to end
//! 3. CORS preflight requests return correct headers

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use postcraft::models::UserToken;
use serde_json::{json, Value};
use std::time::Duration;
use tower::ServiceExt;

mod common;
use common::{
    body_json, create_test_app, create_test_app_with, spawn_fake_completion,
    spawn_fake_linkedin, test_config, LOCAL_TOKEN, REVOKED_ACCESS_TOKEN,
};

fn authed(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", LOCAL_TOKEN));
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn fresh_token(access_token: &str) -> UserToken {
    UserToken {
        linkedin_id: "member-1".to_string(),
        access_token: access_token.to_string(),
        refresh_token: "stored_refresh".to_string(),
        expires_in_seconds: 3600,
        token_created_at: Utc::now(),
    }
}

// ─── Auth ────────────────────────────────────────────────────

#[tokio::test]
async fn test_health_is_public() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["open_sessions"], 0);
}

#[tokio::test]
async fn test_protected_route_without_token() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(
            Request::post("/api/format")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("[]"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_route_with_wrong_token() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(
            Request::get("/api/preferences/member-1")
                .header(header::AUTHORIZATION, "Bearer not-the-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_cors_preflight_from_ui() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/format")
                .header(header::ORIGIN, "http://localhost:5173")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "http://localhost:5173"
    );
}

#[tokio::test]
async fn test_cors_preflight_from_lookalike_host_is_refused() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/format")
                .header(header::ORIGIN, "http://localhost.evil.com")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}

// ─── Formatting ──────────────────────────────────────────────

#[tokio::test]
async fn test_format_document() {
    let (app, _) = create_test_app();
    let doc = json!({"ops": [
        {"insert": "Hi", "attributes": {"bold": true}},
        {"insert": " there\n"}
    ]});

    let (status, body) = call(&app, authed(Method::POST, "/api/format", Some(doc))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "\u{1D407}\u{1D422} there");
    assert_eq!(body["char_count"], 8);
    assert_eq!(body["within_limit"], true);
}

#[tokio::test]
async fn test_format_accepts_bare_ops_and_reports_limit() {
    let (app, _) = create_test_app();
    let doc = json!([{"insert": "x".repeat(3001)}]);

    let (status, body) = call(&app, authed(Method::POST, "/api/format", Some(doc))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["char_count"], 3001);
    assert_eq!(body["within_limit"], false);
}

// ─── Preferences ─────────────────────────────────────────────

#[tokio::test]
async fn test_preferences_default_then_update() {
    let (app, state) = create_test_app();

    let (status, body) = call(&app, authed(Method::GET, "/api/preferences/member-1", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tone"], "professional");
    assert_eq!(body["industry"], "General");

    let update = json!({"tone": "casual", "industry": "Fintech", "topics": ["payments"]});
    let (status, body) = call(
        &app,
        authed(Method::PUT, "/api/preferences/member-1", Some(update)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content_focus"], "Thought Leadership");

    let stored = state.db.get_preferences("member-1").await.unwrap().unwrap();
    assert_eq!(stored.tone, "casual");
    assert_eq!(stored.topics, vec!["payments".to_string()]);

    let (_, body) = call(&app, authed(Method::GET, "/api/preferences/member-1", None)).await;
    assert_eq!(body["industry"], "Fintech");
}

// ─── Sessions ────────────────────────────────────────────────

async fn open(app: &Router) -> String {
    let (status, body) = call(
        app,
        authed(Method::POST, "/api/sessions", Some(json!({"user_id": "member-1"}))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["session_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_session_manual_suggestion_roundtrip() {
    let fake = spawn_fake_completion(Some("Here is a stronger opening.")).await;
    let (app, state) = create_test_app_with(test_config(None, Some(&fake)));
    let id = open(&app).await;
    assert!(state.sessions.contains_key(&id));

    let request = json!({
        "user_id": "member-1",
        "draft": "Launching our new product next week",
        "manual": true,
        "options": {"tone": "witty"}
    });
    let (status, body) = call(
        &app,
        authed(Method::POST, &format!("/api/sessions/{}/suggestions", id), Some(request)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["suggestion"]["text"], "Here is a stronger opening.");
    assert_eq!(body["suggestion"]["tone"], "witty");

    let (status, _) = call(
        &app,
        authed(Method::POST, &format!("/api/sessions/{}/accept", id), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(
        &app,
        authed(Method::DELETE, &format!("/api/sessions/{}", id), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!state.sessions.contains_key(&id));

    let (status, _) = call(
        &app,
        authed(Method::POST, &format!("/api/sessions/{}/reject", id), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_suppressed_suggestion_is_null() {
    let fake = spawn_fake_completion(Some("Rewritten")).await;
    let (app, _) = create_test_app_with(test_config(None, Some(&fake)));
    let id = open(&app).await;

    let request = json!({"draft": "Just a plain update about the team offsite"});
    let (status, body) = call(
        &app,
        authed(Method::POST, &format!("/api/sessions/{}/suggestions", id), Some(request)),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["suggestion"].is_null());
    assert_eq!(fake.call_count(), 0);
}

#[tokio::test]
async fn test_suggestion_rejects_invalid_options_and_foreign_user() {
    let (app, _) = create_test_app();
    let id = open(&app).await;
    let uri = format!("/api/sessions/{}/suggestions", id);

    let bad_options = json!({"draft": "Help me", "manual": true, "options": {"temperature": 9.0}});
    let (status, _) = call(&app, authed(Method::POST, &uri, Some(bad_options))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let foreign = json!({"user_id": "someone-else", "draft": "Help me", "manual": true});
    let (status, _) = call(&app, authed(Method::POST, &uri, Some(foreign))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_open_session_requires_user() {
    let (app, _) = create_test_app();

    let (status, body) = call(
        &app,
        authed(Method::POST, "/api/sessions", Some(json!({"user_id": "  "}))),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_debounced_draft_delivers_event() {
    let fake = spawn_fake_completion(Some("Rewritten")).await;
    let mut config = test_config(None, Some(&fake));
    config.suggestion.debounce = Duration::from_millis(50);
    let (app, _) = create_test_app_with(config);
    let id = open(&app).await;

    let (status, _) = call(
        &app,
        authed(
            Method::POST,
            &format!("/api/sessions/{}/draft", id),
            Some(json!({"draft": "Could use some feedback on this one"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let mut events = Vec::new();
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(50)).await;
        let (_, body) = call(
            &app,
            authed(Method::GET, &format!("/api/sessions/{}/events", id), None),
        )
        .await;
        events.extend(body["events"].as_array().cloned().unwrap_or_default());
        if !events.is_empty() {
            break;
        }
    }

    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["type"], "suggestion");
    assert_eq!(events[0]["trigger"], "automatic");
    assert_eq!(events[0]["suggestion"]["text"], "Rewritten");
}

// ─── Publishing ──────────────────────────────────────────────

#[tokio::test]
async fn test_create_post_formats_and_publishes() {
    let fake = spawn_fake_linkedin(Duration::ZERO, StatusCode::OK).await;
    let (app, state) = create_test_app_with(test_config(Some(&fake), None));
    state.db.set_tokens(&fresh_token("stored_access")).await.unwrap();

    let request = json!({
        "linkedin_id": "member-1",
        "document": {"ops": [
            {"insert": "Big news", "attributes": {"bold": true}},
            {"insert": "\n"},
            {"insert": "We shipped", "attributes": {"list": "bullet"}},
            {"insert": "\n"}
        ]}
    });
    let (status, body) = call(&app, authed(Method::POST, "/api/posts", Some(request))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["post_urn"], "urn:li:share:7001");

    let posts = fake.calls.posts();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].0, "stored_access");
    assert!(posts[0].1.contains("\u{1D401}\u{1D422}\u{1D420}"));
    assert!(posts[0].1.contains("\u{2022} We shipped"));
}

#[tokio::test]
async fn test_create_post_refreshes_expired_token() {
    let fake = spawn_fake_linkedin(Duration::ZERO, StatusCode::OK).await;
    let (app, state) = create_test_app_with(test_config(Some(&fake), None));
    let mut token = fresh_token("stored_access");
    token.token_created_at = Utc::now() - chrono::Duration::hours(2);
    state.db.set_tokens(&token).await.unwrap();

    let request = json!({"linkedin_id": "member-1", "document": [{"insert": "Hello\n"}]});
    let (status, _) = call(&app, authed(Method::POST, "/api/posts", Some(request))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(fake.calls.refresh_count(), 1);
    assert_eq!(fake.calls.posts()[0].0, "refreshed_access_1");
}

#[tokio::test]
async fn test_create_post_with_revoked_token_requires_reauth() {
    let fake = spawn_fake_linkedin(Duration::ZERO, StatusCode::OK).await;
    let (app, state) = create_test_app_with(test_config(Some(&fake), None));
    state
        .db
        .set_tokens(&fresh_token(REVOKED_ACCESS_TOKEN))
        .await
        .unwrap();

    let request = json!({"linkedin_id": "member-1", "document": [{"insert": "Hello\n"}]});
    let (status, body) = call(&app, authed(Method::POST, "/api/posts", Some(request))).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "reauth_required");
}

#[tokio::test]
async fn test_create_post_rejects_empty_and_unknown_user() {
    let fake = spawn_fake_linkedin(Duration::ZERO, StatusCode::OK).await;
    let (app, state) = create_test_app_with(test_config(Some(&fake), None));
    state.db.set_tokens(&fresh_token("stored_access")).await.unwrap();

    let empty = json!({"linkedin_id": "member-1", "document": [{"insert": "  \n"}]});
    let (status, _) = call(&app, authed(Method::POST, "/api/posts", Some(empty))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let unknown = json!({"linkedin_id": "nobody", "document": [{"insert": "Hello\n"}]});
    let (status, _) = call(&app, authed(Method::POST, "/api/posts", Some(unknown))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert!(fake.calls.posts().is_empty());
}

#[tokio::test]
async fn test_disconnect_removes_tokens() {
    let (app, state) = create_test_app();
    state.db.set_tokens(&fresh_token("stored_access")).await.unwrap();

    let (status, _) = call(
        &app,
        authed(Method::DELETE, "/api/accounts/member-1/tokens", None),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(state.db.get_tokens("member-1").await.unwrap().is_none());
}
