// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers: in-process fakes for LinkedIn and the completion
//! provider, and an app wired against them.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use postcraft::config::Config;
use postcraft::db::LocalStore;
use postcraft::routes::create_router;
use postcraft::AppState;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Bearer token accepted by `Config::test_default()`.
#[allow(dead_code)]
pub const LOCAL_TOKEN: &str = "test_local_token";

/// Serve `router` on an ephemeral loopback port and return its base URL.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fake server");
    let addr = listener.local_addr().expect("fake server address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("fake server");
    });
    format!("http://{}", addr)
}

// ─── Fake LinkedIn ───────────────────────────────────────────

/// Access token the fake rejects with 401, as for a revoked grant.
#[allow(dead_code)]
pub const REVOKED_ACCESS_TOKEN: &str = "revoked_access";

#[derive(Clone, Default)]
pub struct LinkedInCalls {
    pub refreshes: Arc<AtomicUsize>,
    /// `(bearer token, commentary text)` for every post.
    pub posts: Arc<Mutex<Vec<(String, String)>>>,
}

#[allow(dead_code)]
impl LinkedInCalls {
    pub fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }

    pub fn posts(&self) -> Vec<(String, String)> {
        self.posts.lock().unwrap().clone()
    }
}

pub struct FakeLinkedIn {
    pub base_url: String,
    pub calls: LinkedInCalls,
}

#[derive(Clone)]
struct LinkedInBehavior {
    calls: LinkedInCalls,
    refresh_delay: Duration,
    refresh_status: StatusCode,
}

/// Start a fake LinkedIn serving both the OAuth and REST endpoints.
///
/// Refreshes sleep for `refresh_delay` and then answer `refresh_status`;
/// successful refreshes rotate the refresh token to `rotated_refresh`.
#[allow(dead_code)]
pub async fn spawn_fake_linkedin(refresh_delay: Duration, refresh_status: StatusCode) -> FakeLinkedIn {
    let calls = LinkedInCalls::default();
    let behavior = LinkedInBehavior {
        calls: calls.clone(),
        refresh_delay,
        refresh_status,
    };

    let router = Router::new()
        .route("/oauth/v2/accessToken", post(token_endpoint))
        .route("/v2/userinfo", get(userinfo))
        .route("/v2/ugcPosts", post(ugc_posts))
        .with_state(behavior);

    FakeLinkedIn {
        base_url: serve(router).await,
        calls,
    }
}

async fn token_endpoint(
    State(fake): State<LinkedInBehavior>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    match form.get("grant_type").map(String::as_str) {
        Some("refresh_token") => {
            let n = fake.calls.refreshes.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::time::sleep(fake.refresh_delay).await;
            if fake.refresh_status != StatusCode::OK {
                return (fake.refresh_status, Json(json!({"error": "invalid_grant"})))
                    .into_response();
            }
            Json(json!({
                "access_token": format!("refreshed_access_{}", n),
                "expires_in": 5_184_000,
                "refresh_token": "rotated_refresh",
                "refresh_token_expires_in": 31_536_000
            }))
            .into_response()
        }
        Some("authorization_code") => Json(json!({
            "access_token": "initial_access",
            "expires_in": 5_184_000,
            "refresh_token": "initial_refresh"
        }))
        .into_response(),
        _ => StatusCode::BAD_REQUEST.into_response(),
    }
}

async fn userinfo() -> Json<Value> {
    Json(json!({
        "sub": "member-1",
        "name": "Ada Lovelace",
        "email": "ada@example.com"
    }))
}

async fn ugc_posts(
    State(fake): State<LinkedInBehavior>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or_default()
        .to_string();
    if bearer == REVOKED_ACCESS_TOKEN {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let text = body["specificContent"]["com.linkedin.ugc.ShareContent"]["shareCommentary"]["text"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    fake.calls.posts.lock().unwrap().push((bearer, text));

    (StatusCode::CREATED, [("x-restli-id", "urn:li:share:7001")]).into_response()
}

// ─── Fake completion provider ────────────────────────────────

pub struct FakeCompletion {
    pub base_url: String,
    pub calls: Arc<AtomicUsize>,
    pub prompts: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl FakeCompletion {
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[derive(Clone)]
struct CompletionBehavior {
    calls: Arc<AtomicUsize>,
    prompts: Arc<Mutex<Vec<String>>>,
    status: StatusCode,
    content: Option<String>,
    delay: Duration,
}

/// Start a fake provider answering `content` (or no choices when `None`).
#[allow(dead_code)]
pub async fn spawn_fake_completion(content: Option<&str>) -> FakeCompletion {
    spawn_fake_completion_with(StatusCode::OK, content, Duration::ZERO).await
}

#[allow(dead_code)]
pub async fn spawn_fake_completion_with(
    status: StatusCode,
    content: Option<&str>,
    delay: Duration,
) -> FakeCompletion {
    let calls = Arc::new(AtomicUsize::new(0));
    let prompts = Arc::new(Mutex::new(Vec::new()));
    let behavior = CompletionBehavior {
        calls: calls.clone(),
        prompts: prompts.clone(),
        status,
        content: content.map(str::to_string),
        delay,
    };

    let router = Router::new()
        .route("/chat/completions", post(chat_completions))
        .with_state(behavior);

    FakeCompletion {
        base_url: serve(router).await,
        calls,
        prompts,
    }
}

async fn chat_completions(
    State(fake): State<CompletionBehavior>,
    Json(body): Json<Value>,
) -> Response {
    fake.calls.fetch_add(1, Ordering::SeqCst);
    if let Some(prompt) = body["messages"][0]["content"].as_str() {
        fake.prompts.lock().unwrap().push(prompt.to_string());
    }
    tokio::time::sleep(fake.delay).await;

    if fake.status != StatusCode::OK {
        return (fake.status, "provider unavailable").into_response();
    }
    let choices = match &fake.content {
        Some(content) => json!([{"message": {"role": "assistant", "content": content}}]),
        None => json!([]),
    };
    Json(json!({ "choices": choices })).into_response()
}

// ─── App ─────────────────────────────────────────────────────

/// Test config pointed at the given fakes (`None` keeps the real URLs,
/// which tests must then never reach).
#[allow(dead_code)]
pub fn test_config(linkedin: Option<&FakeLinkedIn>, completion: Option<&FakeCompletion>) -> Config {
    let mut config = Config::test_default();
    if let Some(linkedin) = linkedin {
        config.linkedin_oauth_base_url = linkedin.base_url.clone();
        config.linkedin_api_base_url = linkedin.base_url.clone();
    }
    if let Some(completion) = completion {
        config.completion_base_url = completion.base_url.clone();
    }
    config
}

/// Create a test app with an in-memory store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with(Config::test_default())
}

#[allow(dead_code)]
pub fn create_test_app_with(config: Config) -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(config, LocalStore::in_memory()).unwrap());
    (create_router(state.clone()), state)
}

/// Read a JSON response body.
#[allow(dead_code)]
pub async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("JSON body")
}
