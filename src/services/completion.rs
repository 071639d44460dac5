// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OpenAI-compatible chat completion client.

use crate::config::Config;
use crate::error::AppError;
use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Completion provider client.
#[derive(Clone)]
pub struct CompletionClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl CompletionClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .context("failed building completion HTTP client")?;

        Ok(Self {
            http,
            base_url: config.completion_base_url.trim_end_matches('/').to_string(),
            api_key: config.completion_api_key.clone(),
            model: config.completion_model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send a single user message. Returns the trimmed first choice, or
    /// `None` when the provider answered with nothing usable.
    pub async fn complete(
        &self,
        prompt: String,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<Option<String>, AppError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt,
            }],
            max_tokens,
            temperature,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Completion(format!("Request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AppError::Completion(e.to_string()))?;
        if !status.is_success() {
            return Err(AppError::Completion(format!("HTTP {}: {}", status, text)));
        }

        Ok(first_choice_text(&text))
    }
}

/// Extract `choices[0].message.content`, trimmed. Any other shape is "no
/// content" rather than an error.
fn first_choice_text(body: &str) -> Option<String> {
    let parsed: ChatResponse = match serde_json::from_str(body) {
        Ok(p) => p,
        Err(e) => {
            tracing::debug!(error = %e, "Unexpected completion response shape");
            return None;
        }
    };

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
