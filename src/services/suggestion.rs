// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Suggestion orchestration: decides when to ask the completion provider
//! for a rewrite of the user's draft.
//!
//! The per-session state machine (`Idle`, `RequestInFlight`,
//! `CooldownActive`) is an explicit value threaded through every call, so
//! the gating rules can be exercised without timers:
//!
//! - automatic triggers need a trigger keyword, a minimum draft length and
//!   no active cooldown
//! - manual triggers skip the keyword and cooldown gates
//! - nothing is requested while a blocking modal is open or while another
//!   request for the session is in flight
//! - provider failures and empty answers both surface as "no suggestion"

use crate::config::SuggestionConfig;
use crate::db::LocalStore;
use crate::models::{GenerationParams, Suggestion, SuggestionOptions, UserPreferences};
use crate::services::completion::CompletionClient;
use serde::Serialize;
use tokio::time::Instant;
use validator::Validate;

/// Words that mark a draft as asking for help.
pub const TRIGGER_KEYWORDS: &[&str] = &[
    "help",
    "need",
    "improve",
    "suggest",
    "suggestion",
    "rewrite",
    "better",
    "idea",
    "ideas",
    "feedback",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trigger {
    Manual,
    Automatic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    RequestInFlight,
    CooldownActive {
        until: Instant,
    },
}

/// What the user did with the previous suggestion while a newer request
/// was still running. Applied when that request completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Accepted,
    Rejected { at: Instant },
}

/// Process-local throttling state for one editor session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuggestionRequestState {
    pub phase: Phase,
    pub last_suggestion_at: Option<Instant>,
    /// Options of a manual request that arrived while another was in flight.
    pub pending_manual_request: Option<SuggestionOptions>,
    pub resolved_in_flight: Option<Resolution>,
}

impl SuggestionRequestState {
    /// Phase as seen at `now`; an elapsed cooldown reads as `Idle`.
    pub fn phase_at(&self, now: Instant) -> Phase {
        match self.phase {
            Phase::CooldownActive { until } if now >= until => Phase::Idle,
            phase => phase,
        }
    }

    pub fn cooldown_active(&self, now: Instant) -> bool {
        matches!(self.phase_at(now), Phase::CooldownActive { .. })
    }
}

/// Why a request did not reach the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuppressReason {
    InvalidInput,
    ModalOpen,
    InFlight,
    Cooldown,
    TooShort,
    NoKeyword,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Proceed,
    Suppressed(SuppressReason),
}

#[derive(Debug, Clone)]
pub struct SuggestionRequest {
    pub draft_text: String,
    pub user_id: String,
    pub trigger: Trigger,
    pub modal_open: bool,
    pub options: SuggestionOptions,
}

/// Whether `text` contains one of [`TRIGGER_KEYWORDS`] as a whole word.
pub fn contains_trigger_keyword(text: &str) -> bool {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .any(|w| {
            let w = w.to_lowercase();
            TRIGGER_KEYWORDS.contains(&w.as_str())
        })
}

/// Build the enriched rewrite prompt.
pub fn build_prompt(prefs: &UserPreferences, tone: &str, draft: &str) -> String {
    let topics = if prefs.topics.is_empty() {
        "general topics".to_string()
    } else {
        prefs.topics.join(", ")
    };

    format!(
        "You are helping a professional in the {industry} industry write a LinkedIn post. \
         Their content focus is {focus} and their preferred topics are: {topics}.\n\n\
         Rewrite the draft below in a {tone} tone to maximize engagement. Keep the author's \
         key points and voice, add 3-5 relevant hashtags, and end with a clear call-to-action \
         that invites readers to comment.\n\n\
         Draft:\n\"\"\"\n{draft}\n\"\"\"\n\n\
         Return only the rewritten post.",
        industry = prefs.industry,
        focus = prefs.content_focus,
        topics = topics,
        tone = tone,
        draft = draft,
    )
}

/// Editor-facing suggestion controller.
#[derive(Clone)]
pub struct SuggestionOrchestrator {
    completion: CompletionClient,
    store: LocalStore,
    config: SuggestionConfig,
}

impl SuggestionOrchestrator {
    pub fn new(completion: CompletionClient, store: LocalStore, config: SuggestionConfig) -> Self {
        Self {
            completion,
            store,
            config,
        }
    }

    pub fn config(&self) -> &SuggestionConfig {
        &self.config
    }

    /// Decide whether `request` may call the provider. On `Proceed` the
    /// returned state is `RequestInFlight`.
    pub fn evaluate(
        &self,
        mut state: SuggestionRequestState,
        request: &SuggestionRequest,
        now: Instant,
    ) -> (SuggestionRequestState, Gate) {
        let draft = request.draft_text.trim();
        let manual = request.trigger == Trigger::Manual;

        let suppressed = if draft.is_empty()
            || request.user_id.trim().is_empty()
            || request.options.validate().is_err()
        {
            Some(SuppressReason::InvalidInput)
        } else if request.modal_open {
            Some(SuppressReason::ModalOpen)
        } else {
            match state.phase_at(now) {
                Phase::RequestInFlight => {
                    if manual {
                        state.pending_manual_request = Some(request.options.clone());
                    }
                    Some(SuppressReason::InFlight)
                }
                Phase::CooldownActive { .. } if !manual => Some(SuppressReason::Cooldown),
                _ if !manual && draft.chars().count() < self.config.min_auto_chars => {
                    Some(SuppressReason::TooShort)
                }
                _ if !manual && !contains_trigger_keyword(draft) => {
                    Some(SuppressReason::NoKeyword)
                }
                _ => None,
            }
        };

        match suppressed {
            Some(reason) => (state, Gate::Suppressed(reason)),
            None => {
                state.phase = Phase::RequestInFlight;
                if manual {
                    state.pending_manual_request = None;
                }
                (state, Gate::Proceed)
            }
        }
    }

    /// Transition out of `RequestInFlight` once the provider call finished.
    /// An accept or reject recorded during the call takes precedence over
    /// the trigger's own follow-up phase.
    pub fn complete(
        &self,
        mut state: SuggestionRequestState,
        trigger: Trigger,
        now: Instant,
    ) -> SuggestionRequestState {
        state.last_suggestion_at = Some(now);
        state.phase = match (state.resolved_in_flight.take(), trigger) {
            (Some(Resolution::Accepted), _) | (None, Trigger::Manual) => Phase::Idle,
            (Some(Resolution::Rejected { at }), _) => Phase::CooldownActive {
                until: at + self.config.dismiss_cooldown,
            },
            (None, Trigger::Automatic) => Phase::CooldownActive {
                until: now + self.config.auto_cooldown,
            },
        };
        state
    }

    /// The user took the suggestion. A request still in flight keeps the
    /// gate closed; the outcome is applied when it completes.
    pub fn accept(&self, state: SuggestionRequestState) -> SuggestionRequestState {
        self.resolve(state, Phase::Idle, Resolution::Accepted)
    }

    /// The user dismissed the suggestion; back off for the shorter window.
    pub fn reject(&self, state: SuggestionRequestState, now: Instant) -> SuggestionRequestState {
        let cooldown = Phase::CooldownActive {
            until: now + self.config.dismiss_cooldown,
        };
        self.resolve(state, cooldown, Resolution::Rejected { at: now })
    }

    fn resolve(
        &self,
        state: SuggestionRequestState,
        phase: Phase,
        resolution: Resolution,
    ) -> SuggestionRequestState {
        if state.phase == Phase::RequestInFlight {
            return SuggestionRequestState {
                resolved_in_flight: Some(resolution),
                pending_manual_request: None,
                ..state
            };
        }
        SuggestionRequestState {
            phase,
            last_suggestion_at: state.last_suggestion_at,
            pending_manual_request: None,
            resolved_in_flight: None,
        }
    }

    /// Look up preferences, call the provider, and reduce every failure to
    /// `None`.
    pub async fn fetch(&self, request: &SuggestionRequest) -> Option<Suggestion> {
        let prefs = match self.store.get_preferences(&request.user_id).await {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(user_id = %request.user_id, error = %e, "Preference lookup failed, using defaults");
                None
            }
        };

        let params = GenerationParams::resolve(&request.options, prefs.as_ref());
        let prefs = prefs.unwrap_or_default();
        let prompt = build_prompt(&prefs, &params.tone, request.draft_text.trim());

        tracing::debug!(
            user_id = %request.user_id,
            trigger = ?request.trigger,
            model = self.completion.model(),
            max_tokens = params.max_tokens,
            "Requesting suggestion"
        );

        match self
            .completion
            .complete(prompt, params.max_tokens, params.temperature)
            .await
        {
            Ok(Some(text)) => Some(Suggestion {
                text,
                tone: params.tone,
                generated_at: chrono::Utc::now().to_rfc3339(),
            }),
            Ok(None) => {
                tracing::info!(user_id = %request.user_id, "Provider returned no suggestion");
                None
            }
            Err(e) => {
                tracing::warn!(user_id = %request.user_id, error = %e, "Suggestion request failed");
                None
            }
        }
    }

    /// Run one request through the state machine.
    ///
    /// `now` is the logical time of the call; the cooldown starts when the
    /// provider call finishes (`now` plus the time spent waiting on it).
    pub async fn request_suggestion(
        &self,
        state: SuggestionRequestState,
        request: &SuggestionRequest,
        now: Instant,
    ) -> (SuggestionRequestState, Option<Suggestion>) {
        let (state, gate) = self.evaluate(state, request, now);
        if let Gate::Suppressed(reason) = gate {
            tracing::debug!(trigger = ?request.trigger, ?reason, "Suggestion suppressed");
            return (state, None);
        }

        let started = Instant::now();
        let suggestion = self.fetch(request).await;
        let finished = now + started.elapsed();

        (self.complete(state, request.trigger, finished), suggestion)
    }
}
