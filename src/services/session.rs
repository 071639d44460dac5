// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Editor session driver.
//!
//! Owns one [`SuggestionRequestState`] for the lifetime of an open editor,
//! runs the debounce timer on every draft change and pushes results to the
//! UI over a channel. State is only touched under a short synchronous lock;
//! the provider call happens outside it.

use crate::models::{Suggestion, SuggestionOptions};
use crate::services::suggestion::{
    Gate, SuggestionOrchestrator, SuggestionRequest, SuggestionRequestState, Trigger,
};
use futures_util::future::{BoxFuture, FutureExt};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Results delivered to the editor UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    Suggestion {
        trigger: Trigger,
        suggestion: Suggestion,
    },
    /// The provider was asked but had nothing to offer (or failed).
    NoSuggestion { trigger: Trigger },
}

/// An open session together with its undelivered events, for callers that
/// poll instead of holding the receiver.
pub struct SessionEntry {
    pub session: EditorSession,
    events: Mutex<mpsc::UnboundedReceiver<SessionEvent>>,
}

impl SessionEntry {
    pub fn new(session: EditorSession, events: mpsc::UnboundedReceiver<SessionEvent>) -> Self {
        Self {
            session,
            events: Mutex::new(events),
        }
    }

    /// Take every event delivered so far without waiting.
    pub fn drain_events(&self) -> Vec<SessionEvent> {
        let mut rx = lock(&self.events);
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }
}

struct SessionInner {
    id: String,
    user_id: String,
    orchestrator: SuggestionOrchestrator,
    /// `None` once the session is closed.
    state: Mutex<Option<SuggestionRequestState>>,
    draft: Mutex<String>,
    modal_open: AtomicBool,
    debounce: Mutex<Option<JoinHandle<()>>>,
    events: mpsc::UnboundedSender<SessionEvent>,
}

/// Handle to an open editor session. Clones share the session.
#[derive(Clone)]
pub struct EditorSession {
    inner: Arc<SessionInner>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl EditorSession {
    /// Open a session for `user_id`. The receiver yields suggestion events.
    pub fn open(
        id: impl Into<String>,
        user_id: impl Into<String>,
        orchestrator: SuggestionOrchestrator,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = Self {
            inner: Arc::new(SessionInner {
                id: id.into(),
                user_id: user_id.into(),
                orchestrator,
                state: Mutex::new(Some(SuggestionRequestState::default())),
                draft: Mutex::new(String::new()),
                modal_open: AtomicBool::new(false),
                debounce: Mutex::new(None),
                events: tx,
            }),
        };
        tracing::debug!(session_id = %session.inner.id, "Editor session opened");
        (session, rx)
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn user_id(&self) -> &str {
        &self.inner.user_id
    }

    /// Snapshot of the current state (`None` after close).
    pub fn state(&self) -> Option<SuggestionRequestState> {
        lock(&self.inner.state).clone()
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.inner.state).is_none()
    }

    pub fn set_modal_open(&self, open: bool) {
        self.inner.modal_open.store(open, Ordering::SeqCst);
    }

    /// Record a keystroke and restart the quiet-period timer.
    pub fn on_draft_changed(&self, text: impl Into<String>) {
        if self.is_closed() {
            return;
        }
        *lock(&self.inner.draft) = text.into();

        let this = self.clone();
        let quiet = self.inner.orchestrator.config().debounce;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            // Detach the request so a later keystroke aborting this timer
            // cannot cancel a provider call that already started.
            tokio::spawn(this.run_owned(Trigger::Automatic, SuggestionOptions::default()));
        });

        if let Some(previous) = lock(&self.inner.debounce).replace(timer) {
            previous.abort();
        }
    }

    /// Explicit "suggest now" from the user, using the current draft.
    pub async fn request_now(&self, options: SuggestionOptions) -> Option<Suggestion> {
        self.run(Trigger::Manual, options).await
    }

    /// Update the draft and run one request immediately (no debounce).
    pub async fn request(
        &self,
        draft: impl Into<String>,
        trigger: Trigger,
        options: SuggestionOptions,
    ) -> Option<Suggestion> {
        *lock(&self.inner.draft) = draft.into();
        self.run(trigger, options).await
    }

    pub fn accept(&self) {
        let mut guard = lock(&self.inner.state);
        if let Some(state) = guard.take() {
            *guard = Some(self.inner.orchestrator.accept(state));
        }
    }

    pub fn reject(&self) {
        let mut guard = lock(&self.inner.state);
        if let Some(state) = guard.take() {
            *guard = Some(self.inner.orchestrator.reject(state, Instant::now()));
        }
    }

    /// Discard the session state. An in-flight provider call still finishes,
    /// but its result is dropped.
    pub fn close(&self) {
        lock(&self.inner.state).take();
        if let Some(timer) = lock(&self.inner.debounce).take() {
            timer.abort();
        }
        tracing::debug!(session_id = %self.inner.id, "Editor session closed");
    }

    /// Boxed, owned form of [`Self::run`] for spawning.
    fn run_owned(
        self,
        trigger: Trigger,
        options: SuggestionOptions,
    ) -> BoxFuture<'static, Option<Suggestion>> {
        async move { self.run(trigger, options).await }.boxed()
    }

    async fn run(&self, trigger: Trigger, options: SuggestionOptions) -> Option<Suggestion> {
        let request = SuggestionRequest {
            draft_text: lock(&self.inner.draft).clone(),
            user_id: self.inner.user_id.clone(),
            trigger,
            modal_open: self.inner.modal_open.load(Ordering::SeqCst),
            options,
        };
        let orchestrator = &self.inner.orchestrator;

        let gate = {
            let mut guard = lock(&self.inner.state);
            let state = guard.take()?;
            let (next, gate) = orchestrator.evaluate(state, &request, Instant::now());
            *guard = Some(next);
            gate
        };

        if let Gate::Suppressed(reason) = gate {
            tracing::debug!(session_id = %self.inner.id, ?trigger, ?reason, "Suggestion suppressed");
            return None;
        }

        let suggestion = orchestrator.fetch(&request).await;

        let replay = {
            let mut guard = lock(&self.inner.state);
            let Some(state) = guard.take() else {
                tracing::debug!(session_id = %self.inner.id, "Session closed during request");
                return None;
            };
            let mut next = orchestrator.complete(state, trigger, Instant::now());
            let replay = next.pending_manual_request.take();
            *guard = Some(next);
            replay
        };

        let event = match &suggestion {
            Some(s) => SessionEvent::Suggestion {
                trigger,
                suggestion: s.clone(),
            },
            None => SessionEvent::NoSuggestion { trigger },
        };
        // The UI may have dropped its receiver; nothing to do then.
        let _ = self.inner.events.send(event);

        if let Some(options) = replay {
            tokio::spawn(self.clone().run_owned(Trigger::Manual, options));
        }

        suggestion
    }
}
