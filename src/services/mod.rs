// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod completion;
pub mod formatter;
pub mod linkedin;
pub mod session;
pub mod suggestion;
pub mod token;

pub use completion::CompletionClient;
pub use linkedin::{LinkedInClient, LinkedInService, OAuthResult};
pub use session::{EditorSession, SessionEntry, SessionEvent};
pub use suggestion::{
    Gate, Resolution, SuggestionOrchestrator, SuggestionRequest, SuggestionRequestState,
    SuppressReason, Trigger,
};
pub use token::TokenManager;
