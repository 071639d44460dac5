// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod preferences;
pub mod rich_text;
pub mod suggestion;
pub mod user;

pub use preferences::UserPreferences;
pub use rich_text::{Attributes, FormattedText, Insert, ListKind, Op, RichTextDocument};
pub use suggestion::{GenerationParams, Suggestion, SuggestionOptions};
pub use user::{UserProfile, UserToken};
