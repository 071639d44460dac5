// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Rich-text to LinkedIn text conversion.
//!
//! LinkedIn's composer only accepts plain text, so styling is carried by
//! Unicode look-alikes:
//! - bold/italic letters map into the Mathematical Alphanumeric Symbols block
//! - underline appends U+0332 COMBINING LOW LINE to every character
//! - lists become `• ` / `1. ` prefixes, headers become `#` runs

use crate::models::{Attributes, FormattedText, Insert, ListKind, RichTextDocument};

/// LinkedIn rejects posts longer than this many characters.
pub const LINKEDIN_MAX_POST_CHARS: usize = 3000;

pub const BULLET_PREFIX: &str = "• ";

const COMBINING_LOW_LINE: char = '\u{0332}';
const NO_BREAK_SPACE: char = '\u{00A0}';

const BOLD_UPPER_START: u32 = 0x1D400;
const BOLD_LOWER_START: u32 = 0x1D41A;
const ITALIC_UPPER_START: u32 = 0x1D434;
const ITALIC_LOWER_START: u32 = 0x1D44E;

/// The italic block has a hole at 'h' (U+1D455 is unassigned); LinkedIn
/// renders the legacy PLANCK CONSTANT in its place.
const ITALIC_SMALL_H: char = '\u{210E}';

/// Convert an editor document into LinkedIn-ready text.
///
/// Never fails. Non-text inserts are skipped.
pub fn format(doc: &RichTextDocument) -> FormattedText {
    let mut out = String::new();
    let mut current_list: Option<ListKind> = None;
    let mut ordered_counter: u32 = 1;

    for op in &doc.ops {
        let Insert::Text(raw) = &op.insert else {
            continue;
        };

        let mut text = apply_styles(raw, &op.attributes);

        match op.attributes.list {
            Some(kind @ (ListKind::Bullet | ListKind::Ordered)) => {
                if current_list != Some(kind) {
                    out.push('\n');
                    current_list = Some(kind);
                    ordered_counter = 1;
                }
                text = match kind {
                    ListKind::Ordered => {
                        let prefixed = format!("{}. {}", ordered_counter, text);
                        ordered_counter += 1;
                        prefixed
                    }
                    _ => format!("{}{}", BULLET_PREFIX, text),
                };
            }
            _ => {
                current_list = None;
                ordered_counter = 1;
            }
        }

        if let Some(level) = op.attributes.header.filter(|l| *l > 0) {
            text = format!("{} {}\n\n", "#".repeat(level as usize), text.trim());
        }

        out.push_str(&text);
    }

    FormattedText::new(out.trim().to_string())
}

/// Apply bold, italic, then underline, in that order.
fn apply_styles(text: &str, attrs: &Attributes) -> String {
    let mut styled = text.to_string();
    if attrs.bold {
        styled = styled.chars().map(to_bold).collect();
    }
    if attrs.italic {
        styled = styled.chars().map(to_italic).collect();
    }
    if attrs.underline {
        styled = underline(&styled);
    }
    styled
}

fn offset_letter(c: char, upper_start: u32, lower_start: u32) -> Option<char> {
    let code = match c {
        'A'..='Z' => upper_start + (c as u32 - 'A' as u32),
        'a'..='z' => lower_start + (c as u32 - 'a' as u32),
        _ => return None,
    };
    char::from_u32(code)
}

pub fn to_bold(c: char) -> char {
    offset_letter(c, BOLD_UPPER_START, BOLD_LOWER_START).unwrap_or(c)
}

pub fn to_italic(c: char) -> char {
    if c == 'h' {
        return ITALIC_SMALL_H;
    }
    offset_letter(c, ITALIC_UPPER_START, ITALIC_LOWER_START).unwrap_or(c)
}

/// Follow every character with a combining underline; spaces become
/// no-break spaces first so the mark stays visible.
pub fn underline(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 3);
    for c in text.chars() {
        out.push(if c == ' ' { NO_BREAK_SPACE } else { c });
        out.push(COMBINING_LOW_LINE);
    }
    out
}

/// Map a styled letter back to ASCII.
fn decode_char(c: char) -> Option<char> {
    if c == ITALIC_SMALL_H {
        return Some('h');
    }
    let code = c as u32;
    for (upper, lower) in [
        (BOLD_UPPER_START, BOLD_LOWER_START),
        (ITALIC_UPPER_START, ITALIC_LOWER_START),
    ] {
        if (upper..upper + 26).contains(&code) {
            return char::from_u32('A' as u32 + code - upper);
        }
        if (lower..lower + 26).contains(&code) {
            return char::from_u32('a' as u32 + code - lower);
        }
    }
    None
}

/// Strip Unicode styling back to plain ASCII-ish text (for previews and
/// word counts).
pub fn unstyle(text: &str) -> String {
    text.chars()
        .filter(|c| *c != COMBINING_LOW_LINE)
        .map(|c| match c {
            NO_BREAK_SPACE => ' ',
            other => decode_char(other).unwrap_or(other),
        })
        .collect()
}

/// Whether formatted text fits in a LinkedIn post.
pub fn fits_post_limit(text: &FormattedText) -> bool {
    text.char_count() <= LINKEDIN_MAX_POST_CHARS
}
