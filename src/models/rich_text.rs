//! Editor rich-text document (a Quill-style delta) and formatter output.

use serde::{Deserialize, Deserializer, Serialize};

/// Ordered list of ops; order is the document's only structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RichTextDocument {
    pub ops: Vec<Op>,
}

/// One piece of inserted content plus the formatting applied to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Op {
    pub insert: Insert,
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
}

/// Inserted content. Only text is formatted; embeds (images, mentions)
/// are skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Insert {
    Text(String),
    Embed(serde_json::Value),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    Bullet,
    Ordered,
    /// Any other list flavor the editor may emit (e.g. `checked`).
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub underline: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list: Option<ListKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<u8>,
}

impl Attributes {
    pub fn is_empty(&self) -> bool {
        *self == Attributes::default()
    }
}

impl Op {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            insert: Insert::Text(text.into()),
            attributes: Attributes::default(),
        }
    }

    pub fn styled(text: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            insert: Insert::Text(text.into()),
            attributes,
        }
    }
}

impl RichTextDocument {
    pub fn new(ops: Vec<Op>) -> Self {
        Self { ops }
    }

    /// Build a document from raw JSON op values, dropping any op that does
    /// not have the expected shape.
    pub fn from_values(values: Vec<serde_json::Value>) -> Self {
        let ops = values
            .into_iter()
            .filter_map(|v| match serde_json::from_value::<Op>(v) {
                Ok(op) => Some(op),
                Err(e) => {
                    tracing::debug!(error = %e, "Skipping malformed rich-text op");
                    None
                }
            })
            .collect();
        Self { ops }
    }
}

/// Accepts either a bare op array or Quill's `{ "ops": [...] }` wrapper.
impl<'de> Deserialize<'de> for RichTextDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Bare(Vec<serde_json::Value>),
            Wrapped { ops: Vec<serde_json::Value> },
        }

        let values = match Wire::deserialize(deserializer)? {
            Wire::Bare(ops) | Wire::Wrapped { ops } => ops,
        };
        Ok(Self::from_values(values))
    }
}

/// LinkedIn-ready text produced by the formatter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormattedText(String);

impl FormattedText {
    pub(crate) fn new(text: String) -> Self {
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Length as LinkedIn counts it (Unicode scalar values).
    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }
}

impl std::fmt::Display for FormattedText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
