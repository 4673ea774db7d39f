use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a record within a corpus: where it came from and
/// its position there.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId {
    pub origin: String,
    pub ordinal: u64,
}

impl RecordId {
    pub fn new(origin: impl Into<String>, ordinal: u64) -> Self {
        Self {
            origin: origin.into(),
            ordinal,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.origin, self.ordinal)
    }
}

/// One unit of text under analysis.
///
/// Records are immutable once created. Tokens are filled in exactly once,
/// by the language profile, before any module sees the record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextRecord {
    text: String,
    #[serde(default = "default_category")]
    category: String,
    #[serde(default)]
    origin: String,
    #[serde(default)]
    ordinal: u64,
    #[serde(default, skip_deserializing, skip_serializing_if = "Option::is_none")]
    tokens: Option<Vec<String>>,
}

fn default_category() -> String {
    "general".to_string()
}

impl TextRecord {
    pub fn new(
        text: impl Into<String>,
        category: impl Into<String>,
        origin: impl Into<String>,
        ordinal: u64,
    ) -> Self {
        Self {
            text: text.into(),
            category: category.into(),
            origin: origin.into(),
            ordinal,
            tokens: None,
        }
    }

    /// Builds records from plain strings, numbering them from zero.
    pub fn from_texts<I, S>(origin: &str, category: &str, texts: I) -> Vec<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        texts
            .into_iter()
            .enumerate()
            .map(|(ordinal, text)| Self::new(text, category, origin, ordinal as u64))
            .collect()
    }

    pub(crate) fn with_tokens(mut self, tokens: Vec<String>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn ordinal(&self) -> u64 {
        self.ordinal
    }

    pub fn id(&self) -> RecordId {
        RecordId::new(self.origin.clone(), self.ordinal)
    }

    pub fn tokens(&self) -> Option<&[String]> {
        self.tokens.as_deref()
    }

    pub fn is_tokenized(&self) -> bool {
        self.tokens.is_some()
    }

    /// Number of tokens, falling back to whitespace words before tokenization.
    pub fn word_count(&self) -> usize {
        match &self.tokens {
            Some(tokens) => tokens.len(),
            None => self.text.split_whitespace().count(),
        }
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}
