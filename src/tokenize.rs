//! Tokenization strategies selectable by a language profile.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use unicode_segmentation::UnicodeSegmentation;

/// Caller supplied tokenization function.
pub type TokenizeFn = Arc<dyn Fn(&str) -> Vec<String> + Send + Sync>;

/// Model name of the only built-in model-based tokenizer.
pub const UNICODE_WORDS_MODEL: &str = "unicode-words";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenizerKind {
    /// Split on whitespace, text kept as written
    #[default]
    Simple,
    /// Unicode word boundaries, lowercased
    ModelBased,
    /// A function registered on the profile builder
    Custom,
}

impl fmt::Display for TokenizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple => write!(f, "simple"),
            Self::ModelBased => write!(f, "model-based"),
            Self::Custom => write!(f, "custom"),
        }
    }
}

impl FromStr for TokenizerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" | "whitespace" => Ok(Self::Simple),
            "model-based" | "model" => Ok(Self::ModelBased),
            "custom" => Ok(Self::Custom),
            other => Err(format!("unknown tokenization method '{other}'")),
        }
    }
}

pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<String>;
    fn kind(&self) -> TokenizerKind;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SimpleTokenizer;

impl Tokenizer for SimpleTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_string).collect()
    }

    fn kind(&self) -> TokenizerKind {
        TokenizerKind::Simple
    }
}

/// Word segmentation per Unicode Standard Annex #29.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnicodeWordTokenizer;

impl Tokenizer for UnicodeWordTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        text.unicode_words().map(str::to_lowercase).collect()
    }

    fn kind(&self) -> TokenizerKind {
        TokenizerKind::ModelBased
    }
}

#[derive(Clone)]
pub struct CustomTokenizer {
    func: TokenizeFn,
}

impl CustomTokenizer {
    pub fn new(func: TokenizeFn) -> Self {
        Self { func }
    }
}

impl fmt::Debug for CustomTokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomTokenizer").finish_non_exhaustive()
    }
}

impl Tokenizer for CustomTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        (self.func)(text)
    }

    fn kind(&self) -> TokenizerKind {
        TokenizerKind::Custom
    }
}

/// Resolves a tokenizer for a profile. Errors describe why the combination
/// cannot be built; the profile builder turns them into construction failures.
pub fn resolve(
    kind: TokenizerKind,
    model: Option<&str>,
    custom: Option<TokenizeFn>,
) -> Result<Box<dyn Tokenizer>, String> {
    match kind {
        TokenizerKind::Simple => Ok(Box::new(SimpleTokenizer)),
        TokenizerKind::ModelBased => match model.unwrap_or(UNICODE_WORDS_MODEL) {
            UNICODE_WORDS_MODEL => Ok(Box::new(UnicodeWordTokenizer)),
            other => Err(format!("tokenizer model '{other}' is not available")),
        },
        TokenizerKind::Custom => custom
            .map(|func| Box::new(CustomTokenizer::new(func)) as Box<dyn Tokenizer>)
            .ok_or_else(|| "custom tokenization selected but no tokenizer function supplied".to_string()),
    }
}
