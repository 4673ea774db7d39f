use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use super::thresholds::ThresholdsConfig;
use crate::resources::ResourceKind;
use crate::tokenize::TokenizerKind;

/// On-disk shape of a language profile (`<code>.toml`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    pub language: LanguageSection,

    #[serde(default)]
    pub tokenization: TokenizationSection,

    #[serde(default)]
    pub thresholds: ThresholdsConfig,

    #[serde(default)]
    pub modules: ModulesSection,

    /// Declared resources, by name
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceDeclaration>,

    #[serde(default)]
    pub plugins: PluginsSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageSection {
    pub code: String,

    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenizationSection {
    #[serde(default)]
    pub method: TokenizerKind,

    /// Model used by the model-based tokenizer
    #[serde(default)]
    pub model: Option<String>,
}

/// Which registered modules a run may select.
///
/// `enabled = None` means every registered module. `disabled` always wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModulesSection {
    #[serde(default)]
    pub enabled: Option<Vec<String>>,

    #[serde(default)]
    pub disabled: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDeclaration {
    /// Relative paths resolve against the profile file's directory
    pub path: PathBuf,
    pub kind: ResourceKind,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PluginsSection {
    /// Module manifest files or directories of manifests
    #[serde(default)]
    pub manifests: Vec<PathBuf>,
}
