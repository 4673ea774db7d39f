//! Language profile configuration files.
//!
//! A profile file is TOML:
//!
//! ```toml
//! [language]
//! code = "fr"
//!
//! [tokenization]
//! method = "simple"          # simple | model-based | custom
//!
//! [thresholds.structural]
//! max_words = 25
//!
//! [modules]
//! disabled = ["gender_bias"]
//!
//! [resources.lexicon]
//! path = "lexicon.txt"
//! kind = "frequency"
//!
//! [plugins]
//! manifests = ["modules/"]
//! ```

mod core;
mod loader;
mod thresholds;

pub use self::core::{
    LanguageSection, ModulesSection, PluginsSection, ProfileConfig, ResourceDeclaration,
    TokenizationSection,
};
pub(crate) use loader::read_config_file;
pub use loader::{
    directory_ancestors, discover_profile_path, load_profile_config, parse_and_validate_config,
    PROFILE_FILE_NAME,
};
pub use thresholds::{
    DiversityThresholds, DomainThresholds, DuplicateThresholds, GenderThresholds,
    LinguisticThresholds, StructuralThresholds, ThresholdsConfig,
};
