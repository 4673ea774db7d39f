//! Language profiles: everything language specific a run needs.
//!
//! A profile is immutable once built and shared between modules through an
//! `Arc`. Construction either yields a usable profile or a
//! [`Error::ProfileConstruction`](crate::errors::Error::ProfileConstruction);
//! a missing resource never fails construction, it is recorded as absent.

mod builder;

pub use builder::ProfileBuilder;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{load_profile_config, ProfileConfig, ThresholdsConfig};
use crate::core::TextRecord;
use crate::errors::{Error, Result};
use crate::resources::{FileSource, ResourceStore};
use crate::tokenize::{Tokenizer, TokenizerKind};

/// Module selection rules of a profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleSelection {
    enabled: Option<Vec<String>>,
    disabled: Vec<String>,
}

impl ModuleSelection {
    /// Every registered module is eligible.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn new(enabled: Option<Vec<String>>, disabled: Vec<String>) -> Self {
        Self { enabled, disabled }
    }

    /// Disabled always wins; otherwise a name is eligible when there is no
    /// enabled list or the list names it.
    pub fn is_enabled(&self, name: &str) -> bool {
        if self.disabled.iter().any(|d| d == name) {
            return false;
        }
        match &self.enabled {
            Some(enabled) => enabled.iter().any(|e| e == name),
            None => true,
        }
    }

    pub fn enabled(&self) -> Option<&[String]> {
        self.enabled.as_deref()
    }

    pub fn disabled(&self) -> &[String] {
        &self.disabled
    }
}

pub struct LanguageProfile {
    code: String,
    name: String,
    tokenizer: Box<dyn Tokenizer>,
    thresholds: ThresholdsConfig,
    resources: ResourceStore,
    modules: ModuleSelection,
    plugin_manifests: Vec<PathBuf>,
}

impl fmt::Debug for LanguageProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LanguageProfile")
            .field("code", &self.code)
            .field("name", &self.name)
            .field("tokenizer", &self.tokenizer.kind())
            .field("thresholds", &self.thresholds)
            .field("resources", &self.resources)
            .field("modules", &self.modules)
            .field("plugin_manifests", &self.plugin_manifests)
            .finish()
    }
}

impl LanguageProfile {
    pub fn builder(code: impl Into<String>) -> ProfileBuilder {
        ProfileBuilder::new(code)
    }

    /// Builds a profile from parsed configuration. Relative resource and
    /// manifest paths resolve against `base_dir`.
    pub fn from_config(config: ProfileConfig, base_dir: &Path) -> Result<Self> {
        let mut builder = ProfileBuilder::new(config.language.code)
            .tokenizer(config.tokenization.method)
            .thresholds(config.thresholds)
            .modules(ModuleSelection::new(
                config.modules.enabled,
                config.modules.disabled,
            ));
        if let Some(name) = config.language.name {
            builder = builder.name(name);
        }
        if let Some(model) = config.tokenization.model {
            builder = builder.tokenizer_model(model);
        }
        for (name, declaration) in config.resources {
            builder = builder.resource(
                name,
                FileSource::new(base_dir.join(declaration.path), declaration.kind),
            );
        }
        for manifest in config.plugins.manifests {
            builder = builder.plugin_manifest(base_dir.join(manifest));
        }
        builder.build()
    }

    /// Loads and builds a profile from a TOML file. Configuration problems
    /// are reported as profile construction failures.
    pub fn from_config_file(path: &Path) -> Result<Self> {
        let config = load_profile_config(path).map_err(|e| {
            let code = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            Error::profile(code, e.to_string())
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_config(config, base_dir)
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tokenizer_kind(&self) -> TokenizerKind {
        self.tokenizer.kind()
    }

    pub fn thresholds(&self) -> &ThresholdsConfig {
        &self.thresholds
    }

    pub fn resources(&self) -> &ResourceStore {
        &self.resources
    }

    pub fn modules(&self) -> &ModuleSelection {
        &self.modules
    }

    pub fn plugin_manifests(&self) -> &[PathBuf] {
        &self.plugin_manifests
    }

    pub fn tokenize(&self, text: &str) -> Vec<String> {
        self.tokenizer.tokenize(text)
    }

    /// Tokenizes records that have no tokens yet. Already tokenized
    /// records pass through untouched.
    pub fn prepare<I>(&self, records: I) -> Vec<TextRecord>
    where
        I: IntoIterator<Item = TextRecord>,
    {
        records
            .into_iter()
            .map(|record| {
                if record.is_tokenized() {
                    record
                } else {
                    let tokens = self.tokenize(record.text());
                    record.with_tokens(tokens)
                }
            })
            .collect()
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}
