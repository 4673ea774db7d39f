use std::path::PathBuf;
use std::sync::Arc;

use super::{LanguageProfile, ModuleSelection};
use crate::config::ThresholdsConfig;
use crate::errors::{Error, Result};
use crate::resources::{InlineSource, Resource, ResourceSource, ResourceStore};
use crate::tokenize::{self, TokenizeFn, TokenizerKind};

/// Step-by-step construction of a [`LanguageProfile`].
///
/// Nothing is validated or loaded until [`build`](Self::build).
pub struct ProfileBuilder {
    code: String,
    name: Option<String>,
    tokenizer: TokenizerKind,
    tokenizer_model: Option<String>,
    custom_tokenizer: Option<TokenizeFn>,
    thresholds: ThresholdsConfig,
    overrides: Vec<(String, String, f64)>,
    resources: Vec<(String, Box<dyn ResourceSource>)>,
    modules: ModuleSelection,
    plugin_manifests: Vec<PathBuf>,
}

impl ProfileBuilder {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: None,
            tokenizer: TokenizerKind::default(),
            tokenizer_model: None,
            custom_tokenizer: None,
            thresholds: ThresholdsConfig::default(),
            overrides: Vec::new(),
            resources: Vec::new(),
            modules: ModuleSelection::all(),
            plugin_manifests: Vec::new(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn tokenizer(mut self, kind: TokenizerKind) -> Self {
        self.tokenizer = kind;
        self
    }

    pub fn tokenizer_model(mut self, model: impl Into<String>) -> Self {
        self.tokenizer_model = Some(model.into());
        self
    }

    /// Selects custom tokenization with the given function.
    pub fn custom_tokenizer<F>(mut self, func: F) -> Self
    where
        F: Fn(&str) -> Vec<String> + Send + Sync + 'static,
    {
        self.tokenizer = TokenizerKind::Custom;
        self.custom_tokenizer = Some(Arc::new(func));
        self
    }

    pub fn thresholds(mut self, thresholds: ThresholdsConfig) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Overrides a single threshold, applied on top of `thresholds`.
    pub fn threshold(mut self, category: impl Into<String>, key: impl Into<String>, value: f64) -> Self {
        self.overrides.push((category.into(), key.into(), value));
        self
    }

    pub fn resource<S>(mut self, name: impl Into<String>, source: S) -> Self
    where
        S: ResourceSource + 'static,
    {
        self.resources.push((name.into(), Box::new(source)));
        self
    }

    pub fn inline_resource(self, name: impl Into<String>, resource: Resource) -> Self {
        self.resource(name, InlineSource::new(resource))
    }

    pub fn modules(mut self, modules: ModuleSelection) -> Self {
        self.modules = modules;
        self
    }

    pub fn enable<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let enabled = names.into_iter().map(Into::into).collect();
        self.modules = ModuleSelection::new(Some(enabled), self.modules.disabled().to_vec());
        self
    }

    pub fn disable(mut self, name: impl Into<String>) -> Self {
        let mut disabled = self.modules.disabled().to_vec();
        disabled.push(name.into());
        self.modules = ModuleSelection::new(self.modules.enabled().map(<[String]>::to_vec), disabled);
        self
    }

    pub fn plugin_manifest(mut self, path: impl Into<PathBuf>) -> Self {
        self.plugin_manifests.push(path.into());
        self
    }

    /// Validates the structure, then loads every declared resource once.
    pub fn build(self) -> Result<LanguageProfile> {
        let code = self.code.trim().to_string();
        if code.is_empty() {
            return Err(Error::profile(self.code, "language code must not be empty"));
        }

        let tokenizer = tokenize::resolve(
            self.tokenizer,
            self.tokenizer_model.as_deref(),
            self.custom_tokenizer,
        )
        .map_err(|reason| Error::profile(&code, reason))?;

        let mut thresholds = self.thresholds;
        for (category, key, value) in &self.overrides {
            thresholds
                .set(category, key, *value)
                .map_err(|reason| Error::profile(&code, reason))?;
        }
        thresholds
            .validate()
            .map_err(|reason| Error::profile(&code, reason))?;

        let resources = ResourceStore::load(self.resources);
        tracing::info!(
            profile = %code,
            tokenizer = %tokenizer.kind(),
            resources_present = resources.present_names().count(),
            resources_declared = resources.len(),
            "language profile built"
        );

        Ok(LanguageProfile {
            name: self.name.unwrap_or_else(|| code.clone()),
            code,
            tokenizer,
            thresholds,
            resources,
            modules: self.modules,
            plugin_manifests: self.plugin_manifests,
        })
    }
}
