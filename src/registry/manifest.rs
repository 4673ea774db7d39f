use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::ModuleFactory;
use crate::config::read_config_file;
use crate::errors::{Error, Result};

/// A module manifest file:
///
/// ```toml
/// [[module]]
/// name = "strict_structural"
/// requires = []
///
/// [module.analyze]
/// factory = "structural"
/// params = ["records"]
/// ```
///
/// Every member is optional at parse time so that an incomplete candidate
/// can be reported individually instead of failing the whole file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleManifest {
    #[serde(default, rename = "module")]
    pub modules: Vec<ModuleCandidate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleCandidate {
    #[serde(default)]
    pub name: Option<String>,

    /// Resources the module needs in addition to those its factory declares
    #[serde(default)]
    pub requires: Option<Vec<String>>,

    #[serde(default)]
    pub analyze: Option<AnalyzeEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeEntry {
    /// Reference resolved through a [`FactoryCatalog`]
    #[serde(default)]
    pub factory: Option<String>,

    /// Declared parameters of the analyze entry point
    #[serde(default)]
    pub params: Option<Vec<String>>,
}

impl ModuleManifest {
    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = read_config_file(path).map_err(|e| {
            Error::config(
                format!("cannot read manifest {}: {}", path.display(), e),
                Some(path.to_path_buf()),
            )
        })?;
        Self::from_toml(&contents)
    }
}

/// Factory references a manifest may name.
#[derive(Clone, Default)]
pub struct FactoryCatalog {
    factories: BTreeMap<String, ModuleFactory>,
}

impl std::fmt::Debug for FactoryCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.factories.keys()).finish()
    }
}

impl FactoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog exposing the built-in modules under their own names.
    pub fn builtins() -> Self {
        let mut catalog = Self::new();
        for (name, factory) in crate::modules::builtin_factories() {
            catalog.insert(name, factory);
        }
        catalog
    }

    pub fn insert(&mut self, reference: impl Into<String>, factory: ModuleFactory) -> &mut Self {
        self.factories.insert(reference.into(), factory);
        self
    }

    #[must_use]
    pub fn with(mut self, reference: impl Into<String>, factory: ModuleFactory) -> Self {
        self.insert(reference, factory);
        self
    }

    pub fn get(&self, reference: &str) -> Option<&ModuleFactory> {
        self.factories.get(reference)
    }

    pub fn contains(&self, reference: &str) -> bool {
        self.factories.contains_key(reference)
    }

    pub fn references(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn test_parse_manifest_with_partial_candidates() {
        let manifest = ModuleManifest::from_toml(indoc! {r#"
            [[module]]
            name = "complete"
            requires = ["lexicon"]
            [module.analyze]
            factory = "structural"
            params = ["records"]

            [[module]]
            name = "no_analyze"
            requires = []
        "#})
        .unwrap();
        assert_eq!(manifest.modules.len(), 2);
        assert_eq!(manifest.modules[0].requires.as_deref(), Some(&["lexicon".to_string()][..]));
        assert!(manifest.modules[1].analyze.is_none());
    }

    #[test]
    fn test_parse_manifest_rejects_bad_toml() {
        assert!(ModuleManifest::from_toml("[[module]\nname=").is_err());
    }

    #[test]
    fn test_builtin_catalog() {
        let catalog = FactoryCatalog::builtins();
        assert!(catalog.contains("structural"));
        assert!(catalog.contains("gender_bias"));
        assert_eq!(catalog.references().count(), 5);
    }
}
