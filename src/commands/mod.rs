//! CLI command implementations.
//!
//! - **analyze**: run the pipeline over a corpus and report metrics and
//!   recommendations
//! - **modules**: list registered modules and their readiness

pub mod analyze;
pub mod modules;

pub use analyze::{handle_analyze, AnalyzeConfig};
pub use modules::handle_modules;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{discover_profile_path, PROFILE_FILE_NAME};
use crate::profile::LanguageProfile;
use crate::registry::{CapabilityRegistry, DiscoveryReport, FactoryCatalog, RegisterOptions};

/// Loads the profile at `path`, or the nearest `corpuslens.toml` above the
/// working directory.
pub fn load_profile(path: Option<&Path>) -> Result<Arc<LanguageProfile>> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let cwd = std::env::current_dir().context("reading working directory")?;
            discover_profile_path(&cwd).with_context(|| {
                format!("no --profile given and no {PROFILE_FILE_NAME} found above {}", cwd.display())
            })?
        }
    };
    let profile = LanguageProfile::from_config_file(&path)
        .with_context(|| format!("loading profile {}", path.display()))?;
    Ok(profile.into_shared())
}

/// Built-in modules plus everything the profile's and the caller's
/// manifests declare.
pub fn build_registry(
    profile: &LanguageProfile,
    manifests: &[PathBuf],
    allow_override: bool,
) -> (CapabilityRegistry, DiscoveryReport) {
    let mut registry = CapabilityRegistry::with_builtins();
    let locations: Vec<&Path> = profile
        .plugin_manifests()
        .iter()
        .chain(manifests)
        .map(PathBuf::as_path)
        .collect();
    let report = if locations.is_empty() {
        DiscoveryReport::default()
    } else {
        registry.discover(
            &locations,
            &FactoryCatalog::builtins(),
            RegisterOptions { allow_override },
        )
    };
    (registry, report)
}
