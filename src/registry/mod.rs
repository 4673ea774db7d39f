//! Capability registry: the set of analysis modules a run can select from.
//!
//! Modules are registered as factories. The executor builds a fresh module
//! instance per run from the shared profile, asks it whether it can run,
//! and then consumes it with [`AnalysisModule::analyze`], so a module can
//! never be analyzed twice in one run.

mod manifest;
mod validation;

pub use manifest::{AnalyzeEntry, FactoryCatalog, ModuleCandidate, ModuleManifest};
pub use validation::{validate_candidate, ValidatedCandidate};

use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::core::{MetricsBundle, TextRecord};
use crate::profile::LanguageProfile;

/// Whether a module can run against a profile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    Blocked(String),
}

impl Readiness {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Ready => None,
            Self::Blocked(reason) => Some(reason),
        }
    }

    /// `(ready, reason)` pair; the reason is present only when blocked.
    pub fn as_pair(&self) -> (bool, Option<&str>) {
        (self.is_ready(), self.reason())
    }
}

/// Default readiness check: the first required resource the profile lacks
/// blocks the module.
pub fn check_required_resources(profile: &LanguageProfile, required: &[String]) -> Readiness {
    match required.iter().find(|name| !profile.resources().has(name)) {
        Some(missing) => Readiness::Blocked(format!("missing resource: {missing}")),
        None => Readiness::Ready,
    }
}

/// A pluggable unit of corpus analysis.
pub trait AnalysisModule: Send {
    fn name(&self) -> &str;

    /// Resource names this module needs, in the order they are checked.
    fn required_resources(&self) -> Vec<String> {
        Vec::new()
    }

    /// Must be free of side effects.
    fn can_run(&self, profile: &LanguageProfile) -> Readiness {
        check_required_resources(profile, &self.required_resources())
    }

    fn analyze(self: Box<Self>, records: &[TextRecord]) -> anyhow::Result<MetricsBundle>;
}

/// Builds a module instance bound to a profile.
pub type ModuleFactory = Arc<dyn Fn(Arc<LanguageProfile>) -> Box<dyn AnalysisModule> + Send + Sync>;

/// Wraps a constructor function as a [`ModuleFactory`].
pub fn factory<F, M>(build: F) -> ModuleFactory
where
    F: Fn(Arc<LanguageProfile>) -> M + Send + Sync + 'static,
    M: AnalysisModule + 'static,
{
    Arc::new(move |profile| Box::new(build(profile)) as Box<dyn AnalysisModule>)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModuleOrigin {
    BuiltIn,
    Programmatic,
    Manifest { location: PathBuf },
}

#[derive(Clone)]
pub struct RegisteredModule {
    name: String,
    origin: ModuleOrigin,
    factory: ModuleFactory,
}

impl RegisteredModule {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn origin(&self) -> &ModuleOrigin {
        &self.origin
    }

    pub fn instantiate(&self, profile: Arc<LanguageProfile>) -> Box<dyn AnalysisModule> {
        (self.factory)(profile)
    }
}

impl fmt::Debug for RegisteredModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredModule")
            .field("name", &self.name)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

/// Why a module candidate or registration was refused.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectionReason {
    #[error("missing member: {member}")]
    MissingMember { member: String },

    #[error("signature mismatch: analyze must take {expected}, found {found}")]
    SignatureMismatch { expected: String, found: String },

    #[error("duplicate name: {name}")]
    DuplicateName { name: String },

    #[error("unresolved factory: {reference}")]
    UnresolvedFactory { reference: String },

    #[error("unreadable manifest: {message}")]
    UnreadableManifest { message: String },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RegisterOptions {
    /// Replace an existing module of the same name instead of refusing
    pub allow_override: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Rejection {
    pub location: PathBuf,
    /// Candidate name, when the candidate declared one
    pub candidate: Option<String>,
    pub reason: RejectionReason,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DiscoveryReport {
    pub registered: Vec<String>,
    pub rejected: Vec<Rejection>,
}

impl DiscoveryReport {
    pub fn registered_count(&self) -> usize {
        self.registered.len()
    }

    fn merge(&mut self, other: DiscoveryReport) {
        self.registered.extend(other.registered);
        self.rejected.extend(other.rejected);
    }
}

/// Ordered set of named module factories. Registration order is execution
/// order.
#[derive(Clone, Default)]
pub struct CapabilityRegistry {
    entries: Vec<RegisteredModule>,
}

impl fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.entries).finish()
    }
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the built-in modules.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for (name, factory) in crate::modules::builtin_factories() {
            // Built-in names are distinct
            let _ = registry.insert(name.to_string(), ModuleOrigin::BuiltIn, factory, false);
        }
        registry
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        factory: ModuleFactory,
    ) -> Result<(), RejectionReason> {
        self.register_with(name, factory, RegisterOptions::default())
    }

    pub fn register_with(
        &mut self,
        name: impl Into<String>,
        factory: ModuleFactory,
        options: RegisterOptions,
    ) -> Result<(), RejectionReason> {
        self.insert(name.into(), ModuleOrigin::Programmatic, factory, options.allow_override)
    }

    fn insert(
        &mut self,
        name: String,
        origin: ModuleOrigin,
        factory: ModuleFactory,
        allow_override: bool,
    ) -> Result<(), RejectionReason> {
        if name.trim().is_empty() {
            return Err(RejectionReason::MissingMember {
                member: "name".to_string(),
            });
        }

        match self.entries.iter_mut().find(|entry| entry.name == name) {
            Some(existing) if allow_override => {
                tracing::info!(module = %name, "overriding registered module");
                existing.origin = origin;
                existing.factory = factory;
                Ok(())
            }
            Some(_) => Err(RejectionReason::DuplicateName { name }),
            None => {
                tracing::debug!(module = %name, ?origin, "registered module");
                self.entries.push(RegisteredModule {
                    name,
                    origin,
                    factory,
                });
                Ok(())
            }
        }
    }

    /// Removes a module; returns whether it was present.
    pub fn unregister(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.name != name);
        before != self.entries.len()
    }

    pub fn list_names(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.name.clone()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|entry| entry.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredModule> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn origin(&self, name: &str) -> Option<&ModuleOrigin> {
        self.get(name).map(RegisteredModule::origin)
    }

    pub fn entries(&self) -> &[RegisteredModule] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registers every valid module found at `locations`.
    ///
    /// A location is a manifest file or a directory whose `*.toml` files are
    /// manifests. Invalid candidates are reported and skipped; discovery
    /// always continues with the next candidate.
    pub fn discover<P: AsRef<Path>>(
        &mut self,
        locations: &[P],
        catalog: &FactoryCatalog,
        options: RegisterOptions,
    ) -> DiscoveryReport {
        let mut report = DiscoveryReport::default();
        for location in locations {
            for manifest_path in manifest_files(location.as_ref(), &mut report) {
                match ModuleManifest::load(&manifest_path) {
                    Ok(manifest) => report.merge(self.discover_candidates(
                        &manifest_path,
                        manifest.modules,
                        catalog,
                        options,
                    )),
                    Err(e) => {
                        tracing::warn!(location = %manifest_path.display(), error = %e, "rejected manifest");
                        report.rejected.push(Rejection {
                            location: manifest_path,
                            candidate: None,
                            reason: RejectionReason::UnreadableManifest {
                                message: e.to_string(),
                            },
                        });
                    }
                }
            }
        }
        tracing::info!(
            registered = report.registered_count(),
            rejected = report.rejected.len(),
            "module discovery finished"
        );
        report
    }

    /// Validates and registers candidates already read from `location`.
    pub fn discover_candidates(
        &mut self,
        location: &Path,
        candidates: Vec<ModuleCandidate>,
        catalog: &FactoryCatalog,
        options: RegisterOptions,
    ) -> DiscoveryReport {
        let mut report = DiscoveryReport::default();
        for candidate in candidates {
            let declared_name = candidate.name.clone();
            let outcome = validate_candidate(candidate, catalog).and_then(|validated| {
                let name = validated.name.clone();
                self.insert(
                    name.clone(),
                    ModuleOrigin::Manifest {
                        location: location.to_path_buf(),
                    },
                    validated.into_factory(),
                    options.allow_override,
                )
                .map(|()| name)
            });

            match outcome {
                Ok(name) => report.registered.push(name),
                Err(reason) => {
                    tracing::warn!(
                        location = %location.display(),
                        candidate = declared_name.as_deref().unwrap_or("<unnamed>"),
                        %reason,
                        "rejected module candidate"
                    );
                    report.rejected.push(Rejection {
                        location: location.to_path_buf(),
                        candidate: declared_name,
                        reason,
                    });
                }
            }
        }
        report
    }
}

/// Expands a location to the manifest files it contains, sorted by path.
fn manifest_files(location: &Path, report: &mut DiscoveryReport) -> Vec<PathBuf> {
    if !location.is_dir() {
        return vec![location.to_path_buf()];
    }
    match fs::read_dir(location) {
        Ok(entries) => {
            let mut files: Vec<PathBuf> = entries
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "toml"))
                .collect();
            files.sort();
            files
        }
        Err(e) => {
            report.rejected.push(Rejection {
                location: location.to_path_buf(),
                candidate: None,
                reason: RejectionReason::UnreadableManifest {
                    message: e.to_string(),
                },
            });
            Vec::new()
        }
    }
}
