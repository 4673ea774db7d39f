use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use super::run::RunPhase;
use crate::core::MetricsBundle;
use crate::errors::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Construction,
    Readiness,
    Analysis,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Construction => write!(f, "construction"),
            Self::Readiness => write!(f, "readiness check"),
            Self::Analysis => write!(f, "analysis"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The module returned an error
    Error,
    Panic,
}

/// Why a selected module produced no metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleFailure {
    pub stage: FailureStage,
    pub kind: FailureKind,
    pub message: String,
}

impl ModuleFailure {
    pub fn error(stage: FailureStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            kind: FailureKind::Error,
            message: message.into(),
        }
    }

    pub fn panic(stage: FailureStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            kind: FailureKind::Panic,
            message: message.into(),
        }
    }
}

impl fmt::Display for ModuleFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FailureKind::Error => write!(f, "error during {}: {}", self.stage, self.message),
            FailureKind::Panic => write!(f, "panic during {}: {}", self.stage, self.message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleTiming {
    pub module: String,
    pub elapsed_ms: f64,
}

impl ModuleTiming {
    pub(crate) fn new(module: &str, elapsed: Duration) -> Self {
        Self {
            module: module.to_string(),
            elapsed_ms: elapsed.as_secs_f64() * 1000.0,
        }
    }
}

/// What happened to one selected module.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModuleOutcome<'a> {
    Analyzed(&'a MetricsBundle),
    Skipped(&'a str),
    Failed(&'a ModuleFailure),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Every selected module produced metrics
    Complete,
    /// At least one selected module was skipped or failed
    Degraded,
    /// No module was selected
    Empty,
}

/// Outcome of one pipeline run.
///
/// Every selected module appears in exactly one of `bundles`, `skipped`
/// and `failed`. Registered modules excluded by the profile are listed in
/// `not_selected`; names the profile enabled but nothing registered are
/// reported as `warnings`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineResult {
    profile: String,
    records: usize,
    selected: Vec<String>,
    bundles: BTreeMap<String, MetricsBundle>,
    skipped: BTreeMap<String, String>,
    failed: BTreeMap<String, ModuleFailure>,
    not_selected: Vec<String>,
    warnings: Vec<String>,
    timings: Vec<ModuleTiming>,
    phases: Vec<RunPhase>,
}

impl PipelineResult {
    pub(crate) fn new(profile: &str, records: usize) -> Self {
        Self {
            profile: profile.to_string(),
            records,
            selected: Vec::new(),
            bundles: BTreeMap::new(),
            skipped: BTreeMap::new(),
            failed: BTreeMap::new(),
            not_selected: Vec::new(),
            warnings: Vec::new(),
            timings: Vec::new(),
            phases: Vec::new(),
        }
    }

    pub(crate) fn select(&mut self, name: &str) {
        self.selected.push(name.to_string());
    }

    pub(crate) fn record_bundle(&mut self, name: &str, bundle: MetricsBundle) {
        self.bundles.insert(name.to_string(), bundle.rename(name));
    }

    pub(crate) fn record_skip(&mut self, name: &str, reason: String) {
        self.skipped.insert(name.to_string(), reason);
    }

    pub(crate) fn record_failure(&mut self, name: &str, failure: ModuleFailure) {
        self.failed.insert(name.to_string(), failure);
    }

    pub(crate) fn record_not_selected(&mut self, name: &str) {
        self.not_selected.push(name.to_string());
    }

    pub(crate) fn warn(&mut self, message: String) {
        self.warnings.push(message);
    }

    pub(crate) fn record_timing(&mut self, timing: ModuleTiming) {
        self.timings.push(timing);
    }

    pub(crate) fn finish(mut self, phases: Vec<RunPhase>) -> Self {
        self.phases = phases;
        self
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// Number of records the run analyzed
    pub fn records(&self) -> usize {
        self.records
    }

    /// Selected modules, in registration order.
    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn selected_names(&self) -> impl Iterator<Item = &str> {
        self.selected.iter().map(String::as_str)
    }

    pub fn bundles(&self) -> &BTreeMap<String, MetricsBundle> {
        &self.bundles
    }

    pub fn skipped(&self) -> &BTreeMap<String, String> {
        &self.skipped
    }

    pub fn failed(&self) -> &BTreeMap<String, ModuleFailure> {
        &self.failed
    }

    pub fn not_selected(&self) -> &[String] {
        &self.not_selected
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn timings(&self) -> &[ModuleTiming] {
        &self.timings
    }

    pub fn phases(&self) -> &[RunPhase] {
        &self.phases
    }

    pub fn bundle(&self, name: &str) -> Option<&MetricsBundle> {
        self.bundles.get(name)
    }

    pub fn skipped_reason(&self, name: &str) -> Option<&str> {
        self.skipped.get(name).map(String::as_str)
    }

    pub fn failure(&self, name: &str) -> Option<&ModuleFailure> {
        self.failed.get(name)
    }

    pub fn outcome(&self, name: &str) -> Option<ModuleOutcome<'_>> {
        if let Some(bundle) = self.bundles.get(name) {
            return Some(ModuleOutcome::Analyzed(bundle));
        }
        if let Some(reason) = self.skipped.get(name) {
            return Some(ModuleOutcome::Skipped(reason));
        }
        self.failed.get(name).map(ModuleOutcome::Failed)
    }

    /// The module's metrics, or an error saying why there are none.
    pub fn bundle_or_error(&self, name: &str) -> Result<&MetricsBundle> {
        match self.outcome(name) {
            Some(ModuleOutcome::Analyzed(bundle)) => Ok(bundle),
            Some(ModuleOutcome::Skipped(reason)) => Err(Error::ModuleSkipped {
                module: name.to_string(),
                reason: reason.to_string(),
            }),
            Some(ModuleOutcome::Failed(failure)) => Err(Error::ModuleRuntime {
                module: name.to_string(),
                message: failure.to_string(),
            }),
            None => Err(Error::ModuleSkipped {
                module: name.to_string(),
                reason: "not selected for this run".to_string(),
            }),
        }
    }

    pub fn status(&self) -> RunStatus {
        if self.selected.is_empty() {
            RunStatus::Empty
        } else if self.skipped.is_empty() && self.failed.is_empty() {
            RunStatus::Complete
        } else {
            RunStatus::Degraded
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PipelineResult {
        let mut result = PipelineResult::new("fr", 3);
        for name in ["structural", "linguistic", "gender_bias"] {
            result.select(name);
        }
        result.record_bundle("structural", MetricsBundle::new("whatever"));
        result.record_skip("gender_bias", "missing resource: gender_terms".into());
        result.record_failure(
            "linguistic",
            ModuleFailure::panic(FailureStage::Analysis, "index out of bounds"),
        );
        result.finish(vec![RunPhase::NotStarted, RunPhase::Done])
    }

    #[test]
    fn test_outcomes() {
        let result = sample();
        assert!(matches!(result.outcome("structural"), Some(ModuleOutcome::Analyzed(_))));
        assert_eq!(
            result.outcome("gender_bias"),
            Some(ModuleOutcome::Skipped("missing resource: gender_terms"))
        );
        assert!(matches!(result.outcome("linguistic"), Some(ModuleOutcome::Failed(_))));
        assert_eq!(result.outcome("domain"), None);
        assert_eq!(result.status(), RunStatus::Degraded);
    }

    #[test]
    fn test_bundle_renamed_to_registration_name() {
        let result = sample();
        assert_eq!(result.bundle("structural").unwrap().module_name(), "structural");
    }

    #[test]
    fn test_bundle_or_error_messages() {
        let result = sample();
        assert!(result.bundle_or_error("structural").is_ok());
        assert_eq!(
            result.bundle_or_error("linguistic").unwrap_err().to_string(),
            "Module 'linguistic' failed: panic during analysis: index out of bounds"
        );
        assert_eq!(
            result.bundle_or_error("gender_bias").unwrap_err().to_string(),
            "Module 'gender_bias' skipped: missing resource: gender_terms"
        );
    }

    #[test]
    fn test_serialized_order() {
        let json = serde_json::to_value(sample()).unwrap();
        let selected: Vec<&str> = json["selected"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(selected, ["structural", "linguistic", "gender_bias"]);

        let mut result = PipelineResult::new("fr", 1);
        for name in ["zeta", "alpha"] {
            result.select(name);
            result.record_bundle(name, MetricsBundle::new(name));
        }
        let bundles = serde_json::to_string(result.bundles()).unwrap();
        assert!(bundles.find("alpha").unwrap() < bundles.find("zeta").unwrap());
        assert_eq!(result.selected(), ["zeta", "alpha"]);
    }

    #[test]
    fn test_status_empty_and_complete() {
        let empty = PipelineResult::new("fr", 0);
        assert_eq!(empty.status(), RunStatus::Empty);
        let mut complete = PipelineResult::new("fr", 1);
        complete.select("structural");
        complete.record_bundle("structural", MetricsBundle::new("structural"));
        assert_eq!(complete.status(), RunStatus::Complete);
    }
}
