use std::sync::Arc;

use super::manifest::{FactoryCatalog, ModuleCandidate};
use super::{check_required_resources, AnalysisModule, ModuleFactory, Readiness, RejectionReason};
use crate::core::{MetricsBundle, TextRecord};
use crate::profile::LanguageProfile;

/// Parameters the analyze entry point must declare, after any receiver
const EXPECTED_PARAMS: &str = "(records)";

/// A candidate that passed every structural check.
pub struct ValidatedCandidate {
    pub name: String,
    pub requires: Vec<String>,
    factory: ModuleFactory,
}

impl ValidatedCandidate {
    /// Factory producing modules registered under the manifest name, with
    /// the manifest's `requires` checked before the module's own readiness.
    pub fn into_factory(self) -> ModuleFactory {
        let Self {
            name,
            requires,
            factory,
        } = self;
        Arc::new(move |profile: Arc<LanguageProfile>| {
            let inner = factory(Arc::clone(&profile));
            Box::new(ManifestModule {
                name: name.clone(),
                requires: requires.clone(),
                inner,
            }) as Box<dyn AnalysisModule>
        })
    }
}

/// Checks that a candidate exposes a name, a requirements list, and an
/// analyze entry point taking exactly the record sequence, then resolves
/// its factory.
pub fn validate_candidate(
    candidate: ModuleCandidate,
    catalog: &FactoryCatalog,
) -> Result<ValidatedCandidate, RejectionReason> {
    let missing = |member: &str| RejectionReason::MissingMember {
        member: member.to_string(),
    };

    let name = candidate
        .name
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| missing("name"))?;
    let requires = candidate.requires.ok_or_else(|| missing("requires"))?;
    let analyze = candidate.analyze.ok_or_else(|| missing("analyze"))?;
    let reference = analyze.factory.ok_or_else(|| missing("analyze.factory"))?;
    let params = analyze.params.ok_or_else(|| missing("analyze.params"))?;

    let positional = match params.split_first() {
        Some((receiver, rest)) if receiver == "self" => rest,
        _ => params.as_slice(),
    };
    if positional.len() != 1 {
        return Err(RejectionReason::SignatureMismatch {
            expected: EXPECTED_PARAMS.to_string(),
            found: format!("({})", params.join(", ")),
        });
    }

    let factory = catalog
        .get(&reference)
        .cloned()
        .ok_or(RejectionReason::UnresolvedFactory { reference })?;

    Ok(ValidatedCandidate {
        name,
        requires,
        factory,
    })
}

struct ManifestModule {
    name: String,
    requires: Vec<String>,
    inner: Box<dyn AnalysisModule>,
}

impl AnalysisModule for ManifestModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn required_resources(&self) -> Vec<String> {
        let mut all = self.requires.clone();
        for name in self.inner.required_resources() {
            if !all.contains(&name) {
                all.push(name);
            }
        }
        all
    }

    fn can_run(&self, profile: &LanguageProfile) -> Readiness {
        match check_required_resources(profile, &self.requires) {
            Readiness::Ready => self.inner.can_run(profile),
            blocked => blocked,
        }
    }

    fn analyze(self: Box<Self>, records: &[TextRecord]) -> anyhow::Result<MetricsBundle> {
        let name = self.name;
        self.inner
            .analyze(records)
            .map(|bundle| bundle.rename(&name))
    }
}
