//! Built-in analysis modules.
//!
//! Registered in this order by [`CapabilityRegistry::with_builtins`](crate::registry::CapabilityRegistry::with_builtins),
//! which is also the order they execute in.

pub mod diversity;
pub mod domain;
pub mod gender_bias;
pub mod linguistic;
pub mod structural;

pub use diversity::DiversityModule;
pub use domain::DomainModule;
pub use gender_bias::GenderBiasModule;
pub use linguistic::LinguisticModule;
pub use structural::StructuralModule;

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::core::{MetricValue, TextRecord};
use crate::profile::LanguageProfile;
use crate::registry::{AnalysisModule, ModuleFactory};

type BuiltinConstructor = fn(Arc<LanguageProfile>) -> Box<dyn AnalysisModule>;

static BUILTIN_MODULES: &[(&str, BuiltinConstructor)] = &[
    (StructuralModule::NAME, |p| Box::new(StructuralModule::new(p))),
    (LinguisticModule::NAME, |p| Box::new(LinguisticModule::new(p))),
    (DiversityModule::NAME, |p| Box::new(DiversityModule::new(p))),
    (DomainModule::NAME, |p| Box::new(DomainModule::new(p))),
    (GenderBiasModule::NAME, |p| Box::new(GenderBiasModule::new(p))),
];

/// Factories for every built-in module, in registration order.
pub fn builtin_factories() -> Vec<(&'static str, ModuleFactory)> {
    BUILTIN_MODULES
        .iter()
        .map(|&(name, build)| (name, Arc::new(build) as ModuleFactory))
        .collect()
}

/// Normalized words of a record, as used by every built-in module.
pub(crate) fn words(record: &TextRecord) -> Vec<String> {
    crate::neardup::normalized_tokens(record)
}

/// Up to `limit` entries with the highest counts, ties broken by key.
pub(crate) fn top_counts(counts: &BTreeMap<String, usize>, limit: usize) -> MetricValue {
    let mut entries: Vec<(&String, &usize)> = counts.iter().collect();
    entries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    entries
        .into_iter()
        .take(limit)
        .map(|(key, count)| (key.clone(), *count))
        .collect()
}

/// Number of affected records listed as examples in a bundle
pub(crate) const MAX_EXAMPLES: usize = 10;
