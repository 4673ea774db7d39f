use std::collections::BTreeMap;
use std::sync::Arc;

use crate::core::metrics::ratio;
use crate::core::{MetricValue, MetricsBundle, TextRecord};
use crate::profile::LanguageProfile;
use crate::registry::AnalysisModule;

/// Category balance of the corpus.
pub struct DomainModule {
    profile: Arc<LanguageProfile>,
}

impl DomainModule {
    pub const NAME: &'static str = "domain";

    pub fn new(profile: Arc<LanguageProfile>) -> Self {
        Self { profile }
    }
}

impl AnalysisModule for DomainModule {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn analyze(self: Box<Self>, records: &[TextRecord]) -> anyhow::Result<MetricsBundle> {
        let limits = &self.profile.thresholds().domain;
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for record in records {
            *counts.entry(record.category().to_string()).or_insert(0) += 1;
        }

        let total = records.len();
        let shares: BTreeMap<String, f64> = counts
            .iter()
            .map(|(category, &count)| (category.clone(), ratio(count, total)))
            .collect();

        let under: MetricValue = shares
            .iter()
            .filter(|(_, &share)| share < limits.min_representation)
            .map(|(c, &s)| (c.clone(), s))
            .collect();
        let over: MetricValue = shares
            .iter()
            .filter(|(_, &share)| share > limits.max_representation)
            .map(|(c, &s)| (c.clone(), s))
            .collect();

        let max_share = shares.values().copied().fold(0.0, f64::max);
        let min_share = shares.values().copied().fold(f64::INFINITY, f64::min);
        let imbalance = if shares.is_empty() { 0.0 } else { max_share - min_share };

        Ok(MetricsBundle::new(Self::NAME)
            .with("total_records", total)
            .with("domain_count", counts.len())
            .with("counts", counts.into_iter().collect::<MetricValue>())
            .with("shares", shares.into_iter().collect::<MetricValue>())
            .with("underrepresented", under)
            .with("overrepresented", over)
            .with("imbalance", imbalance))
    }
}
