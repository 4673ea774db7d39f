//! Vocabulary diversity, repetition and near-duplicates.

use anyhow::bail;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::{top_counts, words, MAX_EXAMPLES};
use crate::core::metrics::ratio;
use crate::core::{MetricValue, MetricsBundle, TextRecord};
use crate::neardup::{NearDupConfig, NearDupDetector};
use crate::profile::LanguageProfile;
use crate::registry::AnalysisModule;
use crate::resources::Resource;

/// Optional string set the corpus vocabulary is measured against
pub const REFERENCE_VOCABULARY: &str = "reference_vocabulary";

pub struct DiversityModule {
    profile: Arc<LanguageProfile>,
}

impl DiversityModule {
    pub const NAME: &'static str = "diversity";

    pub fn new(profile: Arc<LanguageProfile>) -> Self {
        Self { profile }
    }
}

impl AnalysisModule for DiversityModule {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn analyze(self: Box<Self>, records: &[TextRecord]) -> anyhow::Result<MetricsBundle> {
        let thresholds = self.profile.thresholds();
        let per_record: Vec<Vec<String>> = records.iter().map(words).collect();

        let total_words: usize = per_record.iter().map(Vec::len).sum();
        let vocabulary: BTreeSet<&str> = per_record
            .iter()
            .flatten()
            .map(String::as_str)
            .collect();

        let starters: Vec<&str> = per_record
            .iter()
            .filter_map(|w| w.first().map(String::as_str))
            .collect();
        let unique_starters = starters.iter().collect::<BTreeSet<_>>().len();

        let min_count = thresholds.diversity.repetition_min_count.max(1);
        let mut repetitive: BTreeMap<String, usize> = ngram_counts(&per_record, 2);
        repetitive.extend(ngram_counts(&per_record, 3));
        repetitive.retain(|_, count| *count >= min_count);

        let mut bundle = MetricsBundle::new(Self::NAME)
            .with("total_words", total_words)
            .with("unique_words", vocabulary.len())
            .with("type_token_ratio", ratio(vocabulary.len(), total_words))
            .with("starter_diversity", ratio(unique_starters, starters.len()))
            .with("repetitive_ngram_count", repetitive.len())
            .with("repetitive_ngrams", top_counts(&repetitive, 20));

        match self.profile.resources().get(REFERENCE_VOCABULARY) {
            None => bundle.insert("vocabulary_coverage", "unavailable: no reference vocabulary"),
            Some(Resource::StringSet(reference)) => {
                let reference: BTreeSet<String> =
                    reference.iter().map(|w| w.to_lowercase()).collect();
                let covered = reference
                    .iter()
                    .filter(|w| vocabulary.contains(w.as_str()))
                    .count();
                bundle.insert("vocabulary_coverage", ratio(covered, reference.len()));
            }
            Some(other) => bail!(
                "resource '{}' is a {} table, expected string-set",
                REFERENCE_VOCABULARY,
                other.kind()
            ),
        }

        let detector =
            NearDupDetector::new(NearDupConfig::from_thresholds(&thresholds.duplicates));
        let report = detector.detect(records);
        let involved = report.involved_records().len();
        let examples: MetricValue = report
            .pairs()
            .iter()
            .take(MAX_EXAMPLES)
            .map(|p| (format!("{} ~ {}", p.left, p.right), p.similarity))
            .collect();

        bundle.insert("near_duplicate_pairs", report.len());
        bundle.insert("near_duplicate_records", involved);
        bundle.insert("near_duplicate_share", ratio(involved, report.stats().eligible));
        bundle.insert("near_duplicate_clusters", report.clusters().len());
        bundle.insert("near_duplicate_examples", examples);
        bundle.insert("candidates_compared", report.stats().candidates_compared);
        Ok(bundle)
    }
}

/// Counts of space-joined `n`-grams within each record.
fn ngram_counts(per_record: &[Vec<String>], n: usize) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for words in per_record {
        for window in words.windows(n) {
            *counts.entry(window.join(" ")).or_insert(0) += 1;
        }
    }
    counts
}
