//! Record length distributions and out-of-range records.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::MAX_EXAMPLES;
use crate::core::metrics::{describe, ratio};
use crate::core::{MetricValue, MetricsBundle, TextRecord};
use crate::profile::LanguageProfile;
use crate::registry::AnalysisModule;

pub struct StructuralModule {
    profile: Arc<LanguageProfile>,
}

impl StructuralModule {
    pub const NAME: &'static str = "structural";

    pub fn new(profile: Arc<LanguageProfile>) -> Self {
        Self { profile }
    }
}

impl AnalysisModule for StructuralModule {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn analyze(self: Box<Self>, records: &[TextRecord]) -> anyhow::Result<MetricsBundle> {
        let limits = &self.profile.thresholds().structural;
        let word_counts: Vec<f64> = records.iter().map(|r| r.word_count() as f64).collect();
        let char_counts: Vec<f64> = records.iter().map(|r| r.char_count() as f64).collect();

        let mut too_short = BTreeMap::new();
        let mut too_long = BTreeMap::new();
        let mut chars_out_of_range = 0usize;
        let mut histogram: BTreeMap<String, usize> = BTreeMap::new();

        for record in records {
            let words = record.word_count();
            let chars = record.char_count();
            *histogram.entry(format!("{words:03}")).or_insert(0) += 1;
            if words < limits.min_words {
                too_short.insert(record.id().to_string(), words);
            } else if words > limits.max_words {
                too_long.insert(record.id().to_string(), words);
            }
            if chars < limits.min_chars || chars > limits.max_chars {
                chars_out_of_range += 1;
            }
        }

        let total = records.len();
        Ok(MetricsBundle::new(Self::NAME)
            .with("total_records", total)
            .with("word_count", describe(&word_counts))
            .with("char_count", describe(&char_counts))
            .with("too_short", too_short.len())
            .with("too_long", too_long.len())
            .with("too_short_share", ratio(too_short.len(), total))
            .with("too_long_share", ratio(too_long.len(), total))
            .with("chars_out_of_range", chars_out_of_range)
            .with("too_short_examples", examples(too_short))
            .with("too_long_examples", examples(too_long))
            .with("length_histogram", histogram.into_iter().collect::<MetricValue>()))
    }
}

fn examples(records: BTreeMap<String, usize>) -> MetricValue {
    records.into_iter().take(MAX_EXAMPLES).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(texts: &[&str]) -> MetricsBundle {
        let profile = LanguageProfile::builder("en").build().unwrap().into_shared();
        let records = profile.prepare(TextRecord::from_texts("t", "general", texts.iter().copied()));
        Box::new(StructuralModule::new(profile)).analyze(&records).unwrap()
    }

    #[test]
    fn test_flags_short_and_long() {
        let long = "word ".repeat(25);
        let bundle = run(&["too short", "this one is just about right", long.as_str()]);
        assert_eq!(bundle.number("total_records"), Some(3.0));
        assert_eq!(bundle.number("too_short"), Some(1.0));
        assert_eq!(bundle.number("too_long"), Some(1.0));
        assert!(bundle.map("too_short_examples").unwrap().contains_key("t#0"));
        assert_eq!(bundle.map("length_histogram").unwrap()["025"], MetricValue::Number(1.0));
    }

    #[test]
    fn test_empty_input() {
        let bundle = run(&[]);
        assert_eq!(bundle.number("too_short_share"), Some(0.0));
        assert_eq!(bundle.module_name(), "structural");
    }
}
