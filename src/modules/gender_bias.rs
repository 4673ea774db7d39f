//! Gender representation in the corpus.
//!
//! Needs two term tables: `gender_terms` (term -> "masculine" | "feminine")
//! and `professions` (profession term -> gender). An optional
//! `stereotypes` string set holds case-insensitive regular expressions;
//! every match adds to the bias score.

use anyhow::{anyhow, Context};
use regex::{Regex, RegexBuilder};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::{words, MAX_EXAMPLES};
use crate::core::metrics::ratio;
use crate::core::{MetricValue, MetricsBundle, TextRecord};
use crate::profile::LanguageProfile;
use crate::registry::AnalysisModule;

pub const GENDER_TERMS: &str = "gender_terms";
pub const PROFESSIONS: &str = "professions";
pub const STEREOTYPES: &str = "stereotypes";

const MASCULINE: &str = "masculine";
const FEMININE: &str = "feminine";

/// Bias added per stereotype match, and its cap
const STEREOTYPE_WEIGHT: f64 = 0.1;
const STEREOTYPE_CAP: f64 = 0.5;

pub struct GenderBiasModule {
    profile: Arc<LanguageProfile>,
}

impl GenderBiasModule {
    pub const NAME: &'static str = "gender_bias";

    pub fn new(profile: Arc<LanguageProfile>) -> Self {
        Self { profile }
    }

    fn term_table(&self, name: &str) -> anyhow::Result<&BTreeMap<String, String>> {
        let resource = self.profile.resources().require(name)?;
        resource
            .as_term_categories()
            .ok_or_else(|| anyhow!("resource '{}' is a {} table, expected term-categories", name, resource.kind()))
    }

    fn stereotype_patterns(&self) -> Vec<Regex> {
        let Some(patterns) = self
            .profile
            .resources()
            .get(STEREOTYPES)
            .and_then(|r| r.as_string_set())
        else {
            return Vec::new();
        };
        patterns
            .iter()
            .filter_map(|pattern| {
                match RegexBuilder::new(pattern).case_insensitive(true).build() {
                    Ok(regex) => Some(regex),
                    Err(e) => {
                        tracing::warn!(%pattern, error = %e, "ignoring invalid stereotype pattern");
                        None
                    }
                }
            })
            .collect()
    }
}

#[derive(Default)]
struct Counts {
    masculine: usize,
    feminine: usize,
}

impl Counts {
    fn add(&mut self, category: &str) {
        match category {
            MASCULINE => self.masculine += 1,
            FEMININE => self.feminine += 1,
            _ => {}
        }
    }

    fn total(&self) -> usize {
        self.masculine + self.feminine
    }
}

impl AnalysisModule for GenderBiasModule {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn required_resources(&self) -> Vec<String> {
        vec![GENDER_TERMS.to_string(), PROFESSIONS.to_string()]
    }

    fn analyze(self: Box<Self>, records: &[TextRecord]) -> anyhow::Result<MetricsBundle> {
        let limits = &self.profile.thresholds().gender;
        let terms = self.term_table(GENDER_TERMS).context("gender analysis")?;
        let professions = self.term_table(PROFESSIONS).context("gender analysis")?;
        let patterns = self.stereotype_patterns();

        let mut mentions = Counts::default();
        let mut profession_mentions = Counts::default();
        let mut neutral_professions = 0usize;
        let mut stereotype_matches = 0usize;
        let mut stereotype_examples: BTreeMap<String, MetricValue> = BTreeMap::new();

        for record in records {
            for word in words(record) {
                if let Some(category) = terms.get(&word) {
                    mentions.add(category);
                }
                if let Some(category) = professions.get(&word) {
                    match category.as_str() {
                        MASCULINE | FEMININE => profession_mentions.add(category),
                        _ => neutral_professions += 1,
                    }
                }
            }

            let matched = patterns.iter().filter(|p| p.is_match(record.text())).count();
            if matched > 0 {
                stereotype_matches += matched;
                if stereotype_examples.len() < MAX_EXAMPLES {
                    stereotype_examples.insert(record.id().to_string(), matched.into());
                }
            }
        }

        let feminine_share = if mentions.total() == 0 {
            0.5
        } else {
            ratio(mentions.feminine, mentions.total())
        };
        let masculine_share = 1.0 - feminine_share;
        let feminine_to_masculine: MetricValue = match (mentions.masculine, mentions.feminine) {
            (0, 0) => 0.0.into(),
            (0, _) => "unbounded".into(),
            (m, f) => (f as f64 / m as f64).into(),
        };
        let bias_score = ((masculine_share - 0.5).abs()
            + (stereotype_matches as f64 * STEREOTYPE_WEIGHT).min(STEREOTYPE_CAP))
        .min(1.0);
        let within_target =
            (limits.target_ratio_min..=limits.target_ratio_max).contains(&feminine_share);

        Ok(MetricsBundle::new(Self::NAME)
            .with("masculine_mentions", mentions.masculine)
            .with("feminine_mentions", mentions.feminine)
            .with("gendered_mentions", mentions.total())
            .with("feminine_share", feminine_share)
            .with("feminine_to_masculine", feminine_to_masculine)
            .with("masculine_professions", profession_mentions.masculine)
            .with("feminine_professions", profession_mentions.feminine)
            .with("neutral_professions", neutral_professions)
            .with("stereotype_matches", stereotype_matches)
            .with("stereotype_examples", MetricValue::Map(stereotype_examples))
            .with("bias_score", bias_score)
            .with("within_target", if within_target { 1.0 } else { 0.0 }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Readiness;
    use crate::resources::Resource;

    fn table(pairs: &[(&str, &str)]) -> Resource {
        Resource::TermCategories(
            pairs
                .iter()
                .map(|(t, c)| (t.to_string(), c.to_string()))
                .collect(),
        )
    }

    fn full_profile() -> Arc<LanguageProfile> {
        LanguageProfile::builder("en")
            .inline_resource(GENDER_TERMS, table(&[("he", MASCULINE), ("she", FEMININE), ("him", MASCULINE)]))
            .inline_resource(PROFESSIONS, table(&[("nurse", FEMININE), ("engineer", MASCULINE), ("doctor", "neutral")]))
            .inline_resource(
                STEREOTYPES,
                Resource::StringSet(["women? (are|is) (too )?emotional".to_string(), "(".to_string()].into_iter().collect()),
            )
            .build()
            .unwrap()
            .into_shared()
    }

    #[test]
    fn test_blocked_without_resources() {
        let profile = LanguageProfile::builder("en").build().unwrap().into_shared();
        let module = GenderBiasModule::new(Arc::clone(&profile));
        assert_eq!(
            module.can_run(&profile),
            Readiness::Blocked("missing resource: gender_terms".into())
        );
    }

    #[test]
    fn test_counts_and_bias() {
        let profile = full_profile();
        let module = GenderBiasModule::new(Arc::clone(&profile));
        assert!(module.can_run(&profile).is_ready());
        let records = profile.prepare(TextRecord::from_texts(
            "t",
            "general",
            [
                "He is an engineer and she is a nurse",
                "He told him the doctor was late",
                "Women are too emotional, he said",
            ],
        ));
        let bundle = Box::new(module).analyze(&records).unwrap();
        assert_eq!(bundle.number("masculine_mentions"), Some(4.0));
        assert_eq!(bundle.number("feminine_mentions"), Some(1.0));
        assert_eq!(bundle.number("neutral_professions"), Some(1.0));
        assert_eq!(bundle.number("stereotype_matches"), Some(1.0));
        assert_eq!(bundle.number("feminine_to_masculine"), Some(0.25));
        // |0.8 - 0.5| + 0.1
        assert!((bundle.number("bias_score").unwrap() - 0.4).abs() < 1e-9);
        assert_eq!(bundle.number("within_target"), Some(0.0));
    }

    #[test]
    fn test_no_gendered_mentions_is_balanced() {
        let profile = full_profile();
        let records = profile.prepare(TextRecord::from_texts("t", "general", ["the cat sat"]));
        let bundle = Box::new(GenderBiasModule::new(profile)).analyze(&records).unwrap();
        assert_eq!(bundle.number("feminine_share"), Some(0.5));
        assert_eq!(bundle.number("bias_score"), Some(0.0));
        assert_eq!(bundle.number("within_target"), Some(1.0));
    }

    #[test]
    fn test_wrong_resource_kind_fails() {
        let profile = LanguageProfile::builder("en")
            .inline_resource(GENDER_TERMS, Resource::StringSet(Default::default()))
            .inline_resource(PROFESSIONS, table(&[]))
            .build()
            .unwrap()
            .into_shared();
        let err = Box::new(GenderBiasModule::new(profile)).analyze(&[]).unwrap_err();
        assert!(format!("{err:#}").contains("expected term-categories"), "{err:#}");
    }
}
