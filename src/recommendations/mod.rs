//! Actionable recommendations derived from a pipeline result.
//!
//! Every skipped or failed module produces a recommendation, so a degraded
//! run is never silent. Content recommendations compare module metrics
//! against the profile's thresholds.

use serde::Serialize;

use crate::config::ThresholdsConfig;
use crate::core::MetricsBundle;
use crate::modules::{DiversityModule, DomainModule, GenderBiasModule, LinguisticModule, StructuralModule};
use crate::pipeline::PipelineResult;
use crate::profile::LanguageProfile;

const MISSING_RESOURCE: &str = "missing resource: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub category: String,
    pub severity: Severity,
    /// 1 is the most urgent
    pub priority: u8,
    pub title: String,
    pub description: String,
    pub affected_items: Vec<String>,
    pub actions: Vec<String>,
}

impl Recommendation {
    fn new(category: &str, severity: Severity, priority: u8, title: String) -> Self {
        Self {
            category: category.to_string(),
            severity,
            priority,
            title,
            description: String::new(),
            affected_items: Vec::new(),
            actions: Vec::new(),
        }
    }

    fn describe(mut self, description: String) -> Self {
        self.description = description;
        self
    }

    fn affecting(mut self, items: Vec<String>) -> Self {
        self.affected_items = items;
        self
    }

    fn actions<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.actions = actions.into_iter().map(Into::into).collect();
        self
    }
}

/// Recommendations for a finished run, most urgent first.
pub fn generate(result: &PipelineResult, profile: &LanguageProfile) -> Vec<Recommendation> {
    let thresholds = profile.thresholds();
    let mut recommendations = pipeline_health(result);

    let checks: [(&str, fn(&MetricsBundle, &ThresholdsConfig) -> Vec<Recommendation>); 5] = [
        (StructuralModule::NAME, check_structural),
        (LinguisticModule::NAME, check_linguistic),
        (DiversityModule::NAME, check_diversity),
        (DomainModule::NAME, check_domain),
        (GenderBiasModule::NAME, check_gender),
    ];
    for (name, check) in checks {
        if let Some(bundle) = result.bundle(name) {
            recommendations.extend(check(bundle, thresholds));
        }
    }

    recommendations.sort_by_key(|r| (r.priority, r.severity));
    recommendations
}

fn pipeline_health(result: &PipelineResult) -> Vec<Recommendation> {
    let skipped = result.skipped().iter().map(|(module, reason)| {
        let action = match reason.strip_prefix(MISSING_RESOURCE) {
            Some(resource) => format!(
                "Declare resource '{resource}' under [resources.{resource}] in the profile"
            ),
            None => "Check the module's requirements against the profile".to_string(),
        };
        Recommendation::new("pipeline", Severity::Medium, 2, format!("Module '{module}' was skipped"))
            .describe(format!("'{module}' did not run: {reason}."))
            .affecting(vec![module.clone()])
            .actions([action])
    });

    let failed = result.failed().iter().map(|(module, failure)| {
        Recommendation::new("pipeline", Severity::High, 1, format!("Module '{module}' failed"))
            .describe(format!("'{module}' produced no metrics: {failure}."))
            .affecting(vec![module.clone()])
            .actions([
                "Fix the module or disable it in the profile's [modules] table".to_string(),
                "Re-run with RUST_LOG=corpuslens=debug for details".to_string(),
            ])
    });

    skipped.chain(failed).collect()
}

fn check_structural(bundle: &MetricsBundle, thresholds: &ThresholdsConfig) -> Vec<Recommendation> {
    let limits = &thresholds.structural;
    let mut out = Vec::new();

    let too_long = bundle.number("too_long").unwrap_or(0.0);
    if too_long > 0.0 {
        let share = bundle.number("too_long_share").unwrap_or(0.0);
        let (severity, priority) = if share > 0.20 {
            (Severity::Critical, 1)
        } else {
            (Severity::High, 2)
        };
        out.push(
            Recommendation::new(
                "structural",
                severity,
                priority,
                format!("{too_long} records exceed {} words", limits.max_words),
            )
            .describe(format!(
                "{:.1}% of records are longer than {} words.",
                share * 100.0,
                limits.max_words
            ))
            .affecting(keys(bundle, "too_long_examples"))
            .actions([
                format!("Split long records (target: {}-{} words)", limits.min_words, limits.max_words),
                "Break compound sentences at clause boundaries".to_string(),
            ]),
        );
    }

    let too_short = bundle.number("too_short").unwrap_or(0.0);
    if too_short > 0.0 {
        let share = bundle.number("too_short_share").unwrap_or(0.0);
        let (severity, priority) = if share > 0.15 {
            (Severity::High, 2)
        } else {
            (Severity::Low, 4)
        };
        out.push(
            Recommendation::new(
                "structural",
                severity,
                priority,
                format!("{too_short} records are below {} words", limits.min_words),
            )
            .describe(format!(
                "{:.1}% of records are shorter than {} words and may lack context.",
                share * 100.0,
                limits.min_words
            ))
            .affecting(keys(bundle, "too_short_examples"))
            .actions([
                format!("Expand short records to at least {} words", limits.min_words),
                "Combine related short records".to_string(),
            ]),
        );
    }
    out
}

fn check_linguistic(bundle: &MetricsBundle, thresholds: &ThresholdsConfig) -> Vec<Recommendation> {
    let limits = &thresholds.linguistic;
    let mut out = Vec::new();

    if let Some(mean) = bundle.number("mean_readability") {
        if mean < limits.min_readability {
            out.push(
                Recommendation::new(
                    "linguistic",
                    Severity::Medium,
                    3,
                    format!("Mean readability {mean:.1} is below {:.1}", limits.min_readability),
                )
                .describe(format!(
                    "{} records score below the readability threshold.",
                    bundle.number("hard_to_read").unwrap_or(0.0)
                ))
                .actions(["Prefer shorter words and sentences", "Reduce subordinate clauses"]),
            );
        }
    }

    if let Some(complexity) = bundle.number("lexical_complexity") {
        if complexity > limits.max_lexical_complexity {
            out.push(
                Recommendation::new(
                    "linguistic",
                    Severity::Medium,
                    3,
                    format!("Lexical complexity {complexity:.2} is above {:.2}", limits.max_lexical_complexity),
                )
                .describe("Many words fall outside the most frequent lexicon entries.".to_string())
                .actions(["Replace rare words with common equivalents"]),
            );
        }
    }
    out
}

fn check_diversity(bundle: &MetricsBundle, thresholds: &ThresholdsConfig) -> Vec<Recommendation> {
    let limits = &thresholds.diversity;
    let mut out = Vec::new();

    if let Some(ttr) = bundle.number("type_token_ratio") {
        if ttr < limits.min_ttr {
            out.push(
                Recommendation::new(
                    "diversity",
                    Severity::High,
                    2,
                    format!("Type-token ratio {ttr:.2} is below {:.2}", limits.min_ttr),
                )
                .describe(format!(
                    "Vocabulary is repetitive; aim for a ratio of about {:.2}.",
                    limits.target_ttr
                ))
                .affecting(keys(bundle, "repetitive_ngrams"))
                .actions(["Add records covering new vocabulary", "Rephrase repeated n-grams"]),
            );
        }
    }

    if let Some(starters) = bundle.number("starter_diversity") {
        if starters < limits.min_starter_diversity {
            out.push(
                Recommendation::new(
                    "diversity",
                    Severity::Low,
                    4,
                    format!("Record starters are repetitive ({starters:.2})"),
                )
                .actions(["Vary the first word of records"]),
            );
        }
    }

    let share = bundle.number("near_duplicate_share").unwrap_or(0.0);
    if share > thresholds.duplicates.max_share {
        let pairs = bundle.number("near_duplicate_pairs").unwrap_or(0.0);
        out.push(
            Recommendation::new(
                "diversity",
                Severity::High,
                2,
                format!("{pairs} near-duplicate pairs found"),
            )
            .describe(format!(
                "{:.1}% of records have a near-duplicate (allowed: {:.1}%).",
                share * 100.0,
                thresholds.duplicates.max_share * 100.0
            ))
            .affecting(keys(bundle, "near_duplicate_examples"))
            .actions(["Remove or rewrite one record of each pair"]),
        );
    }

    if let Some(coverage) = bundle.number("vocabulary_coverage") {
        if coverage < limits.target_vocabulary_coverage {
            out.push(
                Recommendation::new(
                    "diversity",
                    Severity::Low,
                    4,
                    format!("Reference vocabulary coverage is {:.1}%", coverage * 100.0),
                )
                .actions(["Add records using uncovered reference words"]),
            );
        }
    }
    out
}

fn check_domain(bundle: &MetricsBundle, thresholds: &ThresholdsConfig) -> Vec<Recommendation> {
    let limits = &thresholds.domain;
    let mut out = Vec::new();

    let under = keys(bundle, "underrepresented");
    if !under.is_empty() {
        out.push(
            Recommendation::new(
                "domain",
                Severity::Medium,
                3,
                format!("{} categories are underrepresented", under.len()),
            )
            .describe(format!(
                "Each category should hold at least {:.0}% of records.",
                limits.min_representation * 100.0
            ))
            .affecting(under)
            .actions(["Collect more records for these categories"]),
        );
    }

    let over = keys(bundle, "overrepresented");
    if !over.is_empty() {
        out.push(
            Recommendation::new(
                "domain",
                Severity::Medium,
                3,
                format!("{} categories are overrepresented", over.len()),
            )
            .describe(format!(
                "No category should exceed {:.0}% of records.",
                limits.max_representation * 100.0
            ))
            .affecting(over)
            .actions(["Downsample these categories or add records elsewhere"]),
        );
    }
    out
}

fn check_gender(bundle: &MetricsBundle, thresholds: &ThresholdsConfig) -> Vec<Recommendation> {
    let limits = &thresholds.gender;
    if bundle.number("within_target") != Some(0.0) {
        return Vec::new();
    }
    let bias = bundle.number("bias_score").unwrap_or(0.0);
    let share = bundle.number("feminine_share").unwrap_or(0.5);
    let (severity, priority) = if bias > limits.max_bias_score {
        (Severity::High, 2)
    } else {
        (Severity::Medium, 3)
    };

    let mut affected = keys(bundle, "masculine_professions");
    affected.extend(keys(bundle, "feminine_professions"));
    vec![Recommendation::new(
        "gender_bias",
        severity,
        priority,
        format!("Feminine share of gendered mentions is {:.1}%", share * 100.0),
    )
    .describe(format!(
        "Target range is {:.0}%-{:.0}%; bias score {bias:.2}.",
        limits.target_ratio_min * 100.0,
        limits.target_ratio_max * 100.0
    ))
    .affecting(affected)
    .actions([
        "Balance gendered references across records",
        "Pair professions with both genders",
    ])]
}

fn keys(bundle: &MetricsBundle, key: &str) -> Vec<String> {
    bundle
        .map(key)
        .map(|map| map.keys().cloned().collect())
        .unwrap_or_default()
}

/// Counts of recommendations per severity, most severe first.
pub fn severity_counts(recommendations: &[Recommendation]) -> Vec<(Severity, usize)> {
    let mut counts: Vec<(Severity, usize)> = Vec::new();
    for rec in recommendations {
        match counts.iter_mut().find(|(severity, _)| *severity == rec.severity) {
            Some((_, count)) => *count += 1,
            None => counts.push((rec.severity, 1)),
        }
    }
    counts.sort_by_key(|(severity, _)| *severity);
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MetricValue;
    use crate::pipeline::{FailureStage, ModuleFailure};

    fn profile() -> LanguageProfile {
        LanguageProfile::builder("en").build().unwrap()
    }

    fn names(values: &[&str]) -> MetricValue {
        values.iter().map(|v| (v.to_string(), 1.0)).collect()
    }

    #[test]
    fn test_skips_and_failures_are_reported() {
        let mut result = PipelineResult::new("en", 0);
        result.select("gender_bias");
        result.select("linguistic");
        result.record_skip("gender_bias", "missing resource: gender_terms".into());
        result.record_failure("linguistic", ModuleFailure::error(FailureStage::Analysis, "bad"));

        let recs = generate(&result, &profile());
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].title, "Module 'linguistic' failed");
        assert_eq!(recs[1].title, "Module 'gender_bias' was skipped");
        assert!(recs[1].actions[0].contains("[resources.gender_terms]"));
    }

    #[test]
    fn test_many_long_records_are_critical() {
        let mut result = PipelineResult::new("en", 10);
        result.select("structural");
        result.record_bundle(
            "structural",
            MetricsBundle::new("structural")
                .with("too_long", 3.0)
                .with("too_long_share", 0.3)
                .with("too_long_examples", names(&["t#0", "t#4", "t#7"])),
        );

        let recs = generate(&result, &profile());
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].severity, Severity::Critical);
        assert_eq!(recs[0].affected_items, ["t#0", "t#4", "t#7"]);
    }

    #[test]
    fn test_sorted_by_priority_then_severity() {
        let mut result = PipelineResult::new("en", 10);
        result.select("diversity");
        result.select("domain");
        result.record_bundle(
            "diversity",
            MetricsBundle::new("diversity")
                .with("type_token_ratio", 0.2)
                .with("vocabulary_coverage", 0.1),
        );
        result.record_bundle(
            "domain",
            MetricsBundle::new("domain").with("underrepresented", names(&["legal"])),
        );

        let recs = generate(&result, &profile());
        let priorities: Vec<u8> = recs.iter().map(|r| r.priority).collect();
        assert_eq!(priorities, [2, 3, 4]);
        assert_eq!(recs[1].affected_items, ["legal"]);
    }

    #[test]
    fn test_gender_within_target_is_quiet() {
        let mut result = PipelineResult::new("en", 10);
        result.select("gender_bias");
        result.record_bundle(
            "gender_bias",
            MetricsBundle::new("gender_bias").with("within_target", 1.0),
        );
        assert!(generate(&result, &profile()).is_empty());
    }

    #[test]
    fn test_severity_counts() {
        let recs = vec![
            Recommendation::new("a", Severity::Low, 4, "x".into()),
            Recommendation::new("b", Severity::High, 2, "y".into()),
            Recommendation::new("c", Severity::Low, 4, "z".into()),
        ];
        assert_eq!(severity_counts(&recs), [(Severity::High, 1), (Severity::Low, 2)]);
    }
}
