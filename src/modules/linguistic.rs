//! Readability, lexical complexity and jargon.
//!
//! Readability is the Flesch reading ease of each record, clamped to
//! `[0, 100]`. Lexical complexity needs the optional `lexicon` frequency
//! table: a word's complexity is its frequency rank over
//! `rare_word_rank`, capped at 1, and 1 for words missing from the lexicon.

use anyhow::bail;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use super::{top_counts, words};
use crate::core::metrics::{describe, mean, ratio};
use crate::core::{MetricsBundle, TextRecord};
use crate::profile::LanguageProfile;
use crate::registry::AnalysisModule;
use crate::resources::Resource;

pub const LEXICON: &str = "lexicon";

const VOWELS: &str = "aeiouyàâäáéèêëíîïóôöòúùûüÿæœ";

static SENTENCE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?…]+").unwrap());

pub struct LinguisticModule {
    profile: Arc<LanguageProfile>,
}

impl LinguisticModule {
    pub const NAME: &'static str = "linguistic";

    pub fn new(profile: Arc<LanguageProfile>) -> Self {
        Self { profile }
    }

    /// Lexicon ranks (1 = most frequent), if the profile has a lexicon.
    fn lexicon_ranks(&self) -> anyhow::Result<Option<HashMap<&str, usize>>> {
        let table = match self.profile.resources().get(LEXICON) {
            None => return Ok(None),
            Some(Resource::FrequencyTable(table)) => table,
            Some(other) => bail!(
                "resource '{}' is a {} table, expected frequency",
                LEXICON,
                other.kind()
            ),
        };
        let mut by_count: Vec<(&String, &u64)> = table.iter().collect();
        by_count.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        Ok(Some(
            by_count
                .into_iter()
                .enumerate()
                .map(|(i, (word, _))| (word.as_str(), i + 1))
                .collect(),
        ))
    }
}

impl AnalysisModule for LinguisticModule {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn analyze(self: Box<Self>, records: &[TextRecord]) -> anyhow::Result<MetricsBundle> {
        let limits = &self.profile.thresholds().linguistic;
        let ranks = self.lexicon_ranks()?;

        let mut readability = Vec::with_capacity(records.len());
        let mut word_counts = Vec::with_capacity(records.len());
        let mut word_lengths = Vec::new();
        let mut complexity = Vec::new();
        let mut jargon: BTreeMap<String, usize> = BTreeMap::new();
        let mut records_with_jargon = 0usize;

        for record in records {
            let words = words(record);
            if words.is_empty() {
                continue;
            }
            readability.push(reading_ease(record.text(), &words));
            word_counts.push(words.len() as f64);
            word_lengths.extend(words.iter().map(|w| w.chars().count() as f64));

            if let Some(ranks) = &ranks {
                let total: f64 = words
                    .iter()
                    .map(|w| match ranks.get(w.as_str()) {
                        Some(&rank) => (rank as f64 / limits.rare_word_rank.max(1) as f64).min(1.0),
                        None => 1.0,
                    })
                    .sum();
                complexity.push(total / words.len() as f64);
            }

            let mut has_jargon = false;
            for word in &words {
                let known = ranks.as_ref().is_some_and(|r| r.contains_key(word.as_str()));
                if word.chars().count() >= limits.long_word_chars && !known {
                    *jargon.entry(word.clone()).or_insert(0) += 1;
                    has_jargon = true;
                }
            }
            records_with_jargon += usize::from(has_jargon);
        }

        let hard_to_read = readability
            .iter()
            .filter(|&&score| score < limits.min_readability)
            .count();

        let mut bundle = MetricsBundle::new(Self::NAME)
            .with("mean_words_per_record", mean(&word_counts))
            .with("mean_word_length", mean(&word_lengths))
            .with("readability", describe(&readability))
            .with("mean_readability", mean(&readability))
            .with("hard_to_read", hard_to_read)
            .with("hard_to_read_share", ratio(hard_to_read, readability.len()))
            .with("records_with_jargon", records_with_jargon)
            .with("jargon_terms", top_counts(&jargon, 20));

        if ranks.is_some() {
            let complex = complexity
                .iter()
                .filter(|&&c| c > limits.max_lexical_complexity)
                .count();
            bundle.insert("lexical_complexity", mean(&complexity));
            bundle.insert("complex_records", complex);
        } else {
            bundle.insert("lexical_complexity", "unavailable: no lexicon");
        }
        Ok(bundle)
    }
}

/// Flesch reading ease, clamped to [0, 100].
pub fn reading_ease(text: &str, words: &[String]) -> f64 {
    if words.is_empty() {
        return 100.0;
    }
    let sentences = SENTENCE_END
        .split(text)
        .filter(|s| !s.trim().is_empty())
        .count()
        .max(1);
    let syllables: usize = words.iter().map(|w| count_syllables(w)).sum();
    let words_per_sentence = words.len() as f64 / sentences as f64;
    let syllables_per_word = syllables as f64 / words.len() as f64;
    (206.835 - 1.015 * words_per_sentence - 84.6 * syllables_per_word).clamp(0.0, 100.0)
}

/// Vowel groups, at least one per word.
pub fn count_syllables(word: &str) -> usize {
    let mut count = 0;
    let mut previous_vowel = false;
    for c in word.chars().flat_map(char::to_lowercase) {
        let vowel = VOWELS.contains(c);
        if vowel && !previous_vowel {
            count += 1;
        }
        previous_vowel = vowel;
    }
    count.max(1)
}
