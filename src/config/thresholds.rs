use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Record length bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StructuralThresholds {
    #[serde(default = "default_min_words")]
    pub min_words: usize,

    #[serde(default = "default_max_words")]
    pub max_words: usize,

    #[serde(default = "default_min_chars")]
    pub min_chars: usize,

    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
}

impl Default for StructuralThresholds {
    fn default() -> Self {
        Self {
            min_words: default_min_words(),
            max_words: default_max_words(),
            min_chars: default_min_chars(),
            max_chars: default_max_chars(),
        }
    }
}

fn default_min_words() -> usize {
    3
}
fn default_max_words() -> usize {
    20
}
fn default_min_chars() -> usize {
    10
}
fn default_max_chars() -> usize {
    200
}

/// Readability and vocabulary difficulty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinguisticThresholds {
    /// Records scoring below this reading ease are hard to read
    pub min_readability: f64,
    pub max_lexical_complexity: f64,
    /// Words at least this long that are absent from the lexicon count as jargon
    pub long_word_chars: usize,
    /// Lexicon rank at which a word is considered fully rare
    pub rare_word_rank: usize,
}

impl Default for LinguisticThresholds {
    fn default() -> Self {
        Self {
            min_readability: 40.0,
            max_lexical_complexity: 0.7,
            long_word_chars: 12,
            rare_word_rank: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiversityThresholds {
    pub target_ttr: f64,
    pub min_ttr: f64,
    pub min_starter_diversity: f64,
    /// N-grams seen at least this many times are reported as repetitive
    pub repetition_min_count: usize,
    pub target_vocabulary_coverage: f64,
}

impl Default for DiversityThresholds {
    fn default() -> Self {
        Self {
            target_ttr: 0.6,
            min_ttr: 0.4,
            min_starter_diversity: 0.5,
            repetition_min_count: 5,
            target_vocabulary_coverage: 0.7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DomainThresholds {
    pub min_representation: f64,
    pub max_representation: f64,
}

impl Default for DomainThresholds {
    fn default() -> Self {
        Self {
            min_representation: 0.10,
            max_representation: 0.30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenderThresholds {
    /// Acceptable feminine share of gendered mentions
    pub target_ratio_min: f64,
    pub target_ratio_max: f64,
    pub max_bias_score: f64,
}

impl Default for GenderThresholds {
    fn default() -> Self {
        Self {
            target_ratio_min: 0.4,
            target_ratio_max: 0.6,
            max_bias_score: 0.3,
        }
    }
}

/// Near-duplicate detection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DuplicateThresholds {
    #[serde(default = "default_duplicate_threshold")]
    pub threshold: f64,

    #[serde(default = "default_shingle_size")]
    pub shingle_size: usize,

    #[serde(default = "default_num_hashes")]
    pub num_hashes: usize,

    /// Share of records involved in a near-duplicate pair that warrants action
    #[serde(default = "default_max_share")]
    pub max_share: f64,
}

impl Default for DuplicateThresholds {
    fn default() -> Self {
        Self {
            threshold: default_duplicate_threshold(),
            shingle_size: default_shingle_size(),
            num_hashes: default_num_hashes(),
            max_share: default_max_share(),
        }
    }
}

fn default_duplicate_threshold() -> f64 {
    0.8
}
fn default_shingle_size() -> usize {
    3
}
fn default_num_hashes() -> usize {
    4
}
fn default_max_share() -> f64 {
    0.05
}

/// All numeric thresholds of a profile, keyed by category.
///
/// Built-in categories are typed. Any other `[thresholds.<category>]` table
/// is kept as raw numbers for external modules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThresholdsConfig {
    #[serde(default)]
    pub structural: StructuralThresholds,

    #[serde(default)]
    pub linguistic: LinguisticThresholds,

    #[serde(default)]
    pub diversity: DiversityThresholds,

    #[serde(default)]
    pub domain: DomainThresholds,

    #[serde(default)]
    pub gender: GenderThresholds,

    #[serde(default)]
    pub duplicates: DuplicateThresholds,

    #[serde(flatten)]
    pub custom: BTreeMap<String, BTreeMap<String, f64>>,
}

const TYPED_CATEGORIES: &[&str] = &[
    "structural",
    "linguistic",
    "diversity",
    "domain",
    "gender",
    "duplicates",
];

impl ThresholdsConfig {
    fn typed_value(&self, category: &str) -> Option<serde_json::Value> {
        let value = match category {
            "structural" => serde_json::to_value(&self.structural),
            "linguistic" => serde_json::to_value(&self.linguistic),
            "diversity" => serde_json::to_value(&self.diversity),
            "domain" => serde_json::to_value(&self.domain),
            "gender" => serde_json::to_value(&self.gender),
            "duplicates" => serde_json::to_value(&self.duplicates),
            _ => return None,
        };
        value.ok()
    }

    /// Numeric lookup across typed and custom categories.
    pub fn get(&self, category: &str, key: &str) -> Option<f64> {
        match self.typed_value(category) {
            Some(value) => value.get(key).and_then(serde_json::Value::as_f64),
            None => self.custom.get(category)?.get(key).copied(),
        }
    }

    pub fn get_or(&self, category: &str, key: &str, default: f64) -> f64 {
        self.get(category, key).unwrap_or(default)
    }

    /// Sets one value. Unknown keys in a built-in category are an error.
    pub fn set(&mut self, category: &str, key: &str, value: f64) -> Result<(), String> {
        let Some(mut current) = self.typed_value(category) else {
            self.custom
                .entry(category.to_string())
                .or_default()
                .insert(key.to_string(), value);
            return Ok(());
        };

        let slot = current
            .as_object_mut()
            .and_then(|fields| fields.get_mut(key))
            .ok_or_else(|| format!("unknown threshold '{category}.{key}'"))?;
        *slot = if slot.is_u64() {
            if value < 0.0 || value.fract() != 0.0 {
                return Err(format!(
                    "threshold '{category}.{key}' must be a non-negative integer"
                ));
            }
            serde_json::json!(value as u64)
        } else {
            serde_json::json!(value)
        };

        let err = |e: serde_json::Error| format!("threshold '{category}.{key}': {e}");
        match category {
            "structural" => self.structural = serde_json::from_value(current).map_err(err)?,
            "linguistic" => self.linguistic = serde_json::from_value(current).map_err(err)?,
            "diversity" => self.diversity = serde_json::from_value(current).map_err(err)?,
            "domain" => self.domain = serde_json::from_value(current).map_err(err)?,
            "gender" => self.gender = serde_json::from_value(current).map_err(err)?,
            _ => self.duplicates = serde_json::from_value(current).map_err(err)?,
        }
        Ok(())
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        TYPED_CATEGORIES
            .iter()
            .copied()
            .chain(self.custom.keys().map(String::as_str))
    }

    /// Checks every value is usable; the message names the first offender.
    pub fn validate(&self) -> Result<(), String> {
        for category in TYPED_CATEGORIES {
            if let Some(serde_json::Value::Object(fields)) = self.typed_value(category) {
                for (key, value) in fields {
                    // serde_json writes non-finite floats as null
                    if value.is_null() {
                        return Err(format!("threshold '{category}.{key}' is not a finite number"));
                    }
                }
            }
        }
        for (category, values) in &self.custom {
            for (key, value) in values {
                if !value.is_finite() {
                    return Err(format!("threshold '{category}.{key}' is not a finite number"));
                }
            }
        }

        let s = &self.structural;
        if s.min_words > s.max_words {
            return Err(format!(
                "structural.min_words ({}) exceeds structural.max_words ({})",
                s.min_words, s.max_words
            ));
        }
        if s.min_chars > s.max_chars {
            return Err(format!(
                "structural.min_chars ({}) exceeds structural.max_chars ({})",
                s.min_chars, s.max_chars
            ));
        }

        check_unit_range("domain", "min_representation", "max_representation",
            self.domain.min_representation, self.domain.max_representation)?;
        check_unit_range("gender", "target_ratio_min", "target_ratio_max",
            self.gender.target_ratio_min, self.gender.target_ratio_max)?;

        let d = &self.duplicates;
        if !(d.threshold > 0.0 && d.threshold <= 1.0) {
            return Err(format!("duplicates.threshold ({}) must be in (0, 1]", d.threshold));
        }
        if d.shingle_size == 0 {
            return Err("duplicates.shingle_size must be at least 1".to_string());
        }
        if d.num_hashes == 0 {
            return Err("duplicates.num_hashes must be at least 1".to_string());
        }
        Ok(())
    }
}

fn check_unit_range(category: &str, low_key: &str, high_key: &str, low: f64, high: f64) -> Result<(), String> {
    if !(0.0..=1.0).contains(&low) || !(0.0..=1.0).contains(&high) {
        return Err(format!("{category}.{low_key} and {category}.{high_key} must lie in [0, 1]"));
    }
    if low > high {
        return Err(format!("{category}.{low_key} ({low}) exceeds {category}.{high_key} ({high})"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn test_defaults_validate() {
        assert_eq!(ThresholdsConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_partial_toml_keeps_defaults_and_custom_tables() {
        let config: ThresholdsConfig = toml::from_str(indoc! {"
            [structural]
            max_words = 25

            [readability_plugin]
            grade = 8
        "})
        .unwrap();
        assert_eq!(config.structural.max_words, 25);
        assert_eq!(config.structural.min_words, 3);
        assert_eq!(config.get("readability_plugin", "grade"), Some(8.0));
        assert_eq!(config.get("structural", "max_words"), Some(25.0));
        assert_eq!(config.get("duplicates", "threshold"), Some(0.8));
        assert_eq!(config.get("structural", "nope"), None);
        assert_eq!(config.get_or("structural", "nope", 7.0), 7.0);
    }

    #[test]
    fn test_unknown_builtin_key_rejected_by_toml() {
        let result: Result<ThresholdsConfig, _> = toml::from_str("[structural]\nmax_wrds = 25\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_set_typed_and_custom() {
        let mut config = ThresholdsConfig::default();
        config.set("duplicates", "threshold", 0.9).unwrap();
        config.set("structural", "min_words", 2.0).unwrap();
        config.set("plugin", "alpha", 1.5).unwrap();
        assert_eq!(config.duplicates.threshold, 0.9);
        assert_eq!(config.structural.min_words, 2);
        assert_eq!(config.get("plugin", "alpha"), Some(1.5));
        assert!(config.set("structural", "min_words", 2.5).is_err());
        assert!(config.set("structural", "bogus", 1.0).is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_ranges() {
        let mut config = ThresholdsConfig::default();
        config.structural.min_words = 30;
        assert!(config.validate().unwrap_err().contains("min_words"));

        let mut config = ThresholdsConfig::default();
        config.domain.min_representation = 0.5;
        assert!(config.validate().unwrap_err().contains("min_representation"));

        let mut config = ThresholdsConfig::default();
        config.duplicates.threshold = 0.0;
        assert!(config.validate().is_err());

        let mut config = ThresholdsConfig::default();
        config.linguistic.min_readability = f64::NAN;
        assert!(config.validate().unwrap_err().contains("finite"));
    }
}
