use serde::{Deserialize, Serialize};
use std::fmt;

/// Set resemblance measure used to score candidate pairs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMeasure {
    /// |A ∩ B| / |A ∪ B|
    Jaccard,
    /// 2|A ∩ B| / (|A| + |B|)
    #[default]
    Dice,
    /// |A ∩ B| / min(|A|, |B|)
    Overlap,
}

impl fmt::Display for SimilarityMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jaccard => write!(f, "jaccard"),
            Self::Dice => write!(f, "dice"),
            Self::Overlap => write!(f, "overlap"),
        }
    }
}

impl SimilarityMeasure {
    /// Scores two sorted, deduplicated sets. Empty input scores zero.
    pub fn score(self, a: &[u64], b: &[u64]) -> f64 {
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        let shared = intersection_size(a, b) as f64;
        match self {
            Self::Jaccard => shared / ((a.len() + b.len()) as f64 - shared),
            Self::Dice => 2.0 * shared / (a.len() + b.len()) as f64,
            Self::Overlap => shared / a.len().min(b.len()) as f64,
        }
    }
}

/// Size of the intersection of two sorted slices.
pub fn intersection_size(a: &[u64], b: &[u64]) -> usize {
    let (mut i, mut j, mut shared) = (0, 0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                shared += 1;
                i += 1;
                j += 1;
            }
        }
    }
    shared
}

/// 1 - levenshtein / max length, over chars.
pub fn edit_similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(&a, &b) as f64 / longest as f64
}

fn levenshtein(a: &[char], b: &[char]) -> usize {
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measures_on_two_of_three() {
        let a = [1, 2];
        let b = [1, 2, 3];
        assert!((SimilarityMeasure::Jaccard.score(&a, &b) - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(SimilarityMeasure::Dice.score(&a, &b), 0.8);
        assert_eq!(SimilarityMeasure::Overlap.score(&a, &b), 1.0);
    }

    #[test]
    fn test_identical_and_disjoint() {
        for measure in [SimilarityMeasure::Jaccard, SimilarityMeasure::Dice, SimilarityMeasure::Overlap] {
            assert_eq!(measure.score(&[4, 5], &[4, 5]), 1.0);
            assert_eq!(measure.score(&[4, 5], &[6]), 0.0);
            assert_eq!(measure.score(&[], &[6]), 0.0);
        }
    }

    #[test]
    fn test_edit_similarity() {
        assert_eq!(edit_similarity("", ""), 1.0);
        assert_eq!(edit_similarity("chat", "chat"), 1.0);
        assert!((edit_similarity("chat", "chats") - 0.8).abs() < 1e-12);
        assert_eq!(levenshtein(&['a', 'b', 'c'], &['x', 'b']), 2);
    }
}
