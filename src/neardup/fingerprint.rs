//! Shingling and bottom-k sketches.
//!
//! A record's shingle set is hashed with xxh64 and kept sorted, so the
//! bottom-k MinHash sketch is simply its first `k` values. Two records
//! with a high resemblance share their smallest hashes with high
//! probability; each sketch value is used as one band key.

use xxhash_rust::xxh64::xxh64;

use crate::core::TextRecord;

const SHINGLE_SEED: u64 = 0x9e37_79b9_7f4a_7c15;
const TOKEN_SEED: u64 = 0xc2b2_ae3d_27d4_eb4f;
const CHAR_SEED: u64 = 0x1656_67b1_9e37_79f9;
/// Separates tokens inside a shingle so ("ab","c") and ("a","bc") differ
const TOKEN_SEPARATOR: u8 = 0x1f;

/// Lowercased tokens with surrounding punctuation stripped. Uses the
/// record's tokens when present, whitespace words otherwise.
pub fn normalized_tokens(record: &TextRecord) -> Vec<String> {
    let normalize = |token: &str| {
        token
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase()
    };
    let tokens: Vec<String> = match record.tokens() {
        Some(tokens) => tokens.iter().map(|t| normalize(t)).collect(),
        None => record.text().split_whitespace().map(normalize).collect(),
    };
    tokens.into_iter().filter(|t| !t.is_empty()).collect()
}

/// Sorted, deduplicated hashes of every contiguous `n`-token window.
/// Empty when there are fewer than `n` tokens.
pub fn shingle_hashes(tokens: &[String], n: usize) -> Vec<u64> {
    let n = n.max(1);
    if tokens.len() < n {
        return Vec::new();
    }
    let mut buf = Vec::new();
    let mut hashes: Vec<u64> = tokens
        .windows(n)
        .map(|window| {
            buf.clear();
            for (i, token) in window.iter().enumerate() {
                if i > 0 {
                    buf.push(TOKEN_SEPARATOR);
                }
                buf.extend_from_slice(token.as_bytes());
            }
            xxh64(&buf, SHINGLE_SEED)
        })
        .collect();
    hashes.sort_unstable();
    hashes.dedup();
    hashes
}

/// Sorted, deduplicated hashes of the distinct tokens.
pub fn token_hashes(tokens: &[String]) -> Vec<u64> {
    let mut hashes: Vec<u64> = tokens
        .iter()
        .map(|token| xxh64(token.as_bytes(), TOKEN_SEED))
        .collect();
    hashes.sort_unstable();
    hashes.dedup();
    hashes
}

/// Sorted, deduplicated hashes of every `n`-character window of `text`.
/// Text shorter than `n` characters hashes as a single window.
pub fn char_gram_hashes(text: &str, n: usize) -> Vec<u64> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return Vec::new();
    }
    let n = n.clamp(1, chars.len());
    let mut buf = String::new();
    let mut hashes: Vec<u64> = chars
        .windows(n)
        .map(|window| {
            buf.clear();
            buf.extend(window);
            xxh64(buf.as_bytes(), CHAR_SEED)
        })
        .collect();
    hashes.sort_unstable();
    hashes.dedup();
    hashes
}

/// The `k` smallest values of a sorted hash set.
pub fn bottom_k(sorted: &[u64], k: usize) -> &[u64] {
    &sorted[..sorted.len().min(k)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(text: &str) -> Vec<String> {
        text.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn test_shingle_count_and_dedup() {
        assert_eq!(shingle_hashes(&toks("a b a b"), 2).len(), 2);
        assert_eq!(shingle_hashes(&toks("a b c d"), 2).len(), 3);
        assert!(shingle_hashes(&toks("a"), 2).is_empty());
    }

    #[test]
    fn test_separator_distinguishes_boundaries() {
        assert_ne!(
            shingle_hashes(&toks("ab c"), 2),
            shingle_hashes(&toks("a bc"), 2)
        );
    }

    #[test]
    fn test_hashes_are_sorted() {
        let hashes = shingle_hashes(&toks("one two three four five six"), 2);
        assert!(hashes.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(bottom_k(&hashes, 3), &hashes[..3]);
        assert_eq!(bottom_k(&hashes, 99).len(), hashes.len());
    }

    #[test]
    fn test_char_grams() {
        assert_eq!(char_gram_hashes("color", 2).len(), 4);
        assert_eq!(char_gram_hashes("aaaa", 2).len(), 1);
        assert_eq!(char_gram_hashes("a", 2).len(), 1);
        assert!(char_gram_hashes("", 2).is_empty());
        let colour = char_gram_hashes("colour", 2);
        let shared = char_gram_hashes("color", 2)
            .iter()
            .filter(|h| colour.contains(h))
            .count();
        assert_eq!(shared, 3);
    }

    #[test]
    fn test_normalized_tokens_strip_punctuation() {
        let record = TextRecord::new("The cat, sat!  --", "general", "t", 0);
        assert_eq!(normalized_tokens(&record), vec!["the", "cat", "sat"]);
    }
}
