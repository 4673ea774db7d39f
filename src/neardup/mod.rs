//! Near-duplicate detection over text records.
//!
//! Records are shingled into contiguous `shingle_size`-token windows and
//! sketched with bottom-k MinHash. Each sketch value is a band key; only
//! records sharing a band key are compared, so the number of comparisons
//! grows with bucket sizes rather than with the square of the corpus.
//!
//! Records with fewer tokens than `shingle_size` have no shingles. They
//! are scored with the configured [`ShortTextFallback`] and banded to
//! match it: by token set, or by character bigrams for edit distance.
//! Blank records never take part.
//!
//! Pairs are keyed by `(smaller id, larger id)`, so each unordered pair
//! appears once and the output does not depend on input order.

mod fingerprint;
mod similarity;

pub use fingerprint::{bottom_k, char_gram_hashes, normalized_tokens, shingle_hashes, token_hashes};
pub use similarity::{edit_similarity, intersection_size, SimilarityMeasure};

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::config::DuplicateThresholds;
use crate::core::{RecordId, TextRecord};

/// Character window used to band short records for edit distance
const CHAR_GRAM: usize = 2;

/// How records shorter than one shingle are compared.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortTextFallback {
    /// Configured measure over the distinct token sets
    #[default]
    TokenSet,
    /// Normalized character edit distance
    EditDistance,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NearDupConfig {
    pub shingle_size: usize,
    /// Sketch size; also the number of band keys per record
    pub num_hashes: usize,
    /// Pairs scoring at or above this are reported
    pub threshold: f64,
    pub measure: SimilarityMeasure,
    pub short_text: ShortTextFallback,
}

impl Default for NearDupConfig {
    fn default() -> Self {
        Self {
            shingle_size: 3,
            num_hashes: 4,
            threshold: 0.8,
            measure: SimilarityMeasure::default(),
            short_text: ShortTextFallback::default(),
        }
    }
}

impl NearDupConfig {
    pub fn from_thresholds(thresholds: &DuplicateThresholds) -> Self {
        Self {
            shingle_size: thresholds.shingle_size,
            num_hashes: thresholds.num_hashes,
            threshold: thresholds.threshold,
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NearDupPair {
    pub left: RecordId,
    pub right: RecordId,
    pub similarity: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NearDupStats {
    pub records: usize,
    /// Non-blank records
    pub eligible: usize,
    pub short_records: usize,
    pub buckets: usize,
    pub largest_bucket: usize,
    pub candidates_compared: usize,
}

/// Connected component of the near-duplicate graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NearDupCluster {
    pub members: Vec<RecordId>,
    pub max_similarity: f64,
    pub pair_count: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NearDupReport {
    pairs: Vec<NearDupPair>,
    stats: NearDupStats,
}

impl NearDupReport {
    /// Pairs sorted by `(left, right)`.
    pub fn pairs(&self) -> &[NearDupPair] {
        &self.pairs
    }

    pub fn stats(&self) -> &NearDupStats {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Order-insensitive membership test.
    pub fn contains(&self, a: &RecordId, b: &RecordId) -> bool {
        let (left, right) = if a <= b { (a, b) } else { (b, a) };
        self.pairs
            .binary_search_by(|p| (&p.left, &p.right).cmp(&(left, right)))
            .is_ok()
    }

    pub fn involved_records(&self) -> BTreeSet<&RecordId> {
        self.pairs
            .iter()
            .flat_map(|p| [&p.left, &p.right])
            .collect()
    }

    /// Groups records linked by any chain of pairs, largest cluster first.
    pub fn clusters(&self) -> Vec<NearDupCluster> {
        let ids: Vec<&RecordId> = self.involved_records().into_iter().collect();
        let index: BTreeMap<&RecordId, usize> =
            ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();

        let mut ds = DisjointSets::new(ids.len());
        for pair in &self.pairs {
            ds.union(index[&pair.left], index[&pair.right]);
        }

        let mut components: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for i in 0..ids.len() {
            let root = ds.find(i);
            components.entry(root).or_default().push(i);
        }

        let mut max_similarity: BTreeMap<usize, f64> = BTreeMap::new();
        let mut pair_count: BTreeMap<usize, usize> = BTreeMap::new();
        for pair in &self.pairs {
            let root = ds.find(index[&pair.left]);
            let entry = max_similarity.entry(root).or_insert(0.0);
            if pair.similarity > *entry {
                *entry = pair.similarity;
            }
            *pair_count.entry(root).or_insert(0) += 1;
        }

        let mut clusters: Vec<NearDupCluster> = components
            .into_iter()
            .map(|(root, members)| NearDupCluster {
                members: members.iter().map(|&i| ids[i].clone()).collect(),
                max_similarity: max_similarity.get(&root).copied().unwrap_or(0.0),
                pair_count: pair_count.get(&root).copied().unwrap_or(0),
            })
            .collect();

        clusters.sort_by(|a, b| {
            b.members
                .len()
                .cmp(&a.members.len())
                .then_with(|| a.members.cmp(&b.members))
        });
        clusters
    }
}

/// Path-compressed union-find with union by rank.
struct DisjointSets {
    parent: Vec<usize>,
    rank: Vec<usize>,
}

impl DisjointSets {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
    }
}

struct Sketch {
    id: RecordId,
    shingles: Vec<u64>,
    tokens: Vec<u64>,
    /// Character bigram hashes; empty unless edit distance is in use
    chars: Vec<u64>,
    /// Normalized text, for edit distance
    text: String,
}

impl Sketch {
    fn build(record: &TextRecord, config: &NearDupConfig) -> Option<Self> {
        if record.is_blank() {
            return None;
        }
        let tokens = normalized_tokens(record);
        if tokens.is_empty() {
            return None;
        }
        let text = tokens.join(" ");
        let chars = match config.short_text {
            ShortTextFallback::TokenSet => Vec::new(),
            ShortTextFallback::EditDistance => char_gram_hashes(&text, CHAR_GRAM),
        };
        Some(Self {
            id: record.id(),
            shingles: shingle_hashes(&tokens, config.shingle_size),
            tokens: token_hashes(&tokens),
            chars,
            text,
        })
    }

    fn is_short(&self) -> bool {
        self.shingles.is_empty()
    }
}

#[derive(Clone, Debug, Default)]
pub struct NearDupDetector {
    config: NearDupConfig,
}

impl NearDupDetector {
    pub fn new(config: NearDupConfig) -> Self {
        Self {
            config: NearDupConfig {
                shingle_size: config.shingle_size.max(1),
                num_hashes: config.num_hashes.max(1),
                ..config
            },
        }
    }

    pub fn config(&self) -> &NearDupConfig {
        &self.config
    }

    /// Reports every pair of banded candidates scoring at or above the threshold.
    pub fn detect(&self, records: &[TextRecord]) -> NearDupReport {
        let sketches = self.sketch(records);
        let k = self.config.num_hashes;
        let mut candidates: BTreeSet<(usize, usize)> = BTreeSet::new();

        let mut shingle_buckets: BTreeMap<u64, Vec<usize>> = BTreeMap::new();
        for (i, sketch) in sketches.iter().enumerate().filter(|(_, s)| !s.is_short()) {
            for &key in bottom_k(&sketch.shingles, k) {
                shingle_buckets.entry(key).or_default().push(i);
            }
        }
        for members in shingle_buckets.values() {
            for (pos, &a) in members.iter().enumerate() {
                for &b in &members[pos + 1..] {
                    candidates.insert((a, b));
                }
            }
        }

        // Short records are banded by their fallback keys and paired with
        // every bucket member; long/long pairs come from shingle buckets only.
        let mut short_buckets: BTreeMap<u64, Vec<usize>> = BTreeMap::new();
        if sketches.iter().any(Sketch::is_short) {
            for (i, sketch) in sketches.iter().enumerate() {
                for &key in bottom_k(self.short_band_keys(sketch), k) {
                    short_buckets.entry(key).or_default().push(i);
                }
            }
            for members in short_buckets.values() {
                for &s in members.iter().filter(|&&m| sketches[m].is_short()) {
                    for &other in members.iter().filter(|&&m| m != s) {
                        candidates.insert((s.min(other), s.max(other)));
                    }
                }
            }
        }

        let largest_bucket = shingle_buckets
            .values()
            .chain(short_buckets.values())
            .map(Vec::len)
            .max()
            .unwrap_or(0);

        let stats = NearDupStats {
            records: records.len(),
            eligible: sketches.len(),
            short_records: sketches.iter().filter(|s| s.is_short()).count(),
            buckets: shingle_buckets.len() + short_buckets.len(),
            largest_bucket,
            candidates_compared: candidates.len(),
        };
        let report = self.score(&sketches, candidates, stats);
        tracing::debug!(
            records = report.stats.records,
            candidates = report.stats.candidates_compared,
            pairs = report.pairs.len(),
            "near-duplicate detection finished"
        );
        report
    }

    /// Compares every pair of eligible records. Quadratic; intended as a
    /// baseline for small corpora and for measuring banding recall.
    pub fn detect_exhaustive(&self, records: &[TextRecord]) -> NearDupReport {
        let sketches = self.sketch(records);
        let n = sketches.len();
        let candidates: BTreeSet<(usize, usize)> = (0..n)
            .flat_map(|a| ((a + 1)..n).map(move |b| (a, b)))
            .collect();
        let stats = NearDupStats {
            records: records.len(),
            eligible: n,
            short_records: sketches.iter().filter(|s| s.is_short()).count(),
            buckets: 0,
            largest_bucket: 0,
            candidates_compared: candidates.len(),
        };
        self.score(&sketches, candidates, stats)
    }

    fn sketch(&self, records: &[TextRecord]) -> Vec<Sketch> {
        records
            .iter()
            .filter_map(|record| Sketch::build(record, &self.config))
            .collect()
    }

    fn short_band_keys<'a>(&self, sketch: &'a Sketch) -> &'a [u64] {
        match self.config.short_text {
            ShortTextFallback::TokenSet => &sketch.tokens,
            ShortTextFallback::EditDistance => &sketch.chars,
        }
    }

    fn similarity(&self, a: &Sketch, b: &Sketch) -> f64 {
        if !a.is_short() && !b.is_short() {
            return self.config.measure.score(&a.shingles, &b.shingles);
        }
        match self.config.short_text {
            ShortTextFallback::TokenSet => self.config.measure.score(&a.tokens, &b.tokens),
            ShortTextFallback::EditDistance => edit_similarity(&a.text, &b.text),
        }
    }

    fn score(
        &self,
        sketches: &[Sketch],
        candidates: BTreeSet<(usize, usize)>,
        stats: NearDupStats,
    ) -> NearDupReport {
        let mut pairs: BTreeMap<(RecordId, RecordId), f64> = BTreeMap::new();
        for (a, b) in candidates {
            let (left, right) = (&sketches[a], &sketches[b]);
            if left.id == right.id {
                tracing::warn!(record = %left.id, "skipping records sharing an id");
                continue;
            }
            let similarity = self.similarity(left, right);
            if similarity >= self.config.threshold {
                let key = if left.id < right.id {
                    (left.id.clone(), right.id.clone())
                } else {
                    (right.id.clone(), left.id.clone())
                };
                pairs.insert(key, similarity);
            }
        }

        NearDupReport {
            pairs: pairs
                .into_iter()
                .map(|((left, right), similarity)| NearDupPair {
                    left,
                    right,
                    similarity,
                })
                .collect(),
            stats,
        }
    }
}
