//! In-memory fuzzy search over textured catalog records.
//!
//! Records are matched on their display name and block ID. Scores fall in
//! `0.0..=1.0`: exact matches first, then prefix, word-prefix, substring and
//! subsequence matches, then edit distance for typos.

use crate::types::BlockRecord;

/// A ranked search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit<'a> {
    pub score: f64,
    pub record: &'a BlockRecord,
}

#[derive(Debug, Clone)]
struct IndexedRecord {
    record: BlockRecord,
    name: String,
    id: String,
}

/// Fuzzy index over the textured subset of the catalog.
///
/// The index is always rebuilt as a whole; it is never patched.
#[derive(Debug, Clone)]
pub struct SearchIndex {
    entries: Vec<IndexedRecord>,
    threshold: f64,
    stale: bool,
}

impl Default for SearchIndex {
    fn default() -> Self {
        Self::new(0.4)
    }
}

impl SearchIndex {
    pub fn new(threshold: f64) -> Self {
        Self {
            entries: Vec::new(),
            threshold,
            stale: false,
        }
    }

    /// Remove every record.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Add records. Records without a texture are not indexed.
    pub fn extend<I: IntoIterator<Item = BlockRecord>>(&mut self, records: I) -> usize {
        let before = self.entries.len();
        self.entries.extend(
            records
                .into_iter()
                .filter(BlockRecord::has_texture)
                .map(|record| IndexedRecord {
                    name: normalize(record.display_name()),
                    id: normalize(&record.block_id),
                    record,
                }),
        );
        self.entries.len() - before
    }

    /// Replace the index contents and clear the stale flag.
    pub fn rebuild<I: IntoIterator<Item = BlockRecord>>(&mut self, records: I) -> usize {
        self.clear();
        let indexed = self.extend(records);
        self.stale = false;
        indexed
    }

    /// Drop all records and flag the index as out of date.
    pub fn mark_stale(&mut self) {
        self.clear();
        self.stale = true;
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ranked matches for `query`, best first. Equal scores keep index order.
    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchHit<'_>> {
        let query = normalize(query);
        if query.is_empty() {
            return Vec::new();
        }

        let mut hits: Vec<SearchHit<'_>> = self
            .entries
            .iter()
            .filter_map(|entry| {
                let score = match_score(&query, &entry.name).max(match_score(&query, &entry.id));
                (score >= self.threshold).then_some(SearchHit {
                    score,
                    record: &entry.record,
                })
            })
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(limit);
        hits
    }
}

/// Lowercase and turn separators into spaces, so `Oak Door` and `oak_door`
/// compare equal.
fn normalize(text: &str) -> String {
    text.trim()
        .chars()
        .map(|c| match c {
            '_' | '-' | ':' | '/' => ' ',
            c => c,
        })
        .flat_map(char::to_lowercase)
        .collect()
}

/// Score `query` against one normalized candidate string.
pub fn match_score(query: &str, candidate: &str) -> f64 {
    if query.is_empty() || candidate.is_empty() {
        return 0.0;
    }
    if query == candidate {
        return 1.0;
    }

    let coverage = query.chars().count() as f64 / candidate.chars().count().max(1) as f64;
    let coverage = coverage.min(1.0);

    if candidate.starts_with(query) {
        return 0.85 + 0.1 * coverage;
    }
    if candidate.split(' ').any(|word| word.starts_with(query)) {
        return 0.75 + 0.1 * coverage;
    }
    if candidate.contains(query) {
        return 0.65 + 0.1 * coverage;
    }
    if is_subsequence(query, candidate) {
        return 0.45 + 0.15 * coverage;
    }

    // Typos: best similarity against the whole candidate or any word
    let best = std::iter::once(candidate)
        .chain(candidate.split(' '))
        .filter(|word| !word.is_empty())
        .map(|word| similarity(query, word))
        .fold(0.0, f64::max);
    best * 0.7
}

fn is_subsequence(needle: &str, haystack: &str) -> bool {
    let mut haystack = haystack.chars();
    needle
        .chars()
        .filter(|c| *c != ' ')
        .all(|c| haystack.any(|h| h == c))
}

/// Normalized edit similarity, `1.0` for identical strings.
fn similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein_distance(a, b) as f64 / longest as f64
}

/// Levenshtein edit distance over chars.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != *cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}
