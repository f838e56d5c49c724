use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// A sparse L2-normalized term-weight row, pairs sorted by term index.
pub type TermVector = Vec<(u32, f32)>;

/// TF-IDF vectorizer fitted over the indexed chunk corpus.
///
/// The fitted vocabulary and idf weights are persisted with the index and
/// reloaded with it, so queries against a reloaded index are always scored
/// with the same state that built it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    vocabulary: BTreeMap<String, u32>,
    idf: Vec<f32>,
}

pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|ch: char| !ch.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(|token| token.to_string())
        .collect()
}

impl TfidfVectorizer {
    /// Builds the vocabulary and smoothed idf weights from the corpus.
    /// Deterministic: vocabulary indices follow lexicographic term order.
    pub fn fit(corpus: &[String]) -> Self {
        let mut document_frequency: BTreeMap<String, u32> = BTreeMap::new();

        for document in corpus {
            let seen: HashSet<String> = tokenize(document).into_iter().collect();
            for token in seen {
                *document_frequency.entry(token).or_insert(0) += 1;
            }
        }

        let total = corpus.len() as f32;
        let mut vocabulary = BTreeMap::new();
        let mut idf = Vec::with_capacity(document_frequency.len());

        for (index, (term, df)) in document_frequency.into_iter().enumerate() {
            vocabulary.insert(term, index as u32);
            idf.push(((1.0 + total) / (1.0 + df as f32)).ln() + 1.0);
        }

        Self { vocabulary, idf }
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    /// Maps text to a normalized sparse row over the fitted vocabulary.
    /// Text with no recognized terms maps to the empty vector.
    pub fn transform(&self, text: &str) -> TermVector {
        let mut counts: BTreeMap<u32, f32> = BTreeMap::new();
        for token in tokenize(text) {
            if let Some(&index) = self.vocabulary.get(&token) {
                *counts.entry(index).or_insert(0.0) += 1.0;
            }
        }

        let mut row: TermVector = counts
            .into_iter()
            .map(|(index, tf)| (index, tf * self.idf[index as usize]))
            .collect();

        let magnitude = row
            .iter()
            .map(|(_, weight)| weight * weight)
            .sum::<f32>()
            .sqrt();
        if magnitude > 0.0 {
            for (_, weight) in &mut row {
                *weight /= magnitude;
            }
        }

        row
    }
}

/// Cosine similarity of two normalized sparse rows: their dot product.
/// Both operands are sorted by term index, so a single merge pass suffices.
pub fn cosine(left: &TermVector, right: &TermVector) -> f32 {
    let mut dot = 0.0f32;
    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
        match left[i].0.cmp(&right[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                dot += left[i].1 * right[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    dot
}
