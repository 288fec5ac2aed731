//! Sparse TF-IDF transform.
//!
//! Weights follow the usual smooth-idf scheme: `idf = ln((1 + n) / (1 + df)) + 1`,
//! `w = tf * idf` (or `(1 + ln tf) * idf` with `sublinear_tf`), rows L2-normalised.
//! The vocabulary is sorted, so column `i` is the `i`-th term in lexical order.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use localchat_core::config::TfidfConfig;
use localchat_core::error::{Error, Result};

use crate::analyzer::{build_analyzer, ngrams, tokenize};

/// `(column, weight)` pairs sorted by column, no duplicates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SparseVector {
    entries: Vec<(u32, f32)>,
}

impl SparseVector {
    pub fn from_sorted(entries: Vec<(u32, f32)>) -> Self { Self { entries } }

    pub fn entries(&self) -> &[(u32, f32)] { &self.entries }

    pub fn is_zero(&self) -> bool { self.entries.iter().all(|&(_, w)| w == 0.0) }

    pub fn norm(&self) -> f32 { self.entries.iter().map(|&(_, w)| w * w).sum::<f32>().sqrt() }

    pub fn dot(&self, other: &SparseVector) -> f32 {
        let (a, b) = (&self.entries, &other.entries);
        let (mut i, mut j, mut acc) = (0, 0, 0.0f32);
        while i < a.len() && j < b.len() {
            match a[i].0.cmp(&b[j].0) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => { acc += a[i].1 * b[j].1; i += 1; j += 1; }
            }
        }
        acc
    }

    /// Cosine similarity; a zero-magnitude side yields 0.
    pub fn cosine(&self, other: &SparseVector) -> f32 {
        let denom = self.norm() * other.norm();
        if denom == 0.0 { return 0.0; }
        self.dot(other) / denom
    }

    fn normalize(&mut self) {
        let norm = self.norm();
        if norm == 0.0 { return; }
        for (_, w) in &mut self.entries { *w /= norm; }
    }

    fn max_column(&self) -> Option<u32> { self.entries.last().map(|&(c, _)| c) }

    fn is_sorted_unique(&self) -> bool { self.entries.windows(2).all(|w| w[0].0 < w[1].0) }
}

/// Document-by-term weights, one row per unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseMatrix {
    pub n_cols: usize,
    pub rows: Vec<SparseVector>,
}

impl SparseMatrix {
    pub fn row_count(&self) -> usize { self.rows.len() }

    /// Every row sorted with columns in `0..n_cols`.
    pub fn validate(&self) -> Result<()> {
        for (i, row) in self.rows.iter().enumerate() {
            if !row.is_sorted_unique() {
                return Err(Error::ArtifactCorrupt(format!("matrix row {} is not sorted by column", i)));
            }
            if let Some(col) = row.max_column() {
                if col as usize >= self.n_cols {
                    return Err(Error::ArtifactCorrupt(format!("matrix row {} references column {} of {}", i, col, self.n_cols)));
                }
            }
        }
        Ok(())
    }
}

/// The fitted transform: analysis policy, vocabulary and per-term idf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    config: TfidfConfig,
    vocabulary: BTreeMap<String, u32>,
    idf: Vec<f32>,
}

impl TfidfVectorizer {
    /// Unfitted transform with an empty vocabulary; maps every text to zero.
    pub fn empty(config: &TfidfConfig) -> Self {
        Self { config: config.clone(), vocabulary: BTreeMap::new(), idf: Vec::new() }
    }

    pub fn fit_transform<S: AsRef<str>>(config: &TfidfConfig, docs: &[S]) -> (Self, SparseMatrix) {
        let counts: Vec<HashMap<String, u32>> = {
            let mut analyzer = build_analyzer(config.stop_words);
            docs.iter().map(|d| term_counts(&mut analyzer, config, d.as_ref())).collect()
        };
        let n_docs = docs.len();

        let mut df: HashMap<&str, usize> = HashMap::new();
        for doc in &counts {
            for term in doc.keys() { *df.entry(term.as_str()).or_default() += 1; }
        }
        let max_count = config.max_df.as_count(n_docs);
        let min_count = config.min_df.as_count(n_docs);
        let mut kept: Vec<(&str, usize)> = df
            .into_iter()
            .filter(|&(_, d)| (d as f64) <= max_count && (d as f64) >= min_count)
            .collect();
        kept.sort_unstable_by(|a, b| a.0.cmp(b.0));

        let mut vocabulary = BTreeMap::new();
        let mut idf = Vec::with_capacity(kept.len());
        for (col, (term, d)) in kept.into_iter().enumerate() {
            vocabulary.insert(term.to_string(), col as u32);
            idf.push(smooth_idf(n_docs, d));
        }

        let vectorizer = Self { config: config.clone(), vocabulary, idf };
        let rows = counts.iter().map(|c| vectorizer.weigh(c)).collect();
        let matrix = SparseMatrix { n_cols: vectorizer.vocabulary_len(), rows };
        (vectorizer, matrix)
    }

    /// Project `text` into the fitted space. Unknown terms are ignored.
    pub fn transform(&self, text: &str) -> SparseVector {
        if self.vocabulary.is_empty() { return SparseVector::default(); }
        let mut analyzer = build_analyzer(self.config.stop_words);
        self.weigh(&term_counts(&mut analyzer, &self.config, text))
    }

    pub fn vocabulary_len(&self) -> usize { self.vocabulary.len() }

    pub fn config(&self) -> &TfidfConfig { &self.config }

    pub fn column(&self, term: &str) -> Option<u32> { self.vocabulary.get(term).copied() }

    pub fn validate(&self) -> Result<()> {
        self.config.validate().map_err(|e| Error::ArtifactCorrupt(format!("stored analysis settings: {}", e)))?;
        if self.idf.len() != self.vocabulary.len() {
            return Err(Error::ArtifactCorrupt(format!("{} idf weights for {} terms", self.idf.len(), self.vocabulary.len())));
        }
        if self.vocabulary.values().any(|&c| c as usize >= self.idf.len()) {
            return Err(Error::ArtifactCorrupt("vocabulary column out of range".to_string()));
        }
        Ok(())
    }

    fn weigh(&self, counts: &HashMap<String, u32>) -> SparseVector {
        let mut entries: Vec<(u32, f32)> = counts
            .iter()
            .filter_map(|(term, &tf)| {
                let col = *self.vocabulary.get(term)?;
                let tf = if self.config.sublinear_tf { 1.0 + (tf as f32).ln() } else { tf as f32 };
                Some((col, tf * self.idf[col as usize]))
            })
            .collect();
        entries.sort_unstable_by_key(|&(c, _)| c);
        let mut v = SparseVector::from_sorted(entries);
        v.normalize();
        v
    }
}

fn term_counts(analyzer: &mut tantivy::tokenizer::TextAnalyzer, config: &TfidfConfig, text: &str) -> HashMap<String, u32> {
    let tokens = tokenize(analyzer, text);
    let mut counts = HashMap::new();
    for term in ngrams(&tokens, config.ngram_range) { *counts.entry(term).or_default() += 1; }
    counts
}

fn smooth_idf(n_docs: usize, df: usize) -> f32 {
    (((1 + n_docs) as f64 / (1 + df) as f64).ln() + 1.0) as f32
}
