//! Term-frequency vectorization of item text.
//!
//! The vocabulary is built once from the catalog corpus, in sorted token
//! order, so the same corpus always yields the same column layout.

use crate::stopwords::{StopWordSet, StopWords};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Tokenization and vocabulary settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorizerConfig {
    /// Tokens shorter than this many characters are ignored
    pub min_token_len: usize,
    /// Only keep `[A-Za-z0-9]+` runs instead of any Unicode alphanumerics
    pub strict_tokens: bool,
    pub stop_words: StopWordSet,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            min_token_len: 2,
            strict_tokens: false,
            stop_words: StopWordSet::English,
        }
    }
}

/// Case-insensitive word splitter
#[derive(Debug, Clone)]
pub struct Tokenizer {
    min_len: usize,
    strict: bool,
}

impl Tokenizer {
    pub fn new(min_len: usize, strict: bool) -> Self {
        Self { min_len, strict }
    }

    /// Lowercased alphanumeric runs of at least `min_len` characters
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let strict = self.strict;
        text.split(|c: char| {
            if strict {
                !c.is_ascii_alphanumeric()
            } else {
                !c.is_alphanumeric()
            }
        })
        .filter(|t| !t.is_empty() && t.chars().count() >= self.min_len)
        .map(str::to_lowercase)
        .collect()
    }
}

/// Sparse vector with entries sorted by column
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    dim: usize,
    entries: Vec<(usize, f32)>,
}

impl SparseVector {
    /// Build from (column, value) pairs; duplicate columns are summed
    pub fn from_entries(dim: usize, entries: impl IntoIterator<Item = (usize, f32)>) -> Self {
        let mut acc: BTreeMap<usize, f32> = BTreeMap::new();
        for (col, value) in entries {
            if col < dim && value != 0.0 {
                *acc.entry(col).or_insert(0.0) += value;
            }
        }
        Self {
            dim,
            entries: acc.into_iter().collect(),
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Non-zero (column, value) pairs in column order
    pub fn entries(&self) -> &[(usize, f32)] {
        &self.entries
    }

    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dot(&self, other: &SparseVector) -> f32 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < self.entries.len() && j < other.entries.len() {
            let (ci, vi) = self.entries[i];
            let (cj, vj) = other.entries[j];
            if ci == cj {
                sum += vi * vj;
                i += 1;
                j += 1;
            } else if ci < cj {
                i += 1;
            } else {
                j += 1;
            }
        }
        sum
    }

    pub fn norm(&self) -> f32 {
        self.entries.iter().map(|(_, v)| v * v).sum::<f32>().sqrt()
    }

    /// Cosine similarity, 0.0 if either vector is all zeros
    pub fn cosine(&self, other: &SparseVector) -> f32 {
        let denom = self.norm() * other.norm();
        if denom <= f32::EPSILON {
            return 0.0;
        }
        (self.dot(other) / denom).clamp(0.0, 1.0)
    }
}

/// Bag-of-words vectorizer with a fixed, sorted vocabulary
#[derive(Debug, Clone)]
pub struct TextVectorizer {
    tokenizer: Tokenizer,
    stop_words: StopWords,
    vocabulary: BTreeMap<String, usize>,
}

impl TextVectorizer {
    pub fn new(config: &VectorizerConfig) -> Self {
        Self::with_parts(
            Tokenizer::new(config.min_token_len, config.strict_tokens),
            StopWords::from_set(config.stop_words),
        )
    }

    pub fn with_parts(tokenizer: Tokenizer, stop_words: StopWords) -> Self {
        Self {
            tokenizer,
            stop_words,
            vocabulary: BTreeMap::new(),
        }
    }

    /// Build the vocabulary from a corpus, replacing any previous one.
    ///
    /// A corpus with no usable tokens yields an empty vocabulary; every
    /// vector produced afterwards is then all zeros.
    pub fn fit<S: AsRef<str>>(&mut self, corpus: &[S]) -> usize {
        let terms: BTreeSet<String> = corpus
            .iter()
            .flat_map(|doc| self.terms(doc.as_ref()))
            .collect();

        self.vocabulary = terms
            .into_iter()
            .enumerate()
            .map(|(idx, term)| (term, idx))
            .collect();

        debug!(
            "Vocabulary built from {} documents: {} terms",
            corpus.len(),
            self.vocabulary.len()
        );
        self.vocabulary.len()
    }

    /// Term-frequency vector of `text` over the fitted vocabulary.
    ///
    /// Tokens outside the vocabulary are ignored.
    pub fn transform(&self, text: &str) -> SparseVector {
        let entries = self
            .terms(text)
            .into_iter()
            .filter_map(|term| self.vocabulary.get(&term).map(|&col| (col, 1.0)));
        SparseVector::from_entries(self.vocabulary.len(), entries)
    }

    pub fn fit_transform<S: AsRef<str>>(&mut self, corpus: &[S]) -> Vec<SparseVector> {
        self.fit(corpus);
        corpus.iter().map(|doc| self.transform(doc.as_ref())).collect()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Column index of a term
    pub fn column_of(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(&term.to_lowercase()).copied()
    }

    /// Vocabulary terms in column order
    pub fn terms_in_order(&self) -> Vec<&str> {
        self.vocabulary.keys().map(String::as_str).collect()
    }

    fn terms(&self, text: &str) -> Vec<String> {
        self.tokenizer
            .tokenize(text)
            .into_iter()
            .filter(|t| !self.stop_words.is_stop_word(t))
            .collect()
    }
}

impl Default for TextVectorizer {
    fn default() -> Self {
        Self::new(&VectorizerConfig::default())
    }
}
