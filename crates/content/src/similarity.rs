//! Pairwise cosine similarity over item vectors.
//!
//! ## Algorithm
//! 1. Compute cosine(i, j) for every pair with j > i (rows in parallel)
//! 2. Mirror the upper triangle into the lower one
//! 3. Pin the diagonal to 1.0
//!
//! The matrix is dense, row-major and immutable once built, so it can be
//! shared across query threads behind an `Arc` without locking.

use crate::error::{ContentError, Result};
use crate::vectorizer::{SparseVector, TextVectorizer};
use catalog::Catalog;
use rayon::prelude::*;
use std::cmp::Ordering;
use tracing::{debug, info};

/// A ranked neighbor: catalog row index and its similarity score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub index: usize,
    pub score: f32,
}

/// Catalog row a user-supplied title resolves to, or `NotFound`
pub fn resolve_title(catalog: &Catalog, title: &str) -> Result<usize> {
    let index = catalog
        .resolve_title(title)
        .ok_or_else(|| ContentError::NotFound {
            title: title.to_string(),
        })?;
    debug!("Resolved '{}' to catalog row {}", title, index);
    Ok(index)
}

/// Precomputed cosine similarity matrix plus the vectors it was built from
#[derive(Debug, Clone)]
pub struct SimilarityIndex {
    n: usize,
    scores: Vec<f32>,
    vectors: Vec<SparseVector>,
}

impl SimilarityIndex {
    /// Build the full similarity matrix from item vectors in catalog order
    pub fn build(vectors: Vec<SparseVector>) -> Self {
        let n = vectors.len();

        let upper: Vec<Vec<f32>> = (0..n)
            .into_par_iter()
            .map(|i| {
                ((i + 1)..n)
                    .map(|j| vectors[i].cosine(&vectors[j]))
                    .collect()
            })
            .collect();

        let mut scores = vec![0.0; n * n];
        for (i, row) in upper.into_iter().enumerate() {
            scores[i * n + i] = 1.0;
            for (offset, score) in row.into_iter().enumerate() {
                let j = i + 1 + offset;
                scores[i * n + j] = score;
                scores[j * n + i] = score;
            }
        }

        info!("Similarity matrix built for {} items", n);
        Self { n, scores, vectors }
    }

    /// Number of items (rows) in the matrix
    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Similarity between two rows
    pub fn get(&self, i: usize, j: usize) -> Option<f32> {
        if i < self.n && j < self.n {
            Some(self.scores[i * self.n + j])
        } else {
            None
        }
    }

    /// Full similarity row for one item
    pub fn row(&self, i: usize) -> Option<&[f32]> {
        if i < self.n {
            Some(&self.scores[i * self.n..(i + 1) * self.n])
        } else {
            None
        }
    }

    /// Every other item ranked by similarity to `index`.
    ///
    /// Descending score, ties in catalog order. Empty for an invalid index.
    pub fn ranked(&self, index: usize) -> Vec<Neighbor> {
        let Some(row) = self.row(index) else {
            return Vec::new();
        };
        let neighbors = row
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != index)
            .map(|(j, &score)| Neighbor { index: j, score })
            .collect();
        sort_neighbors(neighbors)
    }

    /// The `k` items most similar to `index`, excluding itself
    pub fn query(&self, index: usize, k: usize) -> Vec<Neighbor> {
        if k == 0 {
            return Vec::new();
        }
        let mut neighbors = self.ranked(index);
        neighbors.truncate(k);
        neighbors
    }

    /// Resolve `title` through the catalog, then query its neighbors.
    ///
    /// Exact title first, then case-insensitive substring in catalog order.
    pub fn query_by_title(&self, catalog: &Catalog, title: &str, k: usize) -> Result<Vec<Neighbor>> {
        let index = resolve_title(catalog, title)?;
        Ok(self.query(index, k))
    }

    /// Rank every item against an ad-hoc text query
    pub fn query_text(&self, vectorizer: &TextVectorizer, text: &str, k: usize) -> Vec<Neighbor> {
        if k == 0 {
            return Vec::new();
        }
        let query = vectorizer.transform(text);
        let neighbors = self
            .vectors
            .iter()
            .enumerate()
            .map(|(j, v)| Neighbor {
                index: j,
                score: query.cosine(v),
            })
            .collect();
        let mut neighbors = sort_neighbors(neighbors);
        neighbors.truncate(k);
        neighbors
    }
}

/// Stable sort by descending score, so equal scores keep catalog order
fn sort_neighbors(mut neighbors: Vec<Neighbor>) -> Vec<Neighbor> {
    neighbors.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    neighbors
}
