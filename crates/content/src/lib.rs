//! # Content Crate
//!
//! Content-based similarity between catalog items.
//!
//! ## Components
//!
//! ### TextVectorizer
//! Turns each item's derived text into a sparse term-frequency vector over a
//! shared, sorted vocabulary. Stop words and short tokens are skipped.
//!
//! ### SimilarityIndex
//! Precomputes the symmetric cosine matrix over all item vectors and
//! answers nearest-neighbor queries by row, by title, or by free text.
//!
//! ## Example Usage
//!
//! ```ignore
//! use content::{SimilarityIndex, TextVectorizer, VectorizerConfig};
//!
//! let mut vectorizer = TextVectorizer::new(&VectorizerConfig::default());
//! let vectors = vectorizer.fit_transform(&catalog.texts());
//! let index = SimilarityIndex::build(vectors);
//!
//! let neighbors = index.query_by_title(&catalog, "Toy Story", 10)?;
//! ```

pub mod error;
pub mod similarity;
pub mod stopwords;
pub mod vectorizer;

pub use error::{ContentError, Result};
pub use similarity::{Neighbor, SimilarityIndex, resolve_title};
pub use stopwords::{StopWordSet, StopWords};
pub use vectorizer::{SparseVector, TextVectorizer, Tokenizer, VectorizerConfig};
