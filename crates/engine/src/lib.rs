//! Movie recommendation engine.
//!
//! Ties the catalog, content similarity, rating prediction and candidate
//! filters together behind one query surface.
//!
//! ## Example Usage
//! ```ignore
//! use engine::{EngineConfig, Recommender, RecommenderContext};
//!
//! let context = RecommenderContext::build(Arc::new(catalog), EngineConfig::default())?;
//! let recommender = Recommender::new(Arc::new(context));
//! let similar = recommender.content("Toy Story (1995)", 10)?;
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod recommender;

pub use config::{EngineConfig, HybridMode, PredictorKind, SampleMode};
pub use context::{LazyContext, RecommenderContext};
pub use error::{RecommendError, Result};
pub use recommender::{Recommendation, Recommender, Strategy, titles};
