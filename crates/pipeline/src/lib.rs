//! Candidate filtering for catalog-driven recommendation strategies.
//!
//! This crate provides:
//! - `Candidate`, a catalog row travelling through the pipeline
//! - Filter trait and implementations for candidate filtering
//! - FilterPipeline for composing filters
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{Candidate, FilterPipeline};
//! use pipeline::filters::*;
//!
//! let pipeline = FilterPipeline::new()
//!     .add_filter(GenreFilter::new("Comedy"))
//!     .add_filter(MinimumRatingFilter::new(3.5));
//!
//! let kept = pipeline.apply(Candidate::all(&catalog), &catalog)?;
//! ```

pub mod candidate;
pub mod filter_pipeline;
pub mod filters;
pub mod traits;

// Re-export main types
pub use candidate::Candidate;
pub use filter_pipeline::FilterPipeline;
pub use traits::Filter;
