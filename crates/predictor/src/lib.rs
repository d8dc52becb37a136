//! Rating prediction for collaborative filtering.
//!
//! This crate provides:
//! - The `RatingPredictor` trait, the only contract the recommender relies on
//! - `LatentFactorModel`, a biased matrix factorization trained with SGD
//! - `ItemMeanPredictor`, a baseline that predicts each item's mean rating
//! - Held-out evaluation (`train_test_split`, `rmse`)
//!
//! ## Example Usage
//! ```ignore
//! use predictor::{FactorConfig, LatentFactorModel, RatingPredictor};
//!
//! let model = LatentFactorModel::train(catalog.ratings(), &FactorConfig::default())?;
//! let top = model.top_n(user_id, &catalog.item_ids(), 10);
//! ```

pub mod error;
pub mod evaluate;
pub mod model;
pub mod traits;

pub use error::{PredictorError, Result};
pub use evaluate::{rmse, train_test_split};
pub use model::{FactorConfig, ItemMeanPredictor, LatentFactorModel};
pub use traits::RatingPredictor;
