//! The rating-prediction seam.
//!
//! The recommender only depends on this contract, so any model that can
//! estimate a rating for an arbitrary (user, item) pair can be plugged in.

use catalog::{ItemId, UserId};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::HashSet;

/// Estimates ratings for (user, item) pairs.
///
/// `Send + Sync` so a trained model can be shared across query threads.
pub trait RatingPredictor: Send + Sync {
    /// Returns the name of this predictor (for logging/debugging)
    fn name(&self) -> &str;

    /// Estimated rating. Defined for every pair, including unseen users
    /// and items, which get an average-based fallback.
    fn predict(&self, user_id: UserId, item_id: ItemId) -> f32;

    /// Whether the user contributed to training
    fn knows_user(&self, user_id: UserId) -> bool;

    /// The `n` candidates with the highest estimate for `user_id`.
    ///
    /// Descending estimate, ties broken by ascending item id. Duplicate
    /// candidates are considered once.
    fn top_n(&self, user_id: UserId, candidates: &[ItemId], n: usize) -> Vec<ItemId> {
        if n == 0 {
            return Vec::new();
        }

        let mut seen = HashSet::new();
        let unique: Vec<ItemId> = candidates
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();

        let mut scored: Vec<(ItemId, f32)> = unique
            .par_iter()
            .map(|&item_id| (item_id, self.predict(user_id, item_id)))
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(n);
        scored.into_iter().map(|(item_id, _)| item_id).collect()
    }
}
