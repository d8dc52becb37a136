//! Held-out evaluation helpers.
//!
//! The caller decides whether to split; training itself always uses every
//! rating it is given.

use crate::error::{PredictorError, Result};
use crate::traits::RatingPredictor;
use catalog::Rating;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rayon::prelude::*;

/// Shuffle the log with a seeded RNG and split off `test_ratio` of it.
///
/// Returns `(train, test)`.
pub fn train_test_split(
    ratings: &[Rating],
    test_ratio: f32,
    seed: u64,
) -> Result<(Vec<Rating>, Vec<Rating>)> {
    if !(0.0..1.0).contains(&test_ratio) {
        return Err(PredictorError::InvalidConfig(format!(
            "test_ratio must be in [0, 1), got {}",
            test_ratio
        )));
    }

    let mut shuffled = ratings.to_vec();
    let mut rng = StdRng::seed_from_u64(seed);
    shuffled.shuffle(&mut rng);

    let test_len = (shuffled.len() as f32 * test_ratio).round() as usize;
    let test = shuffled.split_off(shuffled.len() - test_len);
    Ok((shuffled, test))
}

/// Root-mean-square error of `predictor` over `ratings`, `None` if empty
pub fn rmse<P: RatingPredictor + ?Sized>(predictor: &P, ratings: &[Rating]) -> Option<f32> {
    if ratings.is_empty() {
        return None;
    }
    let squared: f64 = ratings
        .par_iter()
        .map(|r| {
            let err = f64::from(predictor.predict(r.user_id, r.item_id) - r.value);
            err * err
        })
        .sum();
    Some((squared / ratings.len() as f64).sqrt() as f32)
}
