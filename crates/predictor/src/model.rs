//! Latent-factor rating model trained with stochastic gradient descent.
//!
//! ## Model
//! rating(u, i) ≈ μ + b_u + b_i + p_u · q_i
//!
//! - μ: global mean rating
//! - b_u, b_i: user and item biases
//! - p_u, q_i: latent factor vectors of length `factors`
//!
//! ## Training
//! For each epoch, walk the ratings in log order and nudge every parameter
//! against the squared error, with L2 regularization `reg`. Factors are
//! initialized from a seeded RNG, so the same log and config always
//! produce the same model.

use crate::error::{PredictorError, Result};
use crate::traits::RatingPredictor;
use catalog::{ItemId, MAX_RATING, MIN_RATING, Rating, UserId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};

/// Hyperparameters for the latent-factor model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactorConfig {
    /// Latent dimension
    pub factors: usize,
    /// Passes over the rating log
    pub epochs: usize,
    /// Learning rate
    pub lr: f32,
    /// L2 regularization strength
    pub reg: f32,
    /// Seed for factor initialization
    pub seed: u64,
    /// Optional wall-clock limit on training
    pub time_budget_ms: Option<u64>,
}

impl Default for FactorConfig {
    fn default() -> Self {
        Self {
            factors: 50,
            epochs: 20,
            lr: 0.005,
            reg: 0.02,
            seed: 42,
            time_budget_ms: None,
        }
    }
}

impl FactorConfig {
    /// Reject hyperparameters that cannot train
    pub fn validate(&self) -> Result<()> {
        if self.factors == 0 {
            return Err(PredictorError::InvalidConfig("factors must be > 0".into()));
        }
        if self.epochs == 0 {
            return Err(PredictorError::InvalidConfig("epochs must be > 0".into()));
        }
        if !self.lr.is_finite() || self.lr <= 0.0 {
            return Err(PredictorError::InvalidConfig(format!(
                "lr must be a positive number, got {}",
                self.lr
            )));
        }
        if !self.reg.is_finite() || self.reg < 0.0 {
            return Err(PredictorError::InvalidConfig(format!(
                "reg must be a non-negative number, got {}",
                self.reg
            )));
        }
        Ok(())
    }
}

/// Trained latent-factor model. Immutable once built.
#[derive(Debug, Clone)]
pub struct LatentFactorModel {
    factors: usize,
    global_mean: f32,
    user_index: HashMap<UserId, usize>,
    item_index: HashMap<ItemId, usize>,
    user_bias: Vec<f32>,
    item_bias: Vec<f32>,
    /// Row-major [users x factors]
    user_factors: Vec<f32>,
    /// Row-major [items x factors]
    item_factors: Vec<f32>,
    train_rmse: f32,
}

impl LatentFactorModel {
    /// Fit a model to the rating log.
    ///
    /// Fails with `InsufficientData` on an empty log and `TrainingTimeout`
    /// when `time_budget_ms` elapses before the last epoch finishes.
    #[instrument(skip(ratings, config), fields(num_ratings = ratings.len(), factors = config.factors))]
    pub fn train(ratings: &[Rating], config: &FactorConfig) -> Result<Self> {
        config.validate()?;
        if ratings.is_empty() {
            return Err(PredictorError::InsufficientData(
                "rating log is empty".to_string(),
            ));
        }

        let start = Instant::now();
        let budget = config.time_budget_ms.map(Duration::from_millis);
        let k = config.factors;

        // Dense indices in first-seen order
        let mut user_index: HashMap<UserId, usize> = HashMap::new();
        let mut item_index: HashMap<ItemId, usize> = HashMap::new();
        for r in ratings {
            let next_user = user_index.len();
            user_index.entry(r.user_id).or_insert(next_user);
            let next_item = item_index.len();
            item_index.entry(r.item_id).or_insert(next_item);
        }
        let samples: Vec<(usize, usize, f32)> = ratings
            .iter()
            .map(|r| (user_index[&r.user_id], item_index[&r.item_id], r.value))
            .collect();

        let global_mean = ratings.iter().map(|r| r.value).sum::<f32>() / ratings.len() as f32;

        let mut rng = StdRng::seed_from_u64(config.seed);
        let init_scale = 0.1;
        let mut user_factors: Vec<f32> = (0..user_index.len() * k)
            .map(|_| rng.random_range(-init_scale..init_scale))
            .collect();
        let mut item_factors: Vec<f32> = (0..item_index.len() * k)
            .map(|_| rng.random_range(-init_scale..init_scale))
            .collect();
        let mut user_bias = vec![0.0f32; user_index.len()];
        let mut item_bias = vec![0.0f32; item_index.len()];

        let (lr, reg) = (config.lr, config.reg);
        let mut train_rmse = f32::NAN;

        for epoch in 0..config.epochs {
            let mut squared_error = 0.0f64;

            for &(u, i, value) in &samples {
                let pu = &user_factors[u * k..(u + 1) * k];
                let qi = &item_factors[i * k..(i + 1) * k];
                let dot: f32 = pu.iter().zip(qi).map(|(a, b)| a * b).sum();
                let err = value - (global_mean + user_bias[u] + item_bias[i] + dot);
                squared_error += f64::from(err * err);

                user_bias[u] += lr * (err - reg * user_bias[u]);
                item_bias[i] += lr * (err - reg * item_bias[i]);

                for f in 0..k {
                    let puf = user_factors[u * k + f];
                    let qif = item_factors[i * k + f];
                    user_factors[u * k + f] += lr * (err * qif - reg * puf);
                    item_factors[i * k + f] += lr * (err * puf - reg * qif);
                }
            }

            train_rmse = (squared_error / samples.len() as f64).sqrt() as f32;
            if !train_rmse.is_finite() {
                return Err(PredictorError::Diverged { epoch });
            }
            debug!("Epoch {} training RMSE {:.4}", epoch + 1, train_rmse);

            if let Some(budget) = budget {
                if start.elapsed() > budget {
                    return Err(PredictorError::TrainingTimeout {
                        budget_ms: budget.as_millis() as u64,
                        epochs_done: epoch + 1,
                    });
                }
            }
        }

        info!(
            "Trained latent-factor model on {} users x {} items in {:.2?} (RMSE {:.4})",
            user_index.len(),
            item_index.len(),
            start.elapsed(),
            train_rmse
        );

        Ok(Self {
            factors: k,
            global_mean,
            user_index,
            item_index,
            user_bias,
            item_bias,
            user_factors,
            item_factors,
            train_rmse,
        })
    }

    pub fn global_mean(&self) -> f32 {
        self.global_mean
    }

    /// RMSE over the training log after the final epoch
    pub fn train_rmse(&self) -> f32 {
        self.train_rmse
    }

    pub fn knows_item(&self, item_id: ItemId) -> bool {
        self.item_index.contains_key(&item_id)
    }

    /// (users, items) seen during training
    pub fn dimensions(&self) -> (usize, usize) {
        (self.user_index.len(), self.item_index.len())
    }

    fn raw_estimate(&self, user_id: UserId, item_id: ItemId) -> f32 {
        let k = self.factors;
        match (self.user_index.get(&user_id), self.item_index.get(&item_id)) {
            (Some(&u), Some(&i)) => {
                let dot: f32 = self.user_factors[u * k..(u + 1) * k]
                    .iter()
                    .zip(&self.item_factors[i * k..(i + 1) * k])
                    .map(|(a, b)| a * b)
                    .sum();
                self.global_mean + self.user_bias[u] + self.item_bias[i] + dot
            }
            // Cold start: fall back to the biases we do have
            (Some(&u), None) => self.global_mean + self.user_bias[u],
            (None, Some(&i)) => self.global_mean + self.item_bias[i],
            (None, None) => self.global_mean,
        }
    }
}

impl RatingPredictor for LatentFactorModel {
    fn name(&self) -> &str {
        "LatentFactorModel"
    }

    fn predict(&self, user_id: UserId, item_id: ItemId) -> f32 {
        self.raw_estimate(user_id, item_id)
            .clamp(MIN_RATING, MAX_RATING)
    }

    fn knows_user(&self, user_id: UserId) -> bool {
        self.user_index.contains_key(&user_id)
    }
}

/// Baseline predictor: an item's mean rating, else the global mean.
///
/// Useful as a cheap stand-in for the latent-factor model.
#[derive(Debug, Clone)]
pub struct ItemMeanPredictor {
    global_mean: f32,
    item_means: HashMap<ItemId, f32>,
    users: HashMap<UserId, u32>,
}

impl ItemMeanPredictor {
    pub fn train(ratings: &[Rating]) -> Result<Self> {
        if ratings.is_empty() {
            return Err(PredictorError::InsufficientData(
                "rating log is empty".to_string(),
            ));
        }

        let mut sums: HashMap<ItemId, (f32, u32)> = HashMap::new();
        let mut users: HashMap<UserId, u32> = HashMap::new();
        for r in ratings {
            let entry = sums.entry(r.item_id).or_insert((0.0, 0));
            entry.0 += r.value;
            entry.1 += 1;
            *users.entry(r.user_id).or_insert(0) += 1;
        }

        let global_mean = ratings.iter().map(|r| r.value).sum::<f32>() / ratings.len() as f32;
        let item_means = sums
            .into_iter()
            .map(|(id, (sum, count))| (id, sum / count as f32))
            .collect();

        Ok(Self {
            global_mean,
            item_means,
            users,
        })
    }
}

impl RatingPredictor for ItemMeanPredictor {
    fn name(&self) -> &str {
        "ItemMeanPredictor"
    }

    fn predict(&self, _user_id: UserId, item_id: ItemId) -> f32 {
        self.item_means
            .get(&item_id)
            .copied()
            .unwrap_or(self.global_mean)
    }

    fn knows_user(&self, user_id: UserId) -> bool {
        self.users.contains_key(&user_id)
    }
}
