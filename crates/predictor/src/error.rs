//! Error types for rating prediction.

use thiserror::Error;

/// Errors raised while configuring or training a predictor.
///
/// Prediction itself never fails; only construction does.
#[derive(Error, Debug)]
pub enum PredictorError {
    /// Nothing (or nothing usable) to train on
    #[error("Insufficient training data: {0}")]
    InsufficientData(String),

    /// A hyperparameter is out of range
    #[error("Invalid predictor configuration: {0}")]
    InvalidConfig(String),

    /// Training loss stopped being finite
    #[error("Training diverged at epoch {epoch}; try a smaller learning rate")]
    Diverged { epoch: usize },

    /// Training exceeded its wall-clock budget
    #[error("Training exceeded its {budget_ms} ms budget after {epochs_done} epochs")]
    TrainingTimeout { budget_ms: u64, epochs_done: usize },
}

pub type Result<T> = std::result::Result<T, PredictorError>;
