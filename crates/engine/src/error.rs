//! Error taxonomy for the recommendation engine.
//!
//! Lookup-style misses (unknown title, genre or user) do not reach callers
//! as errors: query methods return an empty list instead. What does
//! propagate is malformed input and construction-time failure.

use catalog::CatalogError;
use content::ContentError;
use predictor::PredictorError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecommendError {
    /// A title, genre or user has no match
    #[error("Not found: {0}")]
    NotFound(String),

    /// Training or indexing had nothing usable to work from
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Bad query argument or configuration value
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Model training ran past its wall-clock budget
    #[error("Training exceeded its {budget_ms} ms budget after {epochs_done} epochs")]
    TrainingTimeout { budget_ms: u64, epochs_done: usize },

    /// Model training produced non-finite loss
    #[error("Training diverged at epoch {epoch}")]
    TrainingDiverged { epoch: usize },

    /// Catalog ingestion or assembly failed
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Failed to read config file {path}: {source}")]
    ConfigIo {
        path: String,
        source: std::io::Error,
    },

    #[error("Malformed config file: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// A candidate filter failed
    #[error("Candidate pipeline failed: {0}")]
    Pipeline(#[from] anyhow::Error),
}

impl From<PredictorError> for RecommendError {
    fn from(err: PredictorError) -> Self {
        match err {
            PredictorError::InsufficientData(msg) => RecommendError::InsufficientData(msg),
            PredictorError::InvalidConfig(msg) => RecommendError::InvalidArgument(msg),
            PredictorError::Diverged { epoch } => RecommendError::TrainingDiverged { epoch },
            PredictorError::TrainingTimeout {
                budget_ms,
                epochs_done,
            } => RecommendError::TrainingTimeout {
                budget_ms,
                epochs_done,
            },
        }
    }
}

impl From<ContentError> for RecommendError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::NotFound { title } => {
                RecommendError::NotFound(format!("no item matches title '{}'", title))
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, RecommendError>;
