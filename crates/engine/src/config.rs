//! Engine configuration.
//!
//! Every knob has a default, so an empty JSON object is a valid config file.
//! Sections mirror the crates they feed: `vectorizer` goes to the content
//! crate, `factors` to the latent-factor model.

use crate::error::{RecommendError, Result};
use catalog::TextSource;
use content::{StopWordSet, VectorizerConfig};
use predictor::FactorConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// How `genre` picks among matches when no rating floor is given
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleMode {
    /// First n matches in catalog order
    #[default]
    Ordered,
    /// Uniform sample of n matches, reported in catalog order
    Random,
}

/// How `hybrid` combines the content and collaborative signals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HybridMode {
    /// Content results, then collaborative results, deduplicated
    #[default]
    Concat,
    /// Wide content pool re-sorted by mean observed rating
    Rerank,
}

/// Which rating predictor the context trains
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictorKind {
    #[default]
    LatentFactor,
    ItemMean,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Which item fields feed the vectorizer. When set, overrides the source
    /// each item was built with; when absent, item texts are used as stored.
    pub text_source: Option<TextSource>,
    pub vectorizer: VectorizerConfig,
    pub predictor: PredictorKind,
    pub factors: FactorConfig,
    pub sample_mode: SampleMode,
    /// Seed for `SampleMode::Random`; unseeded when absent
    pub sample_seed: Option<u64>,
    pub hybrid_mode: HybridMode,
    /// Rerank pool size as a multiple of n
    pub pool_multiplier: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            text_source: None,
            vectorizer: VectorizerConfig::default(),
            predictor: PredictorKind::default(),
            factors: FactorConfig::default(),
            sample_mode: SampleMode::default(),
            sample_seed: None,
            hybrid_mode: HybridMode::default(),
            pool_multiplier: 4,
        }
    }
}

impl EngineConfig {
    /// Load and validate a JSON config file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| RecommendError::ConfigIo {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.factors.validate()?;
        if self.vectorizer.min_token_len == 0 {
            return Err(RecommendError::InvalidArgument(
                "min_token_len must be > 0".into(),
            ));
        }
        if self.pool_multiplier == 0 {
            return Err(RecommendError::InvalidArgument(
                "pool_multiplier must be > 0".into(),
            ));
        }
        Ok(())
    }

    pub fn with_text_source(mut self, text_source: TextSource) -> Self {
        self.text_source = Some(text_source);
        self
    }

    pub fn with_stop_words(mut self, stop_words: StopWordSet) -> Self {
        self.vectorizer.stop_words = stop_words;
        self
    }

    pub fn with_min_token_len(mut self, min_token_len: usize) -> Self {
        self.vectorizer.min_token_len = min_token_len;
        self
    }

    pub fn with_strict_tokens(mut self, strict: bool) -> Self {
        self.vectorizer.strict_tokens = strict;
        self
    }

    pub fn with_predictor(mut self, predictor: PredictorKind) -> Self {
        self.predictor = predictor;
        self
    }

    pub fn with_factors(mut self, factors: FactorConfig) -> Self {
        self.factors = factors;
        self
    }

    pub fn with_sample_mode(mut self, mode: SampleMode) -> Self {
        self.sample_mode = mode;
        self
    }

    pub fn with_sample_seed(mut self, seed: u64) -> Self {
        self.sample_seed = Some(seed);
        self
    }

    pub fn with_hybrid_mode(mut self, mode: HybridMode) -> Self {
        self.hybrid_mode = mode;
        self
    }

    pub fn with_pool_multiplier(mut self, multiplier: usize) -> Self {
        self.pool_multiplier = multiplier;
        self
    }
}
