//! # Recommender Context
//!
//! Everything a query needs, built once and read-only afterwards:
//! 1. The catalog (items + rating log)
//! 2. A fitted vectorizer and the item similarity matrix
//! 3. A trained rating predictor
//!
//! The context is shared behind an `Arc` and never mutated, so any number
//! of query threads can read it without locking. `LazyContext` defers the
//! build to first use and guarantees it runs at most once.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use catalog::Catalog;
use content::{SimilarityIndex, TextVectorizer};
use predictor::{ItemMeanPredictor, LatentFactorModel, RatingPredictor};
use tracing::{info, instrument};

use crate::config::{EngineConfig, PredictorKind};
use crate::error::{RecommendError, Result};

pub struct RecommenderContext {
    catalog: Arc<Catalog>,
    vectorizer: TextVectorizer,
    similarity: SimilarityIndex,
    predictor: Arc<dyn RatingPredictor>,
    config: EngineConfig,
}

impl RecommenderContext {
    /// Vectorize the catalog, build the similarity matrix and train the
    /// predictor selected by `config.predictor`.
    ///
    /// Fails with `InsufficientData` on an empty catalog or rating log.
    #[instrument(skip_all, fields(items = catalog.len(), ratings = catalog.ratings().len()))]
    pub fn build(catalog: Arc<Catalog>, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let start = Instant::now();

        let predictor: Arc<dyn RatingPredictor> = match config.predictor {
            PredictorKind::LatentFactor => {
                let model = LatentFactorModel::train(catalog.ratings(), &config.factors)?;
                info!(
                    "Trained latent-factor model: train RMSE {:.4}",
                    model.train_rmse()
                );
                Arc::new(model)
            }
            PredictorKind::ItemMean => Arc::new(ItemMeanPredictor::train(catalog.ratings())?),
        };

        let context = Self::with_predictor(catalog, config, predictor)?;
        info!("Recommender context ready in {:.2?}", start.elapsed());
        Ok(context)
    }

    /// Assemble a context around an already-trained predictor
    pub fn with_predictor(
        catalog: Arc<Catalog>,
        config: EngineConfig,
        predictor: Arc<dyn RatingPredictor>,
    ) -> Result<Self> {
        config.validate()?;
        if catalog.is_empty() {
            return Err(RecommendError::InsufficientData(
                "catalog has no items".to_string(),
            ));
        }

        let mut vectorizer = TextVectorizer::new(&config.vectorizer);
        let vectors = match config.text_source {
            Some(source) => vectorizer.fit_transform(&catalog.texts_for(source)),
            None => vectorizer.fit_transform(&catalog.texts()),
        };
        info!(
            "Vectorized {} items over {} terms",
            vectors.len(),
            vectorizer.vocabulary_size()
        );

        let similarity = SimilarityIndex::build(vectors);

        Ok(Self {
            catalog,
            vectorizer,
            similarity,
            predictor,
            config,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn vectorizer(&self) -> &TextVectorizer {
        &self.vectorizer
    }

    pub fn similarity(&self) -> &SimilarityIndex {
        &self.similarity
    }

    pub fn predictor(&self) -> &dyn RatingPredictor {
        self.predictor.as_ref()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

/// Build-on-first-use wrapper around a context builder.
///
/// Concurrent callers block on the same mutex, so at most one build runs and
/// every caller receives the same `Arc`. A failed build is not cached; the
/// next call tries again.
pub struct LazyContext<F> {
    builder: F,
    slot: Mutex<Option<Arc<RecommenderContext>>>,
}

impl<F> LazyContext<F>
where
    F: Fn() -> Result<RecommenderContext>,
{
    pub fn new(builder: F) -> Self {
        Self {
            builder,
            slot: Mutex::new(None),
        }
    }

    pub fn get(&self) -> Result<Arc<RecommenderContext>> {
        let mut slot = self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(context) = slot.as_ref() {
            return Ok(Arc::clone(context));
        }

        let context = Arc::new((self.builder)()?);
        *slot = Some(Arc::clone(&context));
        Ok(context)
    }

    pub fn is_built(&self) -> bool {
        self.slot
            .lock()
            .map(|slot| slot.is_some())
            .unwrap_or_else(|poisoned| poisoned.into_inner().is_some())
    }
}
