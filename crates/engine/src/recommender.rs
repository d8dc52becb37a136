//! # Recommender
//!
//! The query surface over a built `RecommenderContext`:
//! - `content`: nearest neighbors in the item similarity matrix
//! - `genre`: genre match, optionally floored and ranked by mean rating
//! - `collaborative`: top predicted ratings for a user
//! - `hybrid`: content combined with collaborative or rating signals
//! - `popular`: most-rated items
//! - `similar_to_text`: neighbors of a free-text query
//!
//! Misses (unknown title, genre or user) come back as an empty list.
//! Only malformed arguments are errors.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use catalog::{Catalog, ItemId, UserId};
use pipeline::filters::{GenreFilter, MinimumRatingFilter};
use pipeline::{Candidate, FilterPipeline};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::config::{HybridMode, SampleMode};
use crate::context::RecommenderContext;
use crate::error::{RecommendError, Result};

/// Which strategy produced a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Content,
    Genre,
    Collaborative,
    Hybrid,
    Popular,
}

/// One ranked result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub item_id: ItemId,
    pub title: String,
    /// Similarity, predicted rating or mean rating, depending on `strategy`
    pub score: f32,
    pub strategy: Strategy,
}

/// Titles of `recommendations`, in order
pub fn titles(recommendations: &[Recommendation]) -> Vec<String> {
    recommendations.iter().map(|r| r.title.clone()).collect()
}

#[derive(Clone)]
pub struct Recommender {
    context: Arc<RecommenderContext>,
}

impl Recommender {
    pub fn new(context: Arc<RecommenderContext>) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &RecommenderContext {
        &self.context
    }

    /// Items most similar to `title`, most similar first.
    ///
    /// The title resolves exactly, then by case-insensitive substring.
    /// Items sharing the resolved item's title are never returned.
    #[instrument(skip(self))]
    pub fn content(&self, title: &str, n: usize) -> Result<Vec<Recommendation>> {
        check_n(n)?;
        let catalog = self.context.catalog();

        let source = match self.resolve(title) {
            Ok(source) => source,
            Err(RecommendError::NotFound(reason)) => {
                info!("{}", reason);
                return Ok(Vec::new());
            }
            Err(err) => return Err(err),
        };
        let source_title = catalog
            .item_at(source)
            .map(|item| item.title())
            .unwrap_or_default();
        debug!("Resolved '{}' to '{}'", title, source_title);

        let recommendations: Vec<Recommendation> = self
            .context
            .similarity()
            .ranked(source)
            .into_iter()
            .filter_map(|neighbor| {
                let item = catalog.item_at(neighbor.index)?;
                (item.title() != source_title).then(|| Recommendation {
                    item_id: item.id,
                    title: item.title().to_string(),
                    score: neighbor.score,
                    strategy: Strategy::Content,
                })
            })
            .take(n)
            .collect();

        info!("Content query returned {} items", recommendations.len());
        Ok(recommendations)
    }

    /// Items tagged with `genre` (case-insensitive).
    ///
    /// With `min_avg_rating`, only items whose mean rating reaches the floor
    /// are kept (unrated items count as 0.0), ranked by mean rating
    /// descending with ties in catalog order. Without it, `sample_mode`
    /// picks either the first n matches or a uniform sample of n.
    #[instrument(skip(self))]
    pub fn genre(
        &self,
        genre: &str,
        n: usize,
        min_avg_rating: Option<f32>,
    ) -> Result<Vec<Recommendation>> {
        check_n(n)?;
        if let Some(floor) = min_avg_rating {
            if !floor.is_finite() || floor < 0.0 {
                return Err(RecommendError::InvalidArgument(format!(
                    "min_avg_rating must be a non-negative number, got {}",
                    floor
                )));
            }
        }
        if genre.trim().is_empty() {
            return Ok(Vec::new());
        }

        let catalog = self.context.catalog();
        let mut pipeline = FilterPipeline::new().add_filter(GenreFilter::new(genre.trim()));
        if let Some(floor) = min_avg_rating {
            pipeline = pipeline.add_filter(MinimumRatingFilter::new(floor));
        }
        let matches = pipeline.apply(Candidate::all(catalog), catalog)?;
        debug!("{} items match genre '{}'", matches.len(), genre);

        let selected = match min_avg_rating {
            Some(_) => {
                let mut ranked = matches;
                ranked.sort_by(|a, b| {
                    catalog
                        .mean_rating(b.item_id)
                        .partial_cmp(&catalog.mean_rating(a.item_id))
                        .unwrap_or(Ordering::Equal)
                });
                ranked.truncate(n);
                ranked
            }
            None => self.sample(matches, n),
        };

        let recommendations = self.to_recommendations(catalog, &selected, Strategy::Genre, |c| {
            catalog.mean_rating(c.item_id)
        });
        info!("Genre query returned {} items", recommendations.len());
        Ok(recommendations)
    }

    /// Items with the highest predicted rating for `user_id`.
    ///
    /// Users the predictor never saw get an empty list. A title that repeats
    /// under another id is listed once, at its best-ranked position.
    #[instrument(skip(self))]
    pub fn collaborative(&self, user_id: UserId, n: usize) -> Result<Vec<Recommendation>> {
        check_n(n)?;
        let predictor = self.context.predictor();
        if !predictor.knows_user(user_id) {
            info!("User {} has no ratings", user_id);
            return Ok(Vec::new());
        }

        let catalog = self.context.catalog();
        let item_ids = catalog.item_ids();
        let mut seen = HashSet::new();
        let recommendations: Vec<Recommendation> = predictor
            .top_n(user_id, &item_ids, item_ids.len())
            .into_iter()
            .filter_map(|item_id| {
                let item = catalog.get_item(item_id)?;
                Some(Recommendation {
                    item_id,
                    title: item.title().to_string(),
                    score: predictor.predict(user_id, item_id),
                    strategy: Strategy::Collaborative,
                })
            })
            .filter(|r| seen.insert(r.title.clone()))
            .take(n)
            .collect();

        info!(
            "Collaborative query via {} returned {} items",
            predictor.name(),
            recommendations.len()
        );
        Ok(recommendations)
    }

    /// Content neighbors of `title` merged with the user's signal.
    ///
    /// `concat` appends collaborative results after content results and
    /// drops repeated titles. `rerank` widens the content pool to
    /// `pool_multiplier * n` and re-sorts it by mean observed rating.
    /// An unresolvable title yields an empty list in both modes.
    #[instrument(skip(self))]
    pub fn hybrid(&self, title: &str, user_id: UserId, n: usize) -> Result<Vec<Recommendation>> {
        check_n(n)?;

        let mut merged = match self.context.config().hybrid_mode {
            HybridMode::Concat => {
                let content = self.content(title, n)?;
                if content.is_empty() {
                    return Ok(Vec::new());
                }
                let collaborative = self.collaborative(user_id, n)?;

                let mut seen = HashSet::new();
                let mut merged: Vec<Recommendation> = content
                    .into_iter()
                    .chain(collaborative)
                    .filter(|r| seen.insert(r.title.clone()))
                    .collect();
                merged.truncate(n);
                merged
            }
            HybridMode::Rerank => {
                let pool_size = n.saturating_mul(self.context.config().pool_multiplier);
                let mut pool = self.content(title, pool_size)?;
                if pool.is_empty() {
                    return Ok(Vec::new());
                }

                let catalog = self.context.catalog();
                for candidate in &mut pool {
                    candidate.score = catalog.mean_rating(candidate.item_id);
                }
                pool.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
                pool.truncate(n);
                pool
            }
        };

        for recommendation in &mut merged {
            recommendation.strategy = Strategy::Hybrid;
        }
        info!("Hybrid query returned {} items", merged.len());
        Ok(merged)
    }

    /// Most-rated items; ties by mean rating, then catalog order
    #[instrument(skip(self))]
    pub fn popular(&self, n: usize) -> Result<Vec<Recommendation>> {
        check_n(n)?;
        let catalog = self.context.catalog();

        let mut ranked = Candidate::all(catalog);
        ranked.sort_by(|a, b| {
            catalog
                .rating_count(b.item_id)
                .cmp(&catalog.rating_count(a.item_id))
                .then_with(|| {
                    catalog
                        .mean_rating(b.item_id)
                        .partial_cmp(&catalog.mean_rating(a.item_id))
                        .unwrap_or(Ordering::Equal)
                })
        });
        ranked.truncate(n);

        Ok(self.to_recommendations(catalog, &ranked, Strategy::Popular, |c| {
            catalog.rating_count(c.item_id) as f32
        }))
    }

    /// Items most similar to free text. Items sharing no term are left out.
    #[instrument(skip(self))]
    pub fn similar_to_text(&self, text: &str, n: usize) -> Result<Vec<Recommendation>> {
        check_n(n)?;
        let catalog = self.context.catalog();

        let recommendations = self
            .context
            .similarity()
            .query_text(self.context.vectorizer(), text, n)
            .into_iter()
            .filter(|neighbor| neighbor.score > 0.0)
            .filter_map(|neighbor| {
                let item = catalog.item_at(neighbor.index)?;
                Some(Recommendation {
                    item_id: item.id,
                    title: item.title().to_string(),
                    score: neighbor.score,
                    strategy: Strategy::Content,
                })
            })
            .collect();
        Ok(recommendations)
    }

    /// Catalog row `title` resolves to
    fn resolve(&self, title: &str) -> Result<usize> {
        Ok(content::resolve_title(self.context.catalog(), title)?)
    }

    /// Pick n of `matches` according to the configured sample mode.
    /// Output stays in catalog order either way.
    fn sample(&self, matches: Vec<Candidate>, n: usize) -> Vec<Candidate> {
        if matches.len() <= n {
            return matches;
        }
        match self.context.config().sample_mode {
            SampleMode::Ordered => matches.into_iter().take(n).collect(),
            SampleMode::Random => {
                let mut rng = match self.context.config().sample_seed {
                    Some(seed) => StdRng::seed_from_u64(seed),
                    None => StdRng::from_os_rng(),
                };
                let mut picked = rand::seq::index::sample(&mut rng, matches.len(), n).into_vec();
                picked.sort_unstable();
                picked.into_iter().map(|i| matches[i]).collect()
            }
        }
    }

    fn to_recommendations(
        &self,
        catalog: &Catalog,
        candidates: &[Candidate],
        strategy: Strategy,
        score: impl Fn(&Candidate) -> f32,
    ) -> Vec<Recommendation> {
        candidates
            .iter()
            .filter_map(|candidate| {
                let item = catalog.item_at(candidate.index)?;
                Some(Recommendation {
                    item_id: item.id,
                    title: item.title().to_string(),
                    score: score(candidate),
                    strategy,
                })
            })
            .collect()
    }
}

fn check_n(n: usize) -> Result<()> {
    if n == 0 {
        return Err(RecommendError::InvalidArgument(
            "n must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use catalog::{Item, Rating, TextSource};
    use predictor::ItemMeanPredictor;

    fn recommender(config: EngineConfig) -> Recommender {
        let items = vec![
            Item::new(1, "Toy Story", ["Animation", "Comedy"], "", TextSource::Genres),
            Item::new(2, "Heat", ["Action", "Crime"], "", TextSource::Genres),
            Item::new(3, "Jumanji", ["Adventure", "Comedy"], "", TextSource::Genres),
            Item::new(4, "Casino", ["Crime", "Drama"], "", TextSource::Genres),
            Item::new(5, "Balto", ["Animation", "Adventure"], "", TextSource::Genres),
        ];
        let ratings = vec![
            Rating { user_id: 1, item_id: 1, value: 5.0, timestamp: 0 },
            Rating { user_id: 1, item_id: 2, value: 2.0, timestamp: 0 },
            Rating { user_id: 2, item_id: 1, value: 4.0, timestamp: 0 },
            Rating { user_id: 2, item_id: 3, value: 4.5, timestamp: 0 },
            Rating { user_id: 3, item_id: 4, value: 3.0, timestamp: 0 },
        ];
        build(items, ratings, config)
    }

    fn build(items: Vec<Item>, ratings: Vec<Rating>, config: EngineConfig) -> Recommender {
        let catalog = Arc::new(Catalog::from_parts(items, ratings).unwrap());
        let predictor = Arc::new(ItemMeanPredictor::train(catalog.ratings()).unwrap());
        let context = RecommenderContext::with_predictor(catalog, config, predictor).unwrap();
        Recommender::new(Arc::new(context))
    }

    #[test]
    fn test_zero_n_is_invalid() {
        let rec = recommender(EngineConfig::default());
        assert!(matches!(rec.content("Heat", 0), Err(RecommendError::InvalidArgument(_))));
        assert!(matches!(rec.genre("Crime", 0, None), Err(RecommendError::InvalidArgument(_))));
        assert!(matches!(rec.collaborative(1, 0), Err(RecommendError::InvalidArgument(_))));
        assert!(matches!(rec.hybrid("Heat", 1, 0), Err(RecommendError::InvalidArgument(_))));
        assert!(matches!(rec.popular(0), Err(RecommendError::InvalidArgument(_))));
    }

    #[test]
    fn test_content_substring_resolution() {
        let rec = recommender(EngineConfig::default());
        let result = titles(&rec.content("toy", 1).unwrap());
        // Toy Story shares "Animation" with Balto and "Comedy" with Jumanji; Balto comes later
        assert_eq!(result, vec!["Jumanji"]);
    }

    #[test]
    fn test_genre_with_floor_ranks_by_mean() {
        let rec = recommender(EngineConfig::default());
        // Both comedies average 4.5, so catalog order decides
        let result = titles(&rec.genre("comedy", 5, Some(0.0)).unwrap());
        assert_eq!(result, vec!["Toy Story", "Jumanji"]);

        let adventure = titles(&rec.genre("Adventure", 5, Some(0.0)).unwrap());
        assert_eq!(adventure, vec!["Jumanji", "Balto"]);

        let floored = titles(&rec.genre("Crime", 5, Some(2.5)).unwrap());
        assert_eq!(floored, vec!["Casino"]);
    }

    #[test]
    fn test_genre_matches_non_ascii_case_insensitively() {
        let items = vec![
            Item::new(1, "Amélie", ["Comédie"], "", TextSource::Genres),
            Item::new(2, "Heat", ["Crime"], "", TextSource::Genres),
        ];
        let ratings = vec![Rating { user_id: 1, item_id: 1, value: 4.0, timestamp: 0 }];
        let rec = build(items, ratings, EngineConfig::default());

        assert_eq!(titles(&rec.genre("COMÉDIE", 5, None).unwrap()), vec!["Amélie"]);
        assert_eq!(titles(&rec.genre("comédie", 5, Some(3.0)).unwrap()), vec!["Amélie"]);
    }

    #[test]
    fn test_genre_rejects_negative_floor() {
        let rec = recommender(EngineConfig::default());
        assert!(matches!(
            rec.genre("Crime", 5, Some(-1.0)),
            Err(RecommendError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_genre_ordered_sample_takes_head() {
        let rec = recommender(EngineConfig::default());
        let result = titles(&rec.genre("Animation", 1, None).unwrap());
        assert_eq!(result, vec!["Toy Story"]);
    }

    #[test]
    fn test_genre_random_sample_is_subset_in_catalog_order() {
        let config = EngineConfig::default()
            .with_sample_mode(SampleMode::Random)
            .with_sample_seed(11);
        let rec = recommender(config);

        let first = rec.genre("Adventure", 1, None).unwrap();
        assert_eq!(first.len(), 1);
        assert!(first[0].title == "Jumanji" || first[0].title == "Balto");

        // Seeded sampling repeats
        assert_eq!(first, rec.genre("Adventure", 1, None).unwrap());
    }

    #[test]
    fn test_blank_genre_is_empty() {
        let rec = recommender(EngineConfig::default());
        assert!(rec.genre("   ", 3, None).unwrap().is_empty());
    }

    #[test]
    fn test_collaborative_unknown_user_is_empty() {
        let rec = recommender(EngineConfig::default());
        assert!(rec.collaborative(99, 3).unwrap().is_empty());
    }

    #[test]
    fn test_collaborative_ranks_by_prediction() {
        let rec = recommender(EngineConfig::default());
        let result = rec.collaborative(1, 2).unwrap();
        // Item means: 1 -> 4.5, 3 -> 4.5, 4 -> 3.0, 2 -> 2.0, 5 -> global mean 3.7
        let ids: Vec<ItemId> = result.iter().map(|r| r.item_id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert!(result.iter().all(|r| r.strategy == Strategy::Collaborative));
    }

    #[test]
    fn test_collaborative_lists_each_title_once() {
        let items = vec![
            Item::new(1, "Heat", ["Crime"], "", TextSource::Genres),
            Item::new(2, "Heat", ["Action"], "", TextSource::Genres),
            Item::new(3, "Casino", ["Crime"], "", TextSource::Genres),
            Item::new(4, "Balto", ["Animation"], "", TextSource::Genres),
        ];
        let ratings = vec![
            Rating { user_id: 1, item_id: 1, value: 5.0, timestamp: 0 },
            Rating { user_id: 2, item_id: 2, value: 4.5, timestamp: 0 },
            Rating { user_id: 2, item_id: 3, value: 3.0, timestamp: 0 },
            Rating { user_id: 3, item_id: 4, value: 1.0, timestamp: 0 },
        ];
        let rec = build(items, ratings, EngineConfig::default());

        let result = rec.collaborative(1, 2).unwrap();
        assert_eq!(titles(&result), vec!["Heat", "Casino"]);
        assert_eq!(result[0].item_id, 1);

        let all = titles(&rec.collaborative(1, 10).unwrap());
        assert_eq!(all, vec!["Heat", "Casino", "Balto"]);
    }

    #[test]
    fn test_unresolved_title_is_not_found() {
        let rec = recommender(EngineConfig::default());
        assert_eq!(rec.resolve("toy").unwrap(), 0);

        let err = rec.resolve("Nope").unwrap_err();
        assert!(matches!(err, RecommendError::NotFound(_)));
        assert!(err.to_string().contains("Nope"));
        // The query surface turns the miss into an empty list
        assert!(rec.content("Nope", 3).unwrap().is_empty());
    }

    #[test]
    fn test_hybrid_rerank_sorts_pool_by_mean() {
        let config = EngineConfig::default().with_hybrid_mode(HybridMode::Rerank);
        let rec = recommender(config);

        let result = rec.hybrid("Heat", 1, 2).unwrap();
        // Pool is every other item; Toy Story and Jumanji have the best means
        assert_eq!(titles(&result), vec!["Toy Story", "Jumanji"]);
        assert!(result.iter().all(|r| r.strategy == Strategy::Hybrid));
    }

    #[test]
    fn test_hybrid_unknown_title_is_empty_in_both_modes() {
        for mode in [HybridMode::Concat, HybridMode::Rerank] {
            let rec = recommender(EngineConfig::default().with_hybrid_mode(mode));
            assert!(rec.hybrid("Nope", 1, 3).unwrap().is_empty());
        }
    }

    #[test]
    fn test_popular_orders_by_count_then_mean() {
        let rec = recommender(EngineConfig::default());
        let result = titles(&rec.popular(3).unwrap());
        assert_eq!(result, vec!["Toy Story", "Jumanji", "Casino"]);
    }

    #[test]
    fn test_similar_to_text() {
        let rec = recommender(EngineConfig::default());
        let result = titles(&rec.similar_to_text("crime drama", 5).unwrap());
        assert_eq!(result, vec!["Casino", "Heat"]);

        assert!(rec.similar_to_text("western", 5).unwrap().is_empty());
    }
}
