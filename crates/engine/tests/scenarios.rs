//! End-to-end query behavior over small catalogs.

use std::collections::HashSet;
use std::sync::Arc;

use catalog::{Catalog, Item, Rating, TextSource};
use engine::{
    EngineConfig, HybridMode, RecommendError, Recommender, RecommenderContext, titles,
};
use predictor::FactorConfig;

fn fast_config() -> EngineConfig {
    EngineConfig::default().with_factors(FactorConfig {
        factors: 8,
        epochs: 30,
        lr: 0.01,
        ..FactorConfig::default()
    })
}

fn abc_catalog() -> Catalog {
    let items = vec![
        Item::new(1, "A", ["Action"], "", TextSource::Genres),
        Item::new(2, "B", ["Action"], "", TextSource::Genres),
        Item::new(3, "C", ["Comedy"], "", TextSource::Genres),
    ];
    let ratings = vec![
        Rating { user_id: 1, item_id: 1, value: 4.0, timestamp: 1 },
        Rating { user_id: 1, item_id: 2, value: 3.5, timestamp: 2 },
        Rating { user_id: 2, item_id: 3, value: 5.0, timestamp: 3 },
    ];
    Catalog::from_parts(items, ratings).unwrap()
}

fn movie_catalog() -> Catalog {
    let items = vec![
        Item::new(1, "Toy Story (1995)", ["Animation", "Children's", "Comedy"], "", TextSource::TitleGenres),
        Item::new(2, "Jumanji (1995)", ["Adventure", "Children's", "Fantasy"], "", TextSource::TitleGenres),
        Item::new(3, "Grumpier Old Men (1995)", ["Comedy", "Romance"], "", TextSource::TitleGenres),
        Item::new(4, "Heat (1995)", ["Action", "Crime", "Thriller"], "", TextSource::TitleGenres),
        Item::new(5, "GoldenEye (1995)", ["Action", "Adventure", "Thriller"], "", TextSource::TitleGenres),
        Item::new(6, "Casino (1995)", ["Drama", "Thriller"], "", TextSource::TitleGenres),
        Item::new(7, "Toy Story 2 (1999)", ["Animation", "Children's", "Comedy"], "", TextSource::TitleGenres),
        Item::new(8, "Balto (1995)", ["Animation", "Children's"], "", TextSource::TitleGenres),
    ];

    let mut ratings = Vec::new();
    let mut ts = 0;
    // Users 1-5 like family films, users 6-10 like thrillers
    for user_id in 1..=10u32 {
        for item_id in 1..=8u32 {
            let family = matches!(item_id, 1 | 2 | 7 | 8);
            let thriller = matches!(item_id, 4 | 5 | 6);
            let likes = if user_id <= 5 { family } else { thriller };
            // Leave a few holes so there is something to predict
            if (user_id + item_id) % 4 == 0 {
                continue;
            }
            ts += 1;
            ratings.push(Rating {
                user_id,
                item_id,
                value: if likes { 4.5 } else { 1.5 },
                timestamp: ts,
            });
        }
    }
    Catalog::from_parts(items, ratings).unwrap()
}

fn recommender(catalog: Catalog, config: EngineConfig) -> Recommender {
    let context = RecommenderContext::build(Arc::new(catalog), config).unwrap();
    Recommender::new(Arc::new(context))
}

#[test]
fn test_content_prefers_shared_genre() {
    let rec = recommender(abc_catalog(), fast_config());
    assert_eq!(titles(&rec.content("A", 2).unwrap()), vec!["B", "C"]);
}

#[test]
fn test_genre_scenario() {
    let rec = recommender(abc_catalog(), fast_config());
    assert_eq!(titles(&rec.genre("Comedy", 5, None).unwrap()), vec!["C"]);
}

#[test]
fn test_unknown_title_is_empty_not_error() {
    let rec = recommender(abc_catalog(), fast_config());
    assert!(rec.content("NoSuchTitle", 5).unwrap().is_empty());
}

#[test]
fn test_empty_rating_log_fails_construction() {
    let items = vec![Item::new(1, "A", ["Action"], "", TextSource::Genres)];
    let catalog = Catalog::from_parts(items, vec![]).unwrap();

    let result = RecommenderContext::build(Arc::new(catalog), fast_config());
    assert!(matches!(result, Err(RecommendError::InsufficientData(_))));
}

#[test]
fn test_content_never_returns_query_title() {
    let rec = recommender(movie_catalog(), fast_config());
    let catalog = movie_catalog();

    for item in catalog.items() {
        let result = titles(&rec.content(item.title(), 20).unwrap());
        assert!(!result.iter().any(|t| t == item.title()));
        // Every other item is returned when n exceeds the catalog
        assert_eq!(result.len(), catalog.len() - 1);
    }
}

#[test]
fn test_content_respects_n() {
    let rec = recommender(movie_catalog(), fast_config());
    for n in 1..=3 {
        assert_eq!(rec.content("Heat (1995)", n).unwrap().len(), n);
    }
}

#[test]
fn test_content_sequel_is_nearest() {
    let rec = recommender(movie_catalog(), fast_config());
    let result = titles(&rec.content("Toy Story (1995)", 1).unwrap());
    assert_eq!(result, vec!["Toy Story 2 (1999)"]);
}

#[test]
fn test_genre_results_match_genre() {
    let rec = recommender(movie_catalog(), fast_config());
    let catalog = movie_catalog();

    for genre in ["thriller", "CHILDREN'S", "Comedy"] {
        for recommendation in rec.genre(genre, 10, None).unwrap() {
            let item = catalog.get_item(recommendation.item_id).unwrap();
            assert!(item.has_genre(genre));
        }
    }
    assert!(rec.genre("Western", 10, None).unwrap().is_empty());
}

#[test]
fn test_collaborative_distinct_and_deterministic() {
    let rec = recommender(movie_catalog(), fast_config());

    let first = rec.collaborative(1, 8).unwrap();
    assert_eq!(first.len(), 8);
    let unique: HashSet<_> = first.iter().map(|r| r.item_id).collect();
    assert_eq!(unique.len(), 8);

    assert_eq!(first, rec.collaborative(1, 8).unwrap());
}

#[test]
fn test_collaborative_skips_universally_disliked() {
    let rec = recommender(movie_catalog(), fast_config());

    // Everyone gave Grumpier Old Men 1.5
    for user_id in [1, 7] {
        let top = rec.collaborative(user_id, 3).unwrap();
        assert_eq!(top.len(), 3);
        assert!(top.iter().all(|r| r.item_id != 3));
        assert!(top.windows(2).all(|w| w[0].score >= w[1].score));
    }
}

#[test]
fn test_collaborative_unknown_user_is_empty() {
    let rec = recommender(movie_catalog(), fast_config());
    assert!(rec.collaborative(404, 5).unwrap().is_empty());
}

#[test]
fn test_hybrid_concat_is_union_without_duplicates() {
    let rec = recommender(
        movie_catalog(),
        fast_config().with_hybrid_mode(HybridMode::Concat),
    );

    for n in [1, 3, 6] {
        let hybrid = titles(&rec.hybrid("Heat (1995)", 1, n).unwrap());
        let content = titles(&rec.content("Heat (1995)", n).unwrap());
        let collaborative = titles(&rec.collaborative(1, n).unwrap());

        assert!(hybrid.len() <= n);
        let unique: HashSet<_> = hybrid.iter().collect();
        assert_eq!(unique.len(), hybrid.len());
        for title in &hybrid {
            assert!(content.contains(title) || collaborative.contains(title));
        }
        // Content results lead
        assert_eq!(hybrid[0], content[0]);
    }
}

#[test]
fn test_hybrid_unknown_user_falls_back_to_content() {
    let rec = recommender(movie_catalog(), fast_config());
    let hybrid = rec.hybrid("Heat (1995)", 404, 3).unwrap();
    let content = rec.content("Heat (1995)", 3).unwrap();
    assert_eq!(titles(&hybrid), titles(&content));
}

#[test]
fn test_hybrid_rerank_orders_by_mean_rating() {
    let catalog = movie_catalog();
    let rec = recommender(
        movie_catalog(),
        fast_config()
            .with_hybrid_mode(HybridMode::Rerank)
            .with_pool_multiplier(3),
    );

    let result = rec.hybrid("Toy Story (1995)", 1, 4).unwrap();
    assert_eq!(result.len(), 4);
    let means: Vec<f32> = result
        .iter()
        .map(|r| catalog.mean_rating(r.item_id))
        .collect();
    assert!(means.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn test_queries_are_idempotent() {
    let rec = recommender(movie_catalog(), fast_config());
    assert_eq!(
        rec.content("GoldenEye", 4).unwrap(),
        rec.content("GoldenEye", 4).unwrap()
    );
    assert_eq!(
        rec.genre("Action", 4, Some(1.0)).unwrap(),
        rec.genre("Action", 4, Some(1.0)).unwrap()
    );
}

#[test]
fn test_shared_context_across_threads() {
    let rec = recommender(movie_catalog(), fast_config());
    let expected = rec.content("Casino", 3).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let rec = rec.clone();
            std::thread::spawn(move || rec.content("Casino", 3).unwrap())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}
